//! engine: host classification and URL rewriting for rerouter
//!
//! Turns alias hosts into GitHub URLs:
//! - `gh.someone.tl/path` -> `github.com/someone/path`
//! - `gh.alexheld.io/path` -> `github.com/alex-held/path`
//! - anything else passes through unchanged
//!
//! Everything here is pure and synchronous. Logging is left to a
//! [`RewriteObserver`] chosen by the caller.

pub mod classify;
pub mod domain;
pub mod error;
pub mod observer;
pub mod rewrite;

pub use classify::{classify, RewriteStrategy, Rules, ShallowHostPolicy};
pub use domain::{Hostname, SemanticDomain};
pub use error::{ClassificationError, RerouteError, Result, RewriteError};
pub use observer::{RewriteObserver, TracingObserver};
pub use rewrite::{rewrite, RequestUrl};

/// Successful outcome of rerouting one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reroute {
    pub strategy: RewriteStrategy,
    pub original: RequestUrl,
    pub rewritten: RequestUrl,
}

impl Reroute {
    /// True when the request was left untouched
    pub fn is_passthrough(&self) -> bool {
        self.strategy.is_noop()
    }
}

/// Classify the URL's host and apply the selected rewrite
pub fn classify_and_rewrite(url: &RequestUrl, rules: &Rules) -> Result<Reroute> {
    let strategy = classify(url.host(), rules)?;
    let rewritten = rewrite(&strategy, url, rules)?;
    Ok(Reroute {
        strategy,
        original: url.clone(),
        rewritten,
    })
}

//! Recording of rerouting outcomes
//!
//! The engine itself never logs. Callers hand outcomes to an observer.

use crate::error::{RerouteError, RewriteError};
use crate::Reroute;
use tracing::{debug, error, info};

/// Receives the outcome of every `classify_and_rewrite` call
pub trait RewriteObserver: Send + Sync {
    fn on_reroute(&self, reroute: &Reroute);

    fn on_failure(&self, url: &str, error: &RerouteError);
}

/// Emits outcomes as `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RewriteObserver for TracingObserver {
    fn on_reroute(&self, reroute: &Reroute) {
        if reroute.is_passthrough() {
            info!(url = %reroute.original, "NOOP not rewriting url");
        } else {
            debug!(
                strategy = %reroute.strategy,
                old_url = %reroute.original,
                new_url = %reroute.rewritten,
                "Rewrote url"
            );
        }
    }

    fn on_failure(&self, url: &str, err: &RerouteError) {
        match err {
            RerouteError::Rewrite(RewriteError::InvalidUrl { attempted, .. }) => {
                error!(
                    old_url = %url,
                    new_url = %attempted,
                    error = %err,
                    "Unable to parse the new URL"
                );
            }
            _ => {
                error!(url = %url, error = %err, "Unable to reroute request");
            }
        }
    }
}

//! Host classification

use crate::domain::{Hostname, SemanticDomain};
use crate::error::ClassificationError;
use std::fmt;

/// What to do with hosts that have fewer than three labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShallowHostPolicy {
    /// Fail classification
    #[default]
    Reject,
    /// Leave the request untouched
    PassThrough,
}

/// Static inputs to classification and rewriting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rules {
    /// Labels at position 2 that mark a GitHub alias host
    pub github_aliases: Vec<String>,
    /// Label at position 1 that marks the operator's own alias
    pub own_domain: String,
    /// GitHub owner the own alias maps to
    pub own_namespace: String,
    pub shallow_hosts: ShallowHostPolicy,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            github_aliases: vec![
                SemanticDomain::Github.alias().to_string(),
                "gh".to_string(),
            ],
            own_domain: "alexheld".to_string(),
            own_namespace: "alex-held".to_string(),
            shallow_hosts: ShallowHostPolicy::Reject,
        }
    }
}

impl Rules {
    fn is_github_alias(&self, label: &str) -> bool {
        self.github_aliases.iter().any(|a| a == label)
    }
}

/// Rewrite selected for a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteStrategy {
    /// Leave the URL as it is
    NoOp,
    /// `gh.alexheld.io/path` -> `github.com/alex-held/path`
    RewriteOwnAlias,
    /// `gh.someone.tl/path` -> `github.com/someone/path`
    RewriteThirdPartyAlias { owner: String },
}

impl RewriteStrategy {
    pub fn is_noop(&self) -> bool {
        matches!(self, RewriteStrategy::NoOp)
    }
}

impl fmt::Display for RewriteStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewriteStrategy::NoOp => f.write_str("noop"),
            RewriteStrategy::RewriteOwnAlias => f.write_str("own-alias"),
            RewriteStrategy::RewriteThirdPartyAlias { owner } => {
                write!(f, "third-party-alias({})", owner)
            }
        }
    }
}

/// Pick the rewrite strategy for `host`. First match wins.
pub fn classify(host: &str, rules: &Rules) -> Result<RewriteStrategy, ClassificationError> {
    if host.is_empty() {
        return Err(ClassificationError::EmptyHost);
    }

    // Rewrite targets must be fixed points
    if SemanticDomain::is_canonical_host(host) {
        return Ok(RewriteStrategy::NoOp);
    }

    let hostname = Hostname::parse(host);
    let (owner, alias) = match (hostname.label(1), hostname.label(2)) {
        (Some(owner), Some(alias)) => (owner, alias),
        _ => {
            return match rules.shallow_hosts {
                ShallowHostPolicy::Reject => Err(ClassificationError::InsufficientDepth {
                    host: host.to_string(),
                    depth: hostname.depth(),
                }),
                ShallowHostPolicy::PassThrough => Ok(RewriteStrategy::NoOp),
            };
        }
    };

    if !rules.is_github_alias(alias) {
        return Ok(RewriteStrategy::NoOp);
    }

    if owner.is_empty() {
        return Err(ClassificationError::EmptyLabel {
            host: host.to_string(),
            index: 1,
        });
    }

    if owner == rules.own_domain {
        Ok(RewriteStrategy::RewriteOwnAlias)
    } else {
        Ok(RewriteStrategy::RewriteThirdPartyAlias {
            owner: owner.to_string(),
        })
    }
}

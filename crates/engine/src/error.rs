//! Engine error types

use http::StatusCode;
use thiserror::Error;

/// The host cannot be classified by the positional label rules
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationError {
    #[error("empty host")]
    EmptyHost,

    #[error("host '{host}' has {depth} labels, at least 3 are required")]
    InsufficientDepth { host: String, depth: usize },

    #[error("host '{host}' has an empty label at position {index}")]
    EmptyLabel { host: String, index: usize },
}

/// The rewritten candidate is not a valid absolute URI
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    #[error("unable to parse the new URL; oldURL={original}, newURL={attempted}: {reason}")]
    InvalidUrl {
        original: String,
        attempted: String,
        reason: String,
    },
}

impl RewriteError {
    /// The URL the rewriter tried to build
    pub fn attempted(&self) -> &str {
        match self {
            RewriteError::InvalidUrl { attempted, .. } => attempted,
        }
    }
}

/// Any failure of `classify_and_rewrite`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RerouteError {
    #[error("invalid request URL '{url}': {reason}")]
    InvalidRequestUrl { url: String, reason: String },

    #[error("classification failed: {0}")]
    Classification(#[from] ClassificationError),

    #[error("rewrite failed: {0}")]
    Rewrite(#[from] RewriteError),
}

impl RerouteError {
    /// Status the boundary answers with when rerouting fails
    pub fn status_code(&self) -> StatusCode {
        StatusCode::MISDIRECTED_REQUEST
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, RerouteError>;

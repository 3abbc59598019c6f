// src/engine/error.rs
// =============================================================================
// Errors the engine reports to its caller.
//
// Per-node failures are not here on purpose: a neighbor function that fails
// just makes its node a dead end. Only misconfiguration surfaces as an error,
// and it surfaces before any work starts.
// =============================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// `search` was called on an engine built without a predicate.
    #[error("search requires a predicate, but none was configured")]
    MissingPredicate,

    /// A configuration value is out of range.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The worker pool could not be started.
    #[error("failed to start worker pool: {0}")]
    Pool(#[from] std::io::Error),
}

impl EngineError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

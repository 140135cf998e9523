//! Error types for stream resolution

use thiserror::Error;

/// Resolution errors
///
/// Neither variant is fatal; callers treat both as normal outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The helper ran (or failed to launch) without producing a URI
    #[error("Resolution failed: {stderr}")]
    Failed {
        /// Captured standard error, or a description of the launch failure
        stderr: String,
    },

    /// The request was superseded and the helper was terminated
    #[error("Resolution cancelled")]
    Cancelled,
}

impl ResolveError {
    /// Create a failure carrying helper output or a diagnostic
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self::Failed {
            stderr: stderr.into(),
        }
    }
}

/// Result type for resolution
pub type Result<T> = std::result::Result<T, ResolveError>;

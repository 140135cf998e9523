//! Error types for the playback engine

use thiserror::Error;

/// Errors reported by a media pipeline implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Pipeline could not be constructed
    #[error("Pipeline initialization failed: {0}")]
    Init(String),

    /// A state change was refused
    #[error("State change failed: {0}")]
    StateChange(String),

    /// Message subscription could not be set up
    #[error("Subscription failed: {0}")]
    Subscription(String),

    /// Locator cannot be expressed as a URI
    #[error("Invalid URI: {0}")]
    InvalidUri(String),
}

/// Playback engine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// `start()` called before any URI was set
    #[error("No URI set")]
    NoUriSet,

    /// The engine was destroyed
    #[error("Engine destroyed")]
    Destroyed,

    /// Underlying pipeline error
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

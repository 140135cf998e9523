//! Error types for the session controller

use ambience_engine::EngineError;
use thiserror::Error;

/// Session errors
///
/// Playback and resolution failures are never returned here; they are
/// reported as notifications.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The controller task has shut down
    #[error("Session controller is not running")]
    Closed,

    /// The engine could not be set up
    #[error("Engine setup failed: {0}")]
    Engine(#[from] EngineError),
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

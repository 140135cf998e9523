/// Core error types for Ambience
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for Ambience
#[derive(Error, Debug)]
pub enum CoreError {
    /// Settings could not be read or written
    #[error("Settings error: {0}")]
    Settings(String),

    /// Unknown entry type discriminant in stored data
    #[error("Unknown entry type: {0}")]
    UnknownSourceKind(u8),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a settings error
    pub fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }
}

//! Engine error types.

use thiserror::Error;

use tribute_media::MediaError;
use tribute_models::SelectionError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by the compilation engine.
///
/// Validation and spawn errors return synchronously to the caller; encode
/// failures are only discoverable via polling.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid selection: {0}")]
    Validation(#[from] SelectionError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("failed to start encoder process: {0}")]
    ProcessSpawnFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Create a spawn failure error.
    pub fn spawn_failed(message: impl Into<String>) -> Self {
        Self::ProcessSpawnFailed(message.into())
    }
}

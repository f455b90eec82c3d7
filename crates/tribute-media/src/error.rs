//! Error types for media operations.

use thiserror::Error;

use crate::catalog::MediaKind;
use crate::planner::MIN_TIMELINE_IMAGES;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while preparing a compilation.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("ffmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("ffprobe not found in PATH")]
    FfprobeNotFound,

    #[error("invalid {kind} id: {id}")]
    InvalidMediaId { kind: MediaKind, id: String },

    #[error("not enough images to build a timeline: need at least {MIN_TIMELINE_IMAGES}, received {0}")]
    InsufficientMedia(usize),

    #[error("not enough images to create video: need at least {MIN_TIMELINE_IMAGES} image slots")]
    TooFewImages,

    #[error("degenerate timeline: {0}")]
    DegenerateTimeline(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create an invalid-id error.
    pub fn invalid_id(kind: MediaKind, id: impl Into<String>) -> Self {
        Self::InvalidMediaId {
            kind,
            id: id.into(),
        }
    }
}

//! User media selection and its validation bounds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::template::Template;

/// Minimum number of images in a selection.
pub const MIN_IMAGES: usize = 15;
/// Maximum number of images in a selection.
pub const MAX_IMAGES: usize = 40;
/// Minimum number of video clips in a selection.
pub const MIN_VIDEOS: usize = 1;
/// Maximum number of video clips in a selection.
pub const MAX_VIDEOS: usize = 5;

/// Errors produced by selection validation.
///
/// These are reported synchronously before any job is created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("images must be between {MIN_IMAGES} and {MAX_IMAGES}, received {0}")]
    ImageCount(usize),

    #[error("videos must be between {MIN_VIDEOS} and {MAX_VIDEOS}, received {0}")]
    VideoCount(usize),
}

/// The user's chosen media for one compilation.
///
/// IDs are catalog identifiers (file names); resolution to paths happens in
/// the media catalog. Image and video order is preserved and significant for
/// the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub template: Template,
    pub images: Vec<String>,
    pub videos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

impl Selection {
    /// Check the selection counts against the allowed bounds.
    pub fn validate(&self) -> Result<(), SelectionError> {
        let images = self.images.len();
        if !(MIN_IMAGES..=MAX_IMAGES).contains(&images) {
            return Err(SelectionError::ImageCount(images));
        }
        let videos = self.videos.len();
        if !(MIN_VIDEOS..=MAX_VIDEOS).contains(&videos) {
            return Err(SelectionError::VideoCount(videos));
        }
        Ok(())
    }
}

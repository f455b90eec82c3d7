//! Media catalog over fixed directories.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MediaError, MediaResult};

/// Kind of media the catalog serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Background,
}

impl MediaKind {
    /// Subdirectory under the media root for this kind.
    pub fn subdir(&self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::Video => "videos",
            MediaKind::Audio => "audio",
            MediaKind::Background => "backgrounds",
        }
    }

    /// Allow-listed file extensions (lowercase).
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Image | MediaKind::Background => &["png", "jpg", "jpeg"],
            MediaKind::Video => &["mp4", "mov", "avi"],
            MediaKind::Audio => &["mp3", "wav", "aac"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Background => "background",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One catalogued media file. The id is the file name.
#[derive(Debug, Clone, Serialize)]
pub struct MediaItem {
    pub id: String,
    pub kind: MediaKind,
    pub path: PathBuf,
}

/// Lists and resolves media files under a fixed directory layout.
///
/// A missing directory is treated as empty, never as an error.
#[derive(Debug, Clone)]
pub struct MediaCatalog {
    root: PathBuf,
}

impl MediaCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// List available media of one kind, sorted by id for stable ordering.
    pub fn list(&self, kind: MediaKind) -> Vec<MediaItem> {
        let dir = self.root.join(kind.subdir());
        let Ok(entries) = std::fs::read_dir(&dir) else {
            return Vec::new();
        };

        let mut items: Vec<MediaItem> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| {
                let path = entry.path();
                if !has_allowed_extension(&path, kind.extensions()) {
                    return None;
                }
                let id = path.file_name()?.to_str()?.to_string();
                Some(MediaItem { id, kind, path })
            })
            .collect();

        items.sort_by(|a, b| a.id.cmp(&b.id));
        items
    }

    /// Resolve ids to paths, failing on the first unknown id.
    pub fn resolve(&self, ids: &[String], kind: MediaKind) -> MediaResult<Vec<PathBuf>> {
        let known: HashMap<String, PathBuf> = self
            .list(kind)
            .into_iter()
            .map(|item| (item.id, item.path))
            .collect();

        ids.iter()
            .map(|id| {
                known
                    .get(id)
                    .cloned()
                    .ok_or_else(|| MediaError::invalid_id(kind, id))
            })
            .collect()
    }

    /// Resolve a single optional id; unknown or absent ids yield `None`.
    ///
    /// Audio and background choices are optional in a selection, so a stale
    /// id degrades gracefully instead of failing the whole request.
    pub fn resolve_optional(&self, id: Option<&str>, kind: MediaKind) -> Option<PathBuf> {
        let id = id?;
        self.list(kind)
            .into_iter()
            .find(|item| item.id == id)
            .map(|item| item.path)
    }
}

fn has_allowed_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| allowed.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

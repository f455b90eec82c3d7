//! Cached output management: TTL'd videos, metadata sidecars, history.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tribute_models::{
    CacheKey, DeleteResponse, HistoryEntry, RenderSettings, Selection, Template,
};

use crate::error::EngineResult;

/// JSON sidecar persisted next to each compiled output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub template: Template,
    pub selection: Selection,
    pub settings: RenderSettings,
    pub media_count: usize,
    pub generated_at: DateTime<Utc>,
}

/// Manages compiled outputs under the cache directory.
#[derive(Debug, Clone)]
pub struct CacheManager {
    cache_dir: PathBuf,
    base_url: String,
    ttl: Duration,
}

impl CacheManager {
    pub fn new(cache_dir: impl Into<PathBuf>, base_url: impl Into<String>, ttl: Duration) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            base_url: base_url.into(),
            ttl,
        }
    }

    /// Output path for a cache key.
    pub fn video_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(format!("{key}.mp4"))
    }

    fn metadata_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(format!("{key}.json"))
    }

    /// Public URL for an output path.
    pub fn video_url(&self, path: &Path) -> String {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        format!("{}/{name}", self.base_url.trim_end_matches('/'))
    }

    /// Cached output for a key, if present and within the TTL window.
    ///
    /// Expired entries are deleted opportunistically here, not eagerly.
    pub fn cached_video(&self, key: &CacheKey) -> Option<PathBuf> {
        let path = self.video_path(key);
        let modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok()?;
        if file_age(modified) < self.ttl {
            Some(path)
        } else {
            debug!(cache_key = %key, "cached video expired, deleting");
            let _ = std::fs::remove_file(&path);
            let _ = std::fs::remove_file(self.metadata_path(key));
            None
        }
    }

    /// Persist the metadata sidecar for a generation.
    pub fn save_metadata(&self, key: &CacheKey, metadata: &CacheMetadata) -> EngineResult<()> {
        let json = serde_json::to_string_pretty(metadata)?;
        std::fs::write(self.metadata_path(key), json)?;
        Ok(())
    }

    /// Load the metadata sidecar, if present and parseable.
    pub fn load_metadata(&self, key: &CacheKey) -> Option<CacheMetadata> {
        let content = std::fs::read_to_string(self.metadata_path(key)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// All cached videos with metadata, sorted newest first.
    pub fn list_videos(&self) -> Vec<HistoryEntry> {
        let Ok(entries) = std::fs::read_dir(&self.cache_dir) else {
            return Vec::new();
        };

        let mut videos: Vec<HistoryEntry> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let path = entry.path();
                let name = path.file_name()?.to_str()?;
                let stem = name.strip_suffix(".mp4")?;
                let key = CacheKey::from_raw(stem);
                let meta = entry.metadata().ok()?;
                let metadata = self.load_metadata(&key);
                Some(HistoryEntry {
                    url: self.video_url(&path),
                    size: meta.len(),
                    created: meta
                        .modified()
                        .map(DateTime::<Utc>::from)
                        .unwrap_or_else(|_| Utc::now()),
                    template: metadata.as_ref().map(|m| m.template),
                    selection: metadata.as_ref().map(|m| m.selection.clone()),
                    settings: metadata.as_ref().map(|m| m.settings.clone()),
                    media_count: metadata.as_ref().map(|m| m.media_count),
                    cache_key: key,
                })
            })
            .collect();

        videos.sort_by(|a, b| b.created.cmp(&a.created));
        videos
    }

    /// Delete a video and its sidecar.
    pub fn delete_video(&self, key: &CacheKey) -> DeleteResponse {
        let video_deleted = std::fs::remove_file(self.video_path(key)).is_ok();
        let metadata_deleted = std::fs::remove_file(self.metadata_path(key)).is_ok();

        if video_deleted || metadata_deleted {
            DeleteResponse::deleted()
        } else {
            DeleteResponse::not_found()
        }
    }

    /// Delete all cache files older than the TTL. Returns the count removed.
    pub fn cleanup_expired(&self) -> usize {
        let Ok(entries) = std::fs::read_dir(&self.cache_dir) else {
            return 0;
        };

        let mut deleted = 0;
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
                continue;
            };
            if file_age(modified) > self.ttl {
                if std::fs::remove_file(&path).is_ok() {
                    deleted += 1;
                } else {
                    warn!(path = %path.display(), "failed to delete expired cache file");
                }
            }
        }
        deleted
    }

    /// Total size of the cache directory in bytes.
    pub fn cache_size(&self) -> u64 {
        let Ok(entries) = std::fs::read_dir(&self.cache_dir) else {
            return 0;
        };
        entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.metadata().ok())
            .filter(|m| m.is_file())
            .map(|m| m.len())
            .sum()
    }
}

fn file_age(modified: SystemTime) -> Duration {
    SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO)
}

/// Format bytes as a human readable size.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

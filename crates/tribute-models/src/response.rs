//! Outbound response payloads for the web layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fingerprint::CacheKey;
use crate::selection::Selection;
use crate::settings::RenderSettings;
use crate::template::Template;

/// Status codes surfaced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Idle,
    Cached,
    Generating,
    Completed,
    Failed,
}

/// Response to a generate request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<CacheKey>,
    pub message: String,
}

impl GenerateResponse {
    /// A cached output already exists for this selection.
    pub fn cached(video_url: impl Into<String>, cache_key: CacheKey) -> Self {
        Self {
            success: true,
            status: ResponseStatus::Cached,
            video_url: Some(video_url.into()),
            cache_key: Some(cache_key),
            message: "Video already generated and cached.".to_string(),
        }
    }

    /// A new background job was started.
    pub fn generating(cache_key: CacheKey) -> Self {
        Self {
            success: true,
            status: ResponseStatus::Generating,
            video_url: None,
            cache_key: Some(cache_key),
            message: "Video generation started successfully.".to_string(),
        }
    }

    /// A job for this cache key is already running (idempotent, not an error).
    pub fn already_in_progress(cache_key: CacheKey) -> Self {
        Self {
            success: true,
            status: ResponseStatus::Generating,
            video_url: None,
            cache_key: Some(cache_key),
            message: "Video generation already in progress.".to_string(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            status: ResponseStatus::Failed,
            video_url: None,
            cache_key: None,
            message: message.into(),
        }
    }
}

/// Response to a progress poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub status: ResponseStatus,
    /// 0-100; 100 is only reported on confirmed completion
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressResponse {
    /// No job has ever been started for this key.
    pub fn idle() -> Self {
        Self {
            status: ResponseStatus::Idle,
            progress: 0,
            video_url: None,
            error: None,
        }
    }

    pub fn generating(progress: u8) -> Self {
        Self {
            status: ResponseStatus::Generating,
            progress: progress.min(99),
            video_url: None,
            error: None,
        }
    }

    pub fn completed(video_url: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Completed,
            progress: 100,
            video_url: Some(video_url.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Failed,
            progress: 0,
            video_url: None,
            error: Some(error.into()),
        }
    }
}

/// One entry in the history gallery listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub cache_key: CacheKey,
    pub url: String,
    /// Output file size in bytes
    pub size: u64,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<Template>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Selection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<RenderSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_count: Option<usize>,
}

/// Response to a delete request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

impl DeleteResponse {
    pub fn deleted() -> Self {
        Self {
            success: true,
            message: "Video deleted successfully.".to_string(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            success: false,
            message: "Video not found.".to_string(),
        }
    }
}

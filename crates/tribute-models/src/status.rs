//! Generation status tracked per cache key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fingerprint::CacheKey;

/// Job state machine: `Generating -> Completed | Failed`.
///
/// Transitions are monotonic; there is no way out of a terminal state except
/// a brand-new job under a different (or force-regenerated) cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Generating,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Generating => "generating",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of one generation job, stored in the status store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationStatus {
    pub cache_key: CacheKey,
    pub state: JobState,
    /// Number of timeline slots, used to derive expected duration
    pub media_count: usize,
    /// Expected total output duration in seconds
    pub expected_duration_secs: f64,
    /// Last reported progress (0-100), never decreasing
    pub progress: u8,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationStatus {
    /// Create a fresh `Generating` entry.
    pub fn generating(cache_key: CacheKey, media_count: usize, expected_duration_secs: f64) -> Self {
        let now = Utc::now();
        Self {
            cache_key,
            state: JobState::Generating,
            media_count,
            expected_duration_secs,
            progress: 0,
            started_at: now,
            updated_at: now,
            video_url: None,
            file_size: None,
            completed_at: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Record a progress observation; progress never moves backward.
    pub fn observe_progress(&mut self, progress: u8) {
        self.progress = self.progress.max(progress.min(100));
        self.updated_at = Utc::now();
    }

    /// Transition to `Completed` with the output metadata.
    pub fn complete(&mut self, video_url: impl Into<String>, file_size: u64) {
        self.state = JobState::Completed;
        self.progress = 100;
        self.video_url = Some(video_url.into());
        self.file_size = Some(file_size);
        self.completed_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    /// Transition to `Failed` with a diagnostic detail.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.state = JobState::Failed;
        self.error = Some(error.into());
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        let mut status =
            GenerationStatus::generating(CacheKey::from_raw("memorial_classic_abc"), 16, 51.0);
        assert_eq!(status.state, JobState::Generating);
        assert!(!status.is_terminal());

        status.observe_progress(40);
        assert_eq!(status.progress, 40);

        status.complete("/videos/memorial_classic_abc.mp4", 1024);
        assert_eq!(status.state, JobState::Completed);
        assert_eq!(status.progress, 100);
        assert!(status.is_terminal());
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut status =
            GenerationStatus::generating(CacheKey::from_raw("memorial_classic_abc"), 16, 51.0);
        status.observe_progress(40);
        status.observe_progress(12);
        assert_eq!(status.progress, 40);
    }

    #[test]
    fn test_failure_carries_detail() {
        let mut status =
            GenerationStatus::generating(CacheKey::from_raw("memorial_classic_abc"), 16, 51.0);
        status.fail("encoder produced no output");
        assert_eq!(status.state, JobState::Failed);
        assert!(status.error.as_deref().unwrap().contains("no output"));
    }
}

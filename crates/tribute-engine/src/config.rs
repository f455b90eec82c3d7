//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

use tribute_media::COMPLETION_MARKER;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Root directory holding images/, videos/, audio/, backgrounds/
    pub media_dir: PathBuf,
    /// Directory for compiled outputs and metadata sidecars
    pub cache_dir: PathBuf,
    /// Directory for per-job log/command/pid bookkeeping
    pub temp_dir: PathBuf,
    /// Base URL mapped onto the cache directory
    pub base_url: String,
    /// Age after which a cached output expires
    pub cache_ttl: Duration,
    /// Lifetime of status store entries
    pub status_ttl: Duration,
    /// Encoder binary (overridable for tests)
    pub ffmpeg_program: PathBuf,
    /// Probe binary (overridable for tests)
    pub ffprobe_program: PathBuf,
    /// Grace period after spawn before the pid must be visible
    pub spawn_grace: Duration,
    /// Trailer string the encoder writes once muxing truly finishes.
    /// Configurable because it is not guaranteed stable across encoder
    /// versions.
    pub completion_marker: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            media_dir: PathBuf::from("media"),
            cache_dir: PathBuf::from("cache"),
            temp_dir: PathBuf::from("cache/temp"),
            base_url: "/videos".to_string(),
            cache_ttl: Duration::from_secs(24 * 3600),
            status_ttl: Duration::from_secs(3600),
            ffmpeg_program: PathBuf::from("ffmpeg"),
            ffprobe_program: PathBuf::from("ffprobe"),
            spawn_grace: Duration::from_millis(200),
            completion_marker: COMPLETION_MARKER.to_string(),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            media_dir: std::env::var("TRIBUTE_MEDIA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.media_dir),
            cache_dir: std::env::var("TRIBUTE_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            temp_dir: std::env::var("TRIBUTE_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.temp_dir),
            base_url: std::env::var("TRIBUTE_BASE_URL").unwrap_or(defaults.base_url),
            cache_ttl: Duration::from_secs(
                std::env::var("TRIBUTE_CACHE_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(24 * 3600),
            ),
            status_ttl: Duration::from_secs(
                std::env::var("TRIBUTE_STATUS_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3600),
            ),
            ffmpeg_program: std::env::var("TRIBUTE_FFMPEG")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffmpeg_program),
            ffprobe_program: std::env::var("TRIBUTE_FFPROBE")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffprobe_program),
            spawn_grace: Duration::from_millis(
                std::env::var("TRIBUTE_SPAWN_GRACE_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(200),
            ),
            completion_marker: std::env::var("TRIBUTE_COMPLETION_MARKER")
                .unwrap_or(defaults.completion_marker),
        }
    }
}

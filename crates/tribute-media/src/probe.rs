//! Clip duration probing via ffprobe.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Duration used when probing fails or returns an implausible value.
pub const FALLBACK_CLIP_SECS: f64 = 4.0;

/// Shortest plausible clip duration in seconds.
const MIN_PLAUSIBLE_SECS: f64 = 0.1;
/// Longest plausible clip duration in seconds (5 minutes).
const MAX_PLAUSIBLE_SECS: f64 = 300.0;

/// Probes media durations with an external ffprobe binary.
#[derive(Debug, Clone)]
pub struct Prober {
    program: PathBuf,
}

impl Default for Prober {
    fn default() -> Self {
        Self::new()
    }
}

impl Prober {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffprobe"),
        }
    }

    /// Use a specific ffprobe binary (tests point this at a stub).
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Duration of a clip in seconds, clamped to a plausible range.
    ///
    /// Probe failures never propagate; the fallback duration is used and the
    /// failure is only logged.
    pub async fn clip_duration(&self, path: &Path) -> f64 {
        match self.probe_duration(path).await {
            Ok(duration) if duration >= MIN_PLAUSIBLE_SECS && duration <= MAX_PLAUSIBLE_SECS => {
                debug!(path = %path.display(), duration, "probed clip duration");
                duration
            }
            Ok(duration) => {
                warn!(
                    path = %path.display(),
                    duration,
                    "implausible probed duration, using fallback of {FALLBACK_CLIP_SECS}s"
                );
                FALLBACK_CLIP_SECS
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "duration probe failed, using fallback of {FALLBACK_CLIP_SECS}s"
                );
                FALLBACK_CLIP_SECS
            }
        }
    }

    async fn probe_duration(&self, path: &Path) -> MediaResult<f64> {
        let output = Command::new(&self.program)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => MediaError::FfprobeNotFound,
                _ => MediaError::Io(err),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .trim()
            .parse::<f64>()
            .map_err(|_| MediaError::Io(std::io::Error::other("unparseable ffprobe output")))
    }
}

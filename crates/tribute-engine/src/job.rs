//! Handle to a detached encoder process.
//!
//! The process outlives the request that spawned it, so everything a later
//! poll needs is persisted to disk: the pid, the log and the command dump.
//! A handle is reconstructed from those files on every poll.

use std::path::{Path, PathBuf};

use tracing::debug;
use tribute_models::CacheKey;

use crate::error::EngineResult;

/// Per-job bookkeeping file paths inside the temp directory.
#[derive(Debug, Clone)]
pub struct JobHandle {
    pub cache_key: CacheKey,
    pub pid: u32,
    pub log_path: PathBuf,
    pub command_path: PathBuf,
    pub output_path: PathBuf,
}

impl JobHandle {
    /// Whether the encoder process still exists.
    ///
    /// Linux only: checks for the `/proc/{pid}` entry. The spawner reaps the
    /// child on exit, so the entry disappears as soon as the encoder stops.
    pub fn is_alive(&self) -> bool {
        Path::new(&format!("/proc/{}", self.pid)).exists()
    }

    /// Last chunk of the encoder log, for failure diagnostics.
    pub fn tail_log(&self) -> String {
        tribute_media::log_tail(&self.log_path)
    }

    /// Persist the pid so later polls can reconstruct the handle.
    pub fn save(&self, temp_dir: &Path) -> EngineResult<()> {
        std::fs::write(pid_path(temp_dir, &self.cache_key), self.pid.to_string())?;
        Ok(())
    }

    /// Reconstruct a handle from the pid file, if one exists.
    pub fn load(
        temp_dir: &Path,
        cache_dir: &Path,
        cache_key: &CacheKey,
    ) -> Option<Self> {
        let pid = std::fs::read_to_string(pid_path(temp_dir, cache_key))
            .ok()?
            .trim()
            .parse()
            .ok()?;
        Some(Self {
            cache_key: cache_key.clone(),
            pid,
            log_path: log_path(temp_dir, cache_key),
            command_path: command_path(temp_dir, cache_key),
            output_path: cache_dir.join(format!("{cache_key}.mp4")),
        })
    }

    /// Remove the bookkeeping files once the job reaches a terminal state.
    pub fn cleanup(&self, temp_dir: &Path) {
        for path in [
            pid_path(temp_dir, &self.cache_key),
            self.command_path.clone(),
            self.log_path.clone(),
        ] {
            if std::fs::remove_file(&path).is_ok() {
                debug!(path = %path.display(), "removed job bookkeeping file");
            }
        }
    }
}

pub(crate) fn pid_path(temp_dir: &Path, key: &CacheKey) -> PathBuf {
    temp_dir.join(format!("pid_{key}.txt"))
}

pub(crate) fn log_path(temp_dir: &Path, key: &CacheKey) -> PathBuf {
    temp_dir.join(format!("ffmpeg_{key}.log"))
}

pub(crate) fn command_path(temp_dir: &Path, key: &CacheKey) -> PathBuf {
    temp_dir.join(format!("command_{key}.txt"))
}

//! Detached encoder job lifecycle.
//!
//! `start` launches ffmpeg in the background and returns immediately; the
//! process is supervised by a spawned task that reaps it on exit. `poll`
//! reconciles the status store against reality: the pid, the log and the
//! output file on disk.

use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;
use tracing::{debug, error, info, warn};

use tribute_media::{estimate_progress, has_completion_marker, CompileCommand};
use tribute_models::{CacheKey, GenerationStatus, JobState, ProgressResponse};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::job::{self, JobHandle};
use crate::store::StatusStore;

/// Outcome of a start attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new encoder process was launched.
    Started,
    /// A job for this key is already running; nothing was launched.
    AlreadyInProgress,
}

/// Spawns and polls background encoder jobs.
pub struct JobRunner {
    config: EngineConfig,
    store: Arc<dyn StatusStore>,
}

impl JobRunner {
    pub fn new(config: EngineConfig, store: Arc<dyn StatusStore>) -> Self {
        Self { config, store }
    }

    /// Launch the encoder for a compiled command.
    ///
    /// Registers the job in the status store first (atomically, so two
    /// near-simultaneous requests cannot both launch), writes the command
    /// dump and truncates the log, then spawns ffmpeg detached with both
    /// output streams redirected into the log file. After a short grace
    /// period the pid is persisted for later polls.
    pub async fn start(
        &self,
        key: &CacheKey,
        command: &CompileCommand,
        media_count: usize,
    ) -> EngineResult<StartOutcome> {
        let status = GenerationStatus::generating(
            key.clone(),
            media_count,
            command.declared_duration(),
        );
        if !self.store.begin(key, status) {
            debug!(cache_key = %key, "generation already in progress");
            return Ok(StartOutcome::AlreadyInProgress);
        }

        let log_path = job::log_path(&self.config.temp_dir, key);
        let command_path = job::command_path(&self.config.temp_dir, key);

        // The entry in the store is already non-terminal, so any failure
        // from here on must fail it too or polls would report a phantom
        // lost process.
        let prepared = (|| {
            std::fs::create_dir_all(&self.config.temp_dir)?;
            std::fs::write(&command_path, command.render())?;
            let log_file = std::fs::File::create(&log_path)?;
            let stderr_file = log_file.try_clone()?;
            Ok::<_, std::io::Error>((log_file, stderr_file))
        })();
        let (log_file, stderr_file) = match prepared {
            Ok(files) => files,
            Err(err) => {
                warn!(cache_key = %key, error = %err, "failed to prepare job files");
                self.mark_failed(key, format!("failed to prepare job files: {err}"));
                return Err(err.into());
            }
        };

        let spawned = Command::new(&self.config.ffmpeg_program)
            .args(command.to_args())
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::from(stderr_file))
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(err) => {
                warn!(cache_key = %key, error = %err, "failed to spawn encoder");
                self.mark_failed(key, format!("failed to start encoder: {err}"));
                return Err(EngineError::spawn_failed(err.to_string()));
            }
        };

        let Some(pid) = child.id() else {
            self.mark_failed(key, "encoder exited before startup");
            return Err(EngineError::spawn_failed("no pid for spawned encoder"));
        };

        let handle = JobHandle {
            cache_key: key.clone(),
            pid,
            log_path,
            command_path,
            output_path: self.config.cache_dir.join(format!("{key}.mp4")),
        };
        // Reap the child when it exits so /proc/{pid} reflects liveness.
        let supervised_key = key.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(exit) => {
                    info!(cache_key = %supervised_key, status = %exit, "encoder exited")
                }
                Err(err) => {
                    error!(cache_key = %supervised_key, error = %err, "encoder wait failed")
                }
            }
        });

        if let Err(err) = handle.save(&self.config.temp_dir) {
            self.mark_failed(key, format!("failed to persist encoder pid: {err}"));
            return Err(err);
        }

        // Short grace so an immediate crash surfaces as Failed on first poll
        // rather than as a phantom running job.
        tokio::time::sleep(self.config.spawn_grace).await;

        info!(cache_key = %key, pid, "encoder started");
        Ok(StartOutcome::Started)
    }

    /// Current progress for a key, reconciling store state against the
    /// process and the filesystem.
    pub fn poll(&self, key: &CacheKey) -> ProgressResponse {
        let Some(mut status) = self.store.get(key) else {
            return ProgressResponse::idle();
        };

        match status.state {
            JobState::Completed => {
                ProgressResponse::completed(status.video_url.unwrap_or_default())
            }
            JobState::Failed => {
                ProgressResponse::failed(status.error.unwrap_or_else(|| "unknown error".into()))
            }
            JobState::Generating => {
                let handle =
                    JobHandle::load(&self.config.temp_dir, &self.config.cache_dir, key);
                self.poll_running(key, &mut status, handle)
            }
        }
    }

    fn poll_running(
        &self,
        key: &CacheKey,
        status: &mut GenerationStatus,
        handle: Option<JobHandle>,
    ) -> ProgressResponse {
        let Some(handle) = handle else {
            // Status says generating but the pid file is gone; most likely a
            // crash between begin() and save(), or manual temp cleanup.
            warn!(cache_key = %key, "running job has no pid file");
            status.fail("generation process lost");
            self.store.set(key, status.clone());
            return ProgressResponse::failed("generation process lost");
        };

        // A vanished pid is only provisional: the process slot can be gone
        // while the muxer is still flushing output. The job counts as
        // finished only once the log carries the completion trailer (or
        // never existed at all); until then it keeps reporting progress.
        let pid_dead = !handle.is_alive();
        let finished = pid_dead
            && (!handle.log_path.exists()
                || has_completion_marker(&handle.log_path, &self.config.completion_marker));

        if !finished {
            let progress = estimate_progress(&handle.log_path, status.expected_duration_secs);
            status.observe_progress(progress);
            self.store.set(key, status.clone());
            return ProgressResponse::generating(status.progress);
        }

        let output_size = std::fs::metadata(&handle.output_path)
            .map(|m| m.len())
            .unwrap_or(0);

        if output_size > 0 {
            let url = video_url(&self.config.base_url, key);
            status.complete(url.clone(), output_size);
            self.store.set(key, status.clone());
            handle.cleanup(&self.config.temp_dir);
            info!(cache_key = %key, size = output_size, "generation completed");
            ProgressResponse::completed(url)
        } else {
            let tail = handle.tail_log();
            let detail = if tail.is_empty() {
                "encoder produced no output".to_string()
            } else {
                format!("encoder produced no output: {tail}")
            };
            status.fail(detail.clone());
            self.store.set(key, status.clone());
            handle.cleanup(&self.config.temp_dir);
            error!(cache_key = %key, "generation failed");
            ProgressResponse::failed(detail)
        }
    }

    fn mark_failed(&self, key: &CacheKey, detail: impl Into<String>) {
        if let Some(mut status) = self.store.get(key) {
            status.fail(detail);
            self.store.set(key, status);
        }
    }
}

fn video_url(base_url: &str, key: &CacheKey) -> String {
    format!("{}/{key}.mp4", base_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStatusStore;
    use std::time::Duration;

    fn runner(dir: &std::path::Path) -> (JobRunner, Arc<MemoryStatusStore>) {
        let store = Arc::new(MemoryStatusStore::new(Duration::from_secs(60)));
        let config = EngineConfig {
            cache_dir: dir.to_path_buf(),
            temp_dir: dir.join("temp"),
            ..EngineConfig::default()
        };
        (JobRunner::new(config, store.clone()), store)
    }

    #[test]
    fn test_poll_unknown_key_is_idle() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, _store) = runner(dir.path());
        let resp = runner.poll(&CacheKey::from_raw("memorial_classic_abc"));
        assert_eq!(resp.status, tribute_models::ResponseStatus::Idle);
    }

    #[test]
    fn test_poll_terminal_states_are_stable() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, store) = runner(dir.path());
        let key = CacheKey::from_raw("memorial_classic_abc");

        let mut completed = GenerationStatus::generating(key.clone(), 16, 51.0);
        completed.complete("/videos/memorial_classic_abc.mp4", 1024);
        store.set(&key, completed);

        let resp = runner.poll(&key);
        assert_eq!(resp.status, tribute_models::ResponseStatus::Completed);
        assert_eq!(resp.progress, 100);
        assert_eq!(
            resp.video_url.as_deref(),
            Some("/videos/memorial_classic_abc.mp4")
        );
    }

    #[test]
    fn test_poll_generating_without_pid_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, store) = runner(dir.path());
        let key = CacheKey::from_raw("memorial_classic_abc");
        store.set(&key, GenerationStatus::generating(key.clone(), 16, 51.0));

        let resp = runner.poll(&key);
        assert_eq!(resp.status, tribute_models::ResponseStatus::Failed);
        assert!(resp.error.unwrap().contains("lost"));

        // The failure is sticky.
        let again = runner.poll(&key);
        assert_eq!(again.status, tribute_models::ResponseStatus::Failed);
    }

    /// Pid no longer visible but the log has no trailer yet: the muxer may
    /// still be flushing, so the job must keep reporting progress.
    #[test]
    fn test_dead_pid_without_marker_keeps_generating() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, store) = runner(dir.path());
        let key = CacheKey::from_raw("memorial_classic_abc");
        store.set(&key, GenerationStatus::generating(key.clone(), 16, 51.0));

        let temp = dir.path().join("temp");
        std::fs::create_dir_all(&temp).unwrap();
        std::fs::write(job::pid_path(&temp, &key), "999999999").unwrap();
        std::fs::write(
            job::log_path(&temp, &key),
            "frame=  300 fps= 30 q=28.0 time=00:00:10.00 bitrate= 838.9kbits/s\n",
        )
        .unwrap();

        let resp = runner.poll(&key);
        assert_eq!(resp.status, tribute_models::ResponseStatus::Generating);
        assert_eq!(resp.progress, 19);

        // Once the trailer lands with no output file, the job is failed.
        std::fs::write(
            job::log_path(&temp, &key),
            "time=00:00:10.00\nvideo:1000kB muxing overhead: 1.2%\n",
        )
        .unwrap();
        let resp = runner.poll(&key);
        assert_eq!(resp.status, tribute_models::ResponseStatus::Failed);
    }

    /// The trailer alone is not completion while the process is still alive.
    #[test]
    fn test_live_process_with_marker_keeps_generating() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, store) = runner(dir.path());
        let key = CacheKey::from_raw("memorial_classic_abc");
        store.set(&key, GenerationStatus::generating(key.clone(), 16, 51.0));

        let temp = dir.path().join("temp");
        std::fs::create_dir_all(&temp).unwrap();
        std::fs::write(job::pid_path(&temp, &key), std::process::id().to_string()).unwrap();
        std::fs::write(
            job::log_path(&temp, &key),
            "time=00:00:40.00\nmuxing overhead: 1.2%\n",
        )
        .unwrap();

        let resp = runner.poll(&key);
        assert_eq!(resp.status, tribute_models::ResponseStatus::Generating);
    }

    #[tokio::test]
    async fn test_setup_failure_fails_status_with_cause() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStatusStore::new(Duration::from_secs(60)));
        // Block temp dir creation with a plain file in its place.
        let blocked = dir.path().join("blocked");
        std::fs::write(&blocked, "not a directory").unwrap();
        let config = EngineConfig {
            cache_dir: dir.path().to_path_buf(),
            temp_dir: blocked.join("temp"),
            ..EngineConfig::default()
        };
        let runner = JobRunner::new(config, store.clone());

        let key = CacheKey::from_raw("memorial_classic_abc");
        let slots = (0..3)
            .map(|i| {
                tribute_models::Slot::new(
                    tribute_models::SlotKind::Image,
                    format!("img{i}.jpg"),
                    4.0,
                )
            })
            .collect();
        let command = CompileCommand::build(
            &tribute_models::Timeline::new(slots),
            &tribute_models::RenderSettings::default(),
            None,
            dir.path().join("out.mp4"),
        )
        .unwrap();

        let err = runner.start(&key, &command, 3).await.unwrap_err();
        assert!(matches!(err, crate::EngineError::Io(_)));

        let status = store.get(&key).unwrap();
        assert_eq!(status.state, tribute_models::JobState::Failed);
        assert!(status.error.unwrap().contains("prepare job files"));

        let resp = runner.poll(&key);
        assert_eq!(resp.status, tribute_models::ResponseStatus::Failed);
        assert!(resp.error.unwrap().contains("prepare job files"));
    }

    #[test]
    fn test_video_url_strips_trailing_slash() {
        let key = CacheKey::from_raw("memorial_classic_abc");
        assert_eq!(
            video_url("/videos/", &key),
            "/videos/memorial_classic_abc.mp4"
        );
    }
}

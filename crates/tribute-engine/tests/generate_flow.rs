//! End-to-end pipeline tests with stubbed ffmpeg/ffprobe binaries.
//!
//! The stubs are small shell scripts that mimic the encoder's observable
//! behavior: log lines on stderr/stdout, the muxing trailer, and the output
//! file. This exercises the full generate/poll/history/delete flow without
//! a real encoder installed.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tribute_engine::{EngineConfig, EngineError, VideoGenerator};
use tribute_models::{
    AdvancedOptions, CacheKey, GenerateRequest, RenderSettings, ResponseStatus, Template,
};

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

struct TestEnv {
    dir: tempfile::TempDir,
}

impl TestEnv {
    /// Seed a media catalog with 15 images, one video and one audio track.
    fn new() -> Self {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("media");
        for sub in ["images", "videos", "audio"] {
            std::fs::create_dir_all(media.join(sub)).unwrap();
        }
        for i in 0..15 {
            std::fs::write(media.join("images").join(format!("img{i:02}.jpg")), b"x").unwrap();
        }
        std::fs::write(media.join("videos/clip.mp4"), b"x").unwrap();
        std::fs::write(media.join("audio/song.mp3"), b"x").unwrap();
        Self { dir }
    }

    fn write_stub(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn probe_stub(&self) -> PathBuf {
        self.write_stub("ffprobe", "echo 6.000000")
    }

    /// Encoder stub that logs progress, writes the trailer and the output.
    fn succeeding_encoder(&self) -> PathBuf {
        self.write_stub(
            "ffmpeg",
            r#"for arg do out="$arg"; done
echo "frame=  150 fps= 30 q=28.0 size=    1024kB time=00:00:10.00 bitrate= 838.9kbits/s speed=1.2x"
echo "video:1000kB audio:100kB subtitle:0kB other streams:0kB global headers:0kB muxing overhead: 1.2%"
printf 'compiled-video' > "$out""#,
        )
    }

    /// Encoder stub that reports progress and then hangs for a while.
    fn hanging_encoder(&self) -> PathBuf {
        self.write_stub(
            "ffmpeg",
            r#"echo "frame=   90 fps= 30 q=28.0 size=     512kB time=00:00:05.00 bitrate= 838.9kbits/s speed=1.0x"
sleep 2"#,
        )
    }

    /// Encoder stub that fails: trailer present, no output file.
    fn failing_encoder(&self) -> PathBuf {
        self.write_stub(
            "ffmpeg",
            r#"echo "Error: encoder exploded mid-mux"
echo "muxing overhead: unknown"
exit 1"#,
        )
    }

    fn config(&self, encoder: &Path) -> EngineConfig {
        EngineConfig {
            media_dir: self.dir.path().join("media"),
            cache_dir: self.dir.path().join("cache"),
            temp_dir: self.dir.path().join("cache/temp"),
            base_url: "/videos".to_string(),
            cache_ttl: Duration::from_secs(24 * 3600),
            status_ttl: Duration::from_secs(60),
            ffmpeg_program: encoder.to_path_buf(),
            ffprobe_program: self.probe_stub(),
            spawn_grace: Duration::from_millis(50),
            ..EngineConfig::default()
        }
    }
}

fn request() -> GenerateRequest {
    GenerateRequest {
        template: Template::Classic,
        images: (0..15).map(|i| format!("img{i:02}.jpg")).collect(),
        videos: vec!["clip.mp4".to_string()],
        audio: Some("song.mp3".to_string()),
        background: None,
        settings: RenderSettings::default(),
        advanced: AdvancedOptions::default(),
        force: false,
    }
}

#[tokio::test]
async fn test_generate_runs_to_completion() {
    let env = TestEnv::new();
    let encoder = env.succeeding_encoder();
    let generator = VideoGenerator::new(env.config(&encoder)).unwrap();

    let response = generator.generate(&request()).await.unwrap();
    assert!(response.success);
    assert_eq!(response.status, ResponseStatus::Generating);
    let key = response.cache_key.unwrap();
    assert!(key.as_str().starts_with("memorial_classic_"));

    // Let the stub finish and the supervisor reap it.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let progress = generator.progress(&key);
    assert_eq!(progress.status, ResponseStatus::Completed);
    assert_eq!(progress.progress, 100);
    let url = progress.video_url.unwrap();
    assert_eq!(url, format!("/videos/{key}.mp4"));

    // Terminal state is stable across polls.
    let again = generator.progress(&key);
    assert_eq!(again.status, ResponseStatus::Completed);

    // The bookkeeping files are gone once the job completed.
    let temp = env.dir.path().join("cache/temp");
    assert!(!temp.join(format!("pid_{key}.txt")).exists());
    assert!(!temp.join(format!("ffmpeg_{key}.log")).exists());

    // The same selection now hits the cache.
    let cached = generator.generate(&request()).await.unwrap();
    assert_eq!(cached.status, ResponseStatus::Cached);
    assert_eq!(cached.video_url.unwrap(), url);
}

#[tokio::test]
async fn test_history_and_delete() {
    let env = TestEnv::new();
    let encoder = env.succeeding_encoder();
    let generator = VideoGenerator::new(env.config(&encoder)).unwrap();

    let response = generator.generate(&request()).await.unwrap();
    let key = response.cache_key.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(generator.progress(&key).status, ResponseStatus::Completed);

    let history = generator.history();
    assert_eq!(history.len(), 1);
    let entry = &history[0];
    assert_eq!(entry.cache_key, key);
    assert_eq!(entry.template, Some(Template::Classic));
    assert_eq!(entry.media_count, Some(16));
    assert!(entry.size > 0);

    assert!(generator.delete(&key).success);
    assert!(generator.history().is_empty());
    assert!(!generator.delete(&key).success);
}

#[tokio::test]
async fn test_rejects_out_of_bounds_selection() {
    let env = TestEnv::new();
    let encoder = env.succeeding_encoder();
    let generator = VideoGenerator::new(env.config(&encoder)).unwrap();

    let mut too_few = request();
    too_few.images.truncate(14);
    let err = generator.generate(&too_few).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    // Nothing was registered for the would-be key.
    let selection = too_few.selection();
    let key = CacheKey::from_selection(&selection, &too_few.settings);
    assert_eq!(generator.progress(&key).status, ResponseStatus::Idle);
}

#[tokio::test]
async fn test_unknown_media_id_is_rejected() {
    let env = TestEnv::new();
    let encoder = env.succeeding_encoder();
    let generator = VideoGenerator::new(env.config(&encoder)).unwrap();

    let mut bad = request();
    bad.images[0] = "nope.jpg".to_string();
    let err = generator.generate(&bad).await.unwrap_err();
    assert!(matches!(err, EngineError::Media(_)));
}

#[tokio::test]
async fn test_duplicate_request_reports_in_progress() {
    let env = TestEnv::new();
    let encoder = env.hanging_encoder();
    let generator = VideoGenerator::new(env.config(&encoder)).unwrap();

    let first = generator.generate(&request()).await.unwrap();
    assert_eq!(first.status, ResponseStatus::Generating);
    let key = first.cache_key.unwrap();

    let second = generator.generate(&request()).await.unwrap();
    assert!(second.success);
    assert_eq!(second.status, ResponseStatus::Generating);
    assert!(second.message.contains("already in progress"));

    // 15 images at 4s plus a 6s clip, minus 15 one-second crossfades: the
    // logged 5s position lands under 10%.
    let progress = generator.progress(&key);
    assert_eq!(progress.status, ResponseStatus::Generating);
    assert!(progress.progress >= 5 && progress.progress < 100);
}

#[tokio::test]
async fn test_encoder_failure_surfaces_log_tail() {
    let env = TestEnv::new();
    let encoder = env.failing_encoder();
    let generator = VideoGenerator::new(env.config(&encoder)).unwrap();

    let response = generator.generate(&request()).await.unwrap();
    let key = response.cache_key.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let progress = generator.progress(&key);
    assert_eq!(progress.status, ResponseStatus::Failed);
    assert!(progress.error.unwrap().contains("encoder exploded"));

    // Failure is sticky until the status entry expires.
    assert_eq!(generator.progress(&key).status, ResponseStatus::Failed);
}

#[tokio::test]
async fn test_force_replaces_cached_output() {
    let env = TestEnv::new();
    let encoder = env.succeeding_encoder();
    let generator = VideoGenerator::new(env.config(&encoder)).unwrap();

    let response = generator.generate(&request()).await.unwrap();
    let key = response.cache_key.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(generator.progress(&key).status, ResponseStatus::Completed);

    let mut forced = request();
    forced.force = true;
    let regenerated = generator.generate(&forced).await.unwrap();
    assert_eq!(regenerated.status, ResponseStatus::Generating);
    assert_eq!(regenerated.cache_key.unwrap(), key);
}
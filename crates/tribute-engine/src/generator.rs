//! Top-level generation pipeline.
//!
//! Wires together the media catalog, the duration prober, the timeline
//! planner, the command builder and the job runner behind one facade the
//! web layer calls.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use tribute_media::{annotate, plan, CompileCommand, MediaCatalog, MediaKind, Prober};
use tribute_models::{
    CacheKey, DeleteResponse, GenerateRequest, GenerateResponse, HistoryEntry, ProgressResponse,
};

use crate::cache::{CacheManager, CacheMetadata};
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::runner::{JobRunner, StartOutcome};
use crate::store::{MemoryStatusStore, StatusStore};

/// Memorial video generation engine.
pub struct VideoGenerator {
    config: EngineConfig,
    catalog: MediaCatalog,
    prober: Prober,
    cache: CacheManager,
    runner: JobRunner,
}

impl VideoGenerator {
    /// Create a generator with the default in-memory status store.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let store = Arc::new(MemoryStatusStore::new(config.status_ttl));
        Self::with_store(config, store)
    }

    /// Create a generator backed by an externally supplied status store.
    pub fn with_store(config: EngineConfig, store: Arc<dyn StatusStore>) -> EngineResult<Self> {
        tribute_media::verify_tools(&config.ffmpeg_program, &config.ffprobe_program)?;
        std::fs::create_dir_all(&config.cache_dir)?;
        std::fs::create_dir_all(&config.temp_dir)?;

        let catalog = MediaCatalog::new(&config.media_dir);
        let prober = Prober::with_program(&config.ffprobe_program);
        let cache = CacheManager::new(&config.cache_dir, &config.base_url, config.cache_ttl);
        let runner = JobRunner::new(config.clone(), store);

        Ok(Self {
            config,
            catalog,
            prober,
            cache,
            runner,
        })
    }

    /// Handle a generation request.
    ///
    /// Returns quickly in every case: with a cached URL, with an
    /// already-in-progress notice, or after launching a detached encoder.
    /// The actual compile result is only observable through [`Self::progress`].
    pub async fn generate(&self, request: &GenerateRequest) -> EngineResult<GenerateResponse> {
        let selection = request.selection();
        selection.validate()?;

        let key = CacheKey::from_selection(&selection, &request.settings);
        debug!(cache_key = %key, template = %selection.template, "generation requested");

        if request.force {
            // Regenerate from scratch; any running job for this key keeps
            // running and its output is simply replaced.
            self.cache.delete_video(&key);
        } else if let Some(path) = self.cache.cached_video(&key) {
            info!(cache_key = %key, "serving cached video");
            return Ok(GenerateResponse::cached(self.cache.video_url(&path), key));
        }

        let images = self.catalog.resolve(&selection.images, MediaKind::Image)?;
        let videos = self.catalog.resolve(&selection.videos, MediaKind::Video)?;
        let audio = self
            .catalog
            .resolve_optional(selection.audio.as_deref(), MediaKind::Audio);
        if selection.audio.is_some() && audio.is_none() {
            warn!(cache_key = %key, "selected audio track not found, compiling silent");
        }

        let mut clips = Vec::with_capacity(videos.len());
        for path in videos {
            let duration = self.prober.clip_duration(&path).await;
            clips.push((path, duration));
        }

        let mut timeline = plan(&images, &clips, request.settings.image_duration)?;
        annotate(
            &mut timeline,
            selection.template,
            &request.settings,
            &request.advanced,
        );

        let media_count = timeline.len();
        let command = CompileCommand::build(
            &timeline,
            &request.settings,
            audio.as_deref(),
            self.cache.video_path(&key),
        )?;

        match self.runner.start(&key, &command, media_count).await? {
            StartOutcome::AlreadyInProgress => {
                return Ok(GenerateResponse::already_in_progress(key));
            }
            StartOutcome::Started => {}
        }

        let metadata = CacheMetadata {
            template: selection.template,
            selection: selection.clone(),
            settings: request.settings.clone(),
            media_count,
            generated_at: Utc::now(),
        };
        if let Err(err) = self.cache.save_metadata(&key, &metadata) {
            warn!(cache_key = %key, error = %err, "failed to write metadata sidecar");
        }

        Ok(GenerateResponse::generating(key))
    }

    /// Progress for a previously requested generation.
    pub fn progress(&self, key: &CacheKey) -> ProgressResponse {
        self.runner.poll(key)
    }

    /// All cached videos, newest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.cache.list_videos()
    }

    /// Delete a cached video and its metadata.
    pub fn delete(&self, key: &CacheKey) -> DeleteResponse {
        self.cache.delete_video(key)
    }

    /// Sweep expired cache files. Returns the number removed.
    pub fn cleanup_expired(&self) -> usize {
        self.cache.cleanup_expired()
    }

    /// Engine configuration in effect.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

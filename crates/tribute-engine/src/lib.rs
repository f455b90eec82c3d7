//! Asynchronous memorial video compilation engine.
//!
//! Orchestrates the pipeline: selection validation, cache-key derivation,
//! timeline planning and effect annotation, encoder command construction,
//! detached background process supervision, log-based progress estimation,
//! and a TTL'd cache with history listing.
//!
//! The web layer stays external: it constructs a [`VideoGenerator`] and maps
//! its request/response types onto whatever transport it uses.

pub mod cache;
pub mod config;
pub mod error;
pub mod generator;
pub mod job;
pub mod runner;
pub mod store;

pub use cache::{CacheManager, CacheMetadata};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use generator::VideoGenerator;
pub use job::JobHandle;
pub use runner::{JobRunner, StartOutcome};
pub use store::{MemoryStatusStore, StatusStore};

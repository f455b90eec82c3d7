//! Shared data models for the tribute video engine.
//!
//! This crate provides Serde-serializable types for:
//! - Media selections and their validation bounds
//! - Render settings and quality presets
//! - Compilation timelines (slots, effects, transitions)
//! - Generation status and cache keys
//! - Request/response payloads consumed by the web layer

pub mod fingerprint;
pub mod request;
pub mod response;
pub mod selection;
pub mod settings;
pub mod status;
pub mod template;
pub mod timeline;

// Re-export common types
pub use fingerprint::CacheKey;
pub use request::{AdvancedOptions, GenerateRequest};
pub use response::{DeleteResponse, GenerateResponse, HistoryEntry, ProgressResponse, ResponseStatus};
pub use selection::{Selection, SelectionError, MAX_IMAGES, MAX_VIDEOS, MIN_IMAGES, MIN_VIDEOS};
pub use settings::{QualityPreset, RenderSettings};
pub use status::{GenerationStatus, JobState};
pub use template::Template;
pub use timeline::{PanZoom, Slot, SlotKind, Timeline};

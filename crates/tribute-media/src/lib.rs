//! FFmpeg CLI wrapper for memorial video compilation.
//!
//! This crate provides:
//! - Media catalog over fixed directories with per-kind extension allow-lists
//! - Timeline planning (image sequence with evenly distributed video clips)
//! - Ken Burns / transition effect selection per template
//! - Type-safe compilation command building (filter-graph assembly)
//! - Duration probing via ffprobe with a safe fallback
//! - Log-based encode progress estimation

pub mod catalog;
pub mod command;
pub mod effects;
pub mod error;
pub mod planner;
pub mod probe;
pub mod progress;
pub mod tools;

pub use catalog::{MediaCatalog, MediaItem, MediaKind};
pub use command::CompileCommand;
pub use effects::{annotate, template_transitions, zoompan, KEN_BURNS_PATTERN_COUNT};
pub use error::{MediaError, MediaResult};
pub use planner::{plan, MIN_TIMELINE_IMAGES};
pub use probe::{Prober, FALLBACK_CLIP_SECS};
pub use progress::{estimate_progress, has_completion_marker, log_tail, COMPLETION_MARKER};
pub use tools::verify_tools;

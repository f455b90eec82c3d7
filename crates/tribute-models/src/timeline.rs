//! Compilation timeline: ordered slots of images and video clips.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Kind of media occupying a timeline slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Image,
    Video,
}

/// A pan/zoom animation assigned to an image slot.
///
/// `pattern` indexes the fixed pattern table in the effects module;
/// `intensity` scales both zoom speed and maximum zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanZoom {
    pub pattern: usize,
    pub intensity: f64,
}

/// One positioned unit in the compiled timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub kind: SlotKind,
    pub source: PathBuf,
    pub duration_secs: f64,
    /// Pan/zoom effect; only set for image slots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<PanZoom>,
    /// Crossfade transition leading into this slot; unset for the first slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<String>,
}

impl Slot {
    /// Create an un-annotated slot.
    pub fn new(kind: SlotKind, source: impl Into<PathBuf>, duration_secs: f64) -> Self {
        Self {
            kind,
            source: source.into(),
            duration_secs,
            effect: None,
            transition: None,
        }
    }
}

/// Ordered sequence of slots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timeline {
    pub slots: Vec<Slot>,
}

impl Timeline {
    pub fn new(slots: Vec<Slot>) -> Self {
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn image_count(&self) -> usize {
        self.slots.iter().filter(|s| s.kind == SlotKind::Image).count()
    }

    pub fn video_count(&self) -> usize {
        self.slots.iter().filter(|s| s.kind == SlotKind::Video).count()
    }

    /// Total output duration in seconds.
    ///
    /// Each crossfade overlaps two adjacent slots, so one transition duration
    /// is subtracted per adjacent pair.
    pub fn total_duration(&self, transition_secs: f64) -> f64 {
        if self.slots.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.slots.iter().map(|s| s.duration_secs).sum();
        sum - (self.slots.len() as f64 - 1.0) * transition_secs
    }
}

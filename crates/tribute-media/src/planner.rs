//! Sequence planning: images in order, videos distributed through the middle.

use std::path::PathBuf;

use tracing::debug;

use tribute_models::{Slot, SlotKind, Timeline};

use crate::error::{MediaError, MediaResult};

/// Minimum image count for a safe timeline.
pub const MIN_TIMELINE_IMAGES: usize = 3;

/// Number of edge positions at each end kept free of video slots.
const EDGE_GUARD: usize = 3;

/// Build a timeline from resolved media.
///
/// Images appear in input order, each at `image_duration` seconds. Videos
/// carry their probed duration and are spread evenly across the safe zone
/// `[3, N-3]` of the image sequence so a clip is never the very first or
/// last content. Each insertion shifts later insertion points by one.
pub fn plan(
    images: &[PathBuf],
    videos: &[(PathBuf, f64)],
    image_duration: f64,
) -> MediaResult<Timeline> {
    if images.len() < MIN_TIMELINE_IMAGES {
        return Err(MediaError::InsufficientMedia(images.len()));
    }

    let mut slots: Vec<Slot> = images
        .iter()
        .map(|path| Slot::new(SlotKind::Image, path.clone(), image_duration))
        .collect();

    let safe_start = EDGE_GUARD;
    let safe_end = slots.len().saturating_sub(EDGE_GUARD);
    let safe_range = safe_end.saturating_sub(safe_start);
    let interval = safe_range / (videos.len() + 1);

    for (video_index, (path, duration)) in videos.iter().enumerate() {
        let position = safe_start + interval * (video_index + 1);
        // Earlier insertions lengthen the sequence by one each.
        let adjusted = (position + video_index).min(slots.len());
        slots.insert(adjusted, Slot::new(SlotKind::Video, path.clone(), *duration));
    }

    let timeline = Timeline::new(slots);
    debug!(
        slots = timeline.len(),
        images = timeline.image_count(),
        videos = timeline.video_count(),
        "planned timeline"
    );
    Ok(timeline)
}

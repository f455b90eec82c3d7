//! Ken Burns pan/zoom patterns and crossfade transition selection.

use rand::seq::IndexedRandom;
use rand::Rng;

use tribute_models::{AdvancedOptions, PanZoom, RenderSettings, SlotKind, Template, Timeline};

/// Number of pan/zoom patterns in the fixed table.
pub const KEN_BURNS_PATTERN_COUNT: usize = 8;

/// Candidate xfade transition names per template.
pub fn template_transitions(template: Template) -> &'static [&'static str] {
    match template {
        Template::Classic => &["fade", "dissolve", "smoothleft", "smoothright"],
        Template::Modern => &[
            "smoothleft",
            "smoothright",
            "circleopen",
            "circleclose",
            "pixelize",
        ],
        Template::Elegant => &[
            "fade",
            "fadeblack",
            "fadewhite",
            "dissolve",
            "circleopen",
            "circleclose",
        ],
    }
}

/// Render a zoompan filter for one pattern slot.
///
/// `intensity` scales both the per-frame zoom speed and the maximum zoom
/// (`max_zoom = 1.0 + base_delta * intensity`). `frames` must equal
/// `duration * fps` so the animation exactly spans the slot.
pub fn zoompan(
    pattern: usize,
    intensity: f64,
    frames: u32,
    width: u32,
    height: u32,
    fps: u32,
) -> String {
    let speed_slow = 0.0015 * intensity;
    let speed_gentle = 0.001 * intensity;
    let speed_fast = 0.002 * intensity;
    let speed_drift = 0.0012 * intensity;

    let zoom_full = 1.0 + 0.3 * intensity;
    let zoom_gentle = 1.0 + 0.2 * intensity;
    let zoom_deep = 1.0 + 0.4 * intensity;
    let zoom_drift = 1.0 + 0.25 * intensity;

    let tail = format!("d={frames}:s={width}x{height}:fps={fps}");

    match pattern % KEN_BURNS_PATTERN_COUNT {
        // Zoom in slowly from center
        0 => format!("zoompan=z='min(zoom+{speed_slow},{zoom_full})':{tail}"),
        // Zoom out from close
        1 => format!(
            "zoompan=z='if(lte(zoom,1.0),{zoom_full},max(1.0,zoom-{speed_slow}))':{tail}"
        ),
        // Pan left with slight zoom
        2 => format!(
            "zoompan=z='min(zoom+{speed_gentle},{zoom_gentle})':x='iw/2-(iw/zoom/2)-((iw/zoom/2)*0.5*in/{frames})':{tail}"
        ),
        // Pan right with slight zoom
        3 => format!(
            "zoompan=z='min(zoom+{speed_gentle},{zoom_gentle})':x='iw/2-(iw/zoom/2)+((iw/zoom/2)*0.5*in/{frames})':{tail}"
        ),
        // Zoom to center from top-left
        4 => format!(
            "zoompan=z='min(zoom+{speed_fast},{zoom_deep})':x='iw/2-(iw/zoom/2)-(iw/10)+(in*(iw/10)/{frames})':y='ih/2-(ih/zoom/2)-(ih/10)+(in*(ih/10)/{frames})':{tail}"
        ),
        // Zoom to center from bottom-right
        5 => format!(
            "zoompan=z='min(zoom+{speed_fast},{zoom_deep})':x='iw/2-(iw/zoom/2)+(iw/10)-(in*(iw/10)/{frames})':y='ih/2-(ih/zoom/2)+(ih/10)-(in*(ih/10)/{frames})':{tail}"
        ),
        // Slow zoom with vertical pan up
        6 => format!(
            "zoompan=z='min(zoom+{speed_drift},{zoom_drift})':y='ih/2-(ih/zoom/2)-((ih/zoom/2)*0.3*in/{frames})':{tail}"
        ),
        // Slow zoom with vertical pan down
        _ => format!(
            "zoompan=z='min(zoom+{speed_drift},{zoom_drift})':y='ih/2-(ih/zoom/2)+((ih/zoom/2)*0.3*in/{frames})':{tail}"
        ),
    }
}

/// Annotate a planned timeline with effects and transitions.
///
/// Pan/zoom patterns cycle deterministically by slot index; transitions are
/// chosen pseudo-randomly per adjacent pair from the template's candidate
/// list (or the advanced override subsets when enabled and non-empty).
pub fn annotate(
    timeline: &mut Timeline,
    template: Template,
    settings: &RenderSettings,
    advanced: &AdvancedOptions,
) {
    annotate_with_rng(timeline, template, settings, advanced, &mut rand::rng());
}

/// Annotate with a caller-supplied RNG (reproducible in tests).
pub fn annotate_with_rng<R: Rng>(
    timeline: &mut Timeline,
    template: Template,
    settings: &RenderSettings,
    advanced: &AdvancedOptions,
    rng: &mut R,
) {
    let patterns = pattern_candidates(advanced);
    let transitions = transition_candidates(template, advanced);

    for (index, slot) in timeline.slots.iter_mut().enumerate() {
        if slot.kind == SlotKind::Image {
            slot.effect = Some(PanZoom {
                pattern: patterns[index % patterns.len()],
                intensity: settings.ken_burns_intensity,
            });
        }
        if index > 0 {
            let choice = transitions
                .choose(rng)
                .copied()
                .unwrap_or("fade");
            slot.transition = Some(choice.to_string());
        }
    }
}

fn pattern_candidates(advanced: &AdvancedOptions) -> Vec<usize> {
    if advanced.enabled {
        let subset: Vec<usize> = advanced
            .ken_burns_patterns
            .iter()
            .copied()
            .filter(|&p| p < KEN_BURNS_PATTERN_COUNT)
            .collect();
        if !subset.is_empty() {
            return subset;
        }
    }
    (0..KEN_BURNS_PATTERN_COUNT).collect()
}

fn transition_candidates<'a>(template: Template, advanced: &'a AdvancedOptions) -> Vec<&'a str> {
    if advanced.enabled && !advanced.transitions.is_empty() {
        return advanced.transitions.iter().map(String::as_str).collect();
    }
    template_transitions(template).to_vec()
}

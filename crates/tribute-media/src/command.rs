//! Compilation command builder.
//!
//! Translates an annotated timeline plus render settings into a full ffmpeg
//! argv: one input clause per slot, a filter graph (normalization, pan/zoom,
//! crossfades, audio mix) and mobile-compatible output encoding parameters.

use std::path::{Path, PathBuf};

use tribute_models::settings::{AUDIO_SAMPLE_RATE, DEFAULT_AUDIO_FADE_SECS};
use tribute_models::{RenderSettings, Slot, SlotKind, Timeline};

use crate::effects::zoompan;
use crate::error::{MediaError, MediaResult};
use crate::planner::MIN_TIMELINE_IMAGES;

/// A fully assembled compilation command.
///
/// Arguments are kept as a typed list and serialized to a single argv array
/// at spawn time; nothing is ever passed through a shell.
#[derive(Debug, Clone)]
pub struct CompileCommand {
    inputs: Vec<Vec<String>>,
    filters: Vec<String>,
    output_args: Vec<String>,
    output: PathBuf,
    total_duration: f64,
}

impl CompileCommand {
    /// Build the command for an annotated timeline.
    ///
    /// Fails with `TooFewImages` before anything is spawned when the timeline
    /// carries fewer than three image slots.
    pub fn build(
        timeline: &Timeline,
        settings: &RenderSettings,
        audio: Option<&Path>,
        output: impl AsRef<Path>,
    ) -> MediaResult<Self> {
        if timeline.image_count() < MIN_TIMELINE_IMAGES {
            return Err(MediaError::TooFewImages);
        }

        let total = timeline.total_duration(settings.transition_duration);
        if !total.is_finite() || total <= 0.0 {
            return Err(MediaError::DegenerateTimeline(format!(
                "total duration {total} is not positive"
            )));
        }

        let mut inputs = Vec::with_capacity(timeline.len() + 1);
        let mut filters = Vec::new();

        for (index, slot) in timeline.slots.iter().enumerate() {
            inputs.push(input_clause(slot, settings));
            filters.extend(slot_filters(index, slot, settings));
        }

        filters.extend(xfade_chain(&timeline.slots, settings.transition_duration));

        let audio_index = timeline.len();
        if let Some(track) = audio {
            inputs.push(vec![
                "-t".to_string(),
                format!("{total:.3}"),
                "-i".to_string(),
                track.to_string_lossy().to_string(),
            ]);
            filters.push(music_filter(audio_index, total, settings));
        } else {
            // The container always carries an audio stream.
            filters.push(format!(
                "anullsrc=channel_layout=stereo:sample_rate=44100:duration={total:.3}[aout]"
            ));
        }

        Ok(Self {
            inputs,
            filters,
            output_args: output_encoding_args(total, settings),
            output: output.as_ref().to_path_buf(),
            total_duration: total,
        })
    }

    /// Total output duration declared to the encoder, in seconds.
    pub fn declared_duration(&self) -> f64 {
        self.total_duration
    }

    /// Serialize to an argv array (excluding the program name).
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-stats_period".to_string(),
            "0.5".to_string(),
        ];
        for clause in &self.inputs {
            args.extend(clause.iter().cloned());
        }
        args.push("-filter_complex".to_string());
        args.push(self.filters.join("; "));
        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().to_string());
        args
    }

    /// Single-line rendering for the command dump file.
    pub fn render(&self) -> String {
        self.to_args().join(" ")
    }
}

fn input_clause(slot: &Slot, settings: &RenderSettings) -> Vec<String> {
    match slot.kind {
        SlotKind::Image => vec![
            "-loop".to_string(),
            "1".to_string(),
            "-framerate".to_string(),
            settings.frame_rate.to_string(),
            "-t".to_string(),
            format!("{:.3}", slot.duration_secs),
            "-i".to_string(),
            slot.source.to_string_lossy().to_string(),
        ],
        // Video duration is trimmed in the filter graph, not at the input.
        SlotKind::Video => vec![
            "-i".to_string(),
            slot.source.to_string_lossy().to_string(),
        ],
    }
}

/// Filter-graph entries normalizing one slot to a common `[v{index}]` stream.
fn slot_filters(index: usize, slot: &Slot, settings: &RenderSettings) -> Vec<String> {
    let fps = settings.frame_rate;
    let frames = settings.frames_for(slot.duration_secs);

    let prefix = match slot.kind {
        SlotKind::Image => format!("fps={fps}"),
        // Normalize the frame rate, reset timestamps, then take exactly the
        // required frame count by index. Longer sources are truncated;
        // shorter sources are not looped.
        SlotKind::Video => format!(
            "fps={fps},setpts=PTS-STARTPTS,select='lt(n,{frames})',setpts=N/({fps}*TB)"
        ),
    };

    let mut tail = String::new();
    if let Some(effect) = slot.effect {
        tail.push_str(&zoompan(
            effect.pattern,
            effect.intensity,
            frames,
            settings.width,
            settings.height,
            fps,
        ));
        tail.push(',');
    }
    if settings.shadow && slot.kind == SlotKind::Image {
        tail.push_str("vignette,");
    }
    if slot.kind == SlotKind::Image {
        tail.push_str("setpts=PTS-STARTPTS,");
    }
    tail.push_str("settb=AVTB,setsar=1,format=yuv420p");

    let (width, height) = (settings.width, settings.height);
    if settings.blur_background {
        // Letterbox bars are filled with a blurred copy of the frame.
        vec![
            format!("[{index}:v]{prefix},split=2[raw{index}][fill{index}]"),
            format!("[raw{index}]scale={width}:{height},setsar=1,boxblur=20:2[bg{index}]"),
            format!(
                "[fill{index}]scale={width}:{height}:force_original_aspect_ratio=decrease[fg{index}]"
            ),
            format!("[bg{index}][fg{index}]overlay=(W-w)/2:(H-h)/2,{tail}[v{index}]"),
        ]
    } else {
        let pad = if settings.pad_color == "black" {
            format!("pad={width}:{height}:(ow-iw)/2:(oh-ih)/2")
        } else {
            format!(
                "pad={width}:{height}:(ow-iw)/2:(oh-ih)/2:color={}",
                settings.pad_color
            )
        };
        vec![format!(
            "[{index}:v]{prefix},scale={width}:{height}:force_original_aspect_ratio=decrease,{pad},{tail}[v{index}]"
        )]
    }
}

/// Chain slots pairwise with xfade.
///
/// xfade overlaps both inputs by the transition duration, so each slot after
/// the first contributes `duration - transition` to the running offset.
fn xfade_chain(slots: &[Slot], transition_secs: f64) -> Vec<String> {
    let mut filters = Vec::with_capacity(slots.len().saturating_sub(1));
    let mut current = "v0".to_string();
    let mut offset = slots[0].duration_secs;

    for (index, slot) in slots.iter().enumerate().skip(1) {
        let label = if index < slots.len() - 1 {
            format!("vt{index}")
        } else {
            "vout".to_string()
        };
        let transition = slot.transition.as_deref().unwrap_or("fade");
        filters.push(format!(
            "[{current}][v{index}]xfade=transition={transition}:duration={transition_secs:.3}:offset={:.3}[{label}]",
            offset - transition_secs
        ));
        current = label;
        offset += slot.duration_secs - transition_secs;
    }

    filters
}

fn music_filter(input_index: usize, total: f64, settings: &RenderSettings) -> String {
    let mut chain = format!("[{input_index}:a]volume={:.2}", settings.music_volume);
    if settings.audio_fade {
        let fade = DEFAULT_AUDIO_FADE_SECS;
        let fade_out_start = (total - fade).max(0.0);
        chain.push_str(&format!(
            ",afade=t=in:st=0:d={fade},afade=t=out:st={fade_out_start:.3}:d={fade}"
        ));
    }
    chain.push_str("[aout]");
    chain
}

fn output_encoding_args(total: f64, settings: &RenderSettings) -> Vec<String> {
    let quality = settings.quality;
    [
        "-map",
        "[vout]",
        "-map",
        "[aout]",
        "-t",
        &format!("{total:.3}"),
        "-shortest",
        "-c:v",
        "libx264",
        "-profile:v",
        "baseline",
        "-level",
        "4.0",
        "-preset",
        quality.encoder_preset(),
        "-crf",
        &quality.crf().to_string(),
        "-g",
        &settings.keyframe_interval().to_string(),
        "-bf",
        "2",
        "-pix_fmt",
        "yuv420p",
        "-c:a",
        "aac",
        "-b:a",
        quality.audio_bitrate(),
        "-ar",
        &AUDIO_SAMPLE_RATE.to_string(),
        "-f",
        "mp4",
        "-movflags",
        "+faststart",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tribute_models::PanZoom;

    fn timeline(images: usize, video_duration: Option<f64>) -> Timeline {
        let mut slots: Vec<Slot> = (0..images)
            .map(|i| {
                let mut slot = Slot::new(SlotKind::Image, format!("img{i}.jpg"), 4.0);
                slot.effect = Some(PanZoom {
                    pattern: i % 8,
                    intensity: 1.0,
                });
                if i > 0 {
                    slot.transition = Some("fade".to_string());
                }
                slot
            })
            .collect();
        if let Some(duration) = video_duration {
            let mut slot = Slot::new(SlotKind::Video, "clip.mp4", duration);
            slot.transition = Some("dissolve".to_string());
            slots.insert(8, slot);
        }
        Timeline::new(slots)
    }

    #[test]
    fn test_declared_duration_matches_timeline_math() {
        // 15 images at 4s + one 6s video with 1s transitions => 51s
        let cmd = CompileCommand::build(
            &timeline(15, Some(6.0)),
            &RenderSettings::default(),
            None,
            "out.mp4",
        )
        .unwrap();
        assert!((cmd.declared_duration() - 51.0).abs() < 1e-9);

        let args = cmd.to_args();
        let t_pos = args.iter().rposition(|a| a == "-t").unwrap();
        assert_eq!(args[t_pos + 1], "51.000");
    }

    #[test]
    fn test_too_few_images_rejected() {
        let err = CompileCommand::build(
            &timeline(2, None),
            &RenderSettings::default(),
            None,
            "out.mp4",
        )
        .unwrap_err();
        assert!(matches!(err, MediaError::TooFewImages));
    }

    #[test]
    fn test_image_inputs_are_looped() {
        let cmd = CompileCommand::build(
            &timeline(15, Some(6.0)),
            &RenderSettings::default(),
            None,
            "out.mp4",
        )
        .unwrap();
        let rendered = cmd.render();
        assert!(rendered.contains("-loop 1 -framerate 30 -t 4.000 -i img0.jpg"));
        // Video input has no -loop clause
        assert!(rendered.contains("-i clip.mp4"));
        assert!(!rendered.contains("-loop 1 -framerate 30 -t 6.000 -i clip.mp4"));
    }

    #[test]
    fn test_video_slot_is_frame_truncated() {
        let cmd = CompileCommand::build(
            &timeline(15, Some(6.0)),
            &RenderSettings::default(),
            None,
            "out.mp4",
        )
        .unwrap();
        let rendered = cmd.render();
        // 6s at 30fps
        assert!(rendered.contains("select='lt(n,180)'"));
        assert!(rendered.contains("setpts=N/(30*TB)"));
    }

    #[test]
    fn test_xfade_offsets_account_for_overlap() {
        let cmd = CompileCommand::build(
            &timeline(3, None),
            &RenderSettings::default(),
            None,
            "out.mp4",
        )
        .unwrap();
        let rendered = cmd.render();
        // First transition starts one transition-duration before slot 0 ends.
        assert!(rendered.contains("xfade=transition=fade:duration=1.000:offset=3.000[vt1]"));
        // Second: 4 + (4-1) - 1 = 6
        assert!(rendered.contains("xfade=transition=fade:duration=1.000:offset=6.000[vout]"));
    }

    #[test]
    fn test_silence_synthesized_without_audio() {
        let cmd = CompileCommand::build(
            &timeline(3, None),
            &RenderSettings::default(),
            None,
            "out.mp4",
        )
        .unwrap();
        assert!(cmd.render().contains("anullsrc=channel_layout=stereo"));
    }

    #[test]
    fn test_music_track_is_trimmed_and_faded() {
        let cmd = CompileCommand::build(
            &timeline(15, None),
            &RenderSettings::default(),
            Some(Path::new("song.mp3")),
            "out.mp4",
        )
        .unwrap();
        let rendered = cmd.render();
        // 15*4 - 14 = 46s total; fade-out starts 2s before the end
        assert!(rendered.contains("-t 46.000 -i song.mp3"));
        assert!(rendered.contains("volume=0.30"));
        assert!(rendered.contains("afade=t=in:st=0:d=2"));
        assert!(rendered.contains("afade=t=out:st=44.000:d=2"));
    }

    #[test]
    fn test_output_encoding_parameters() {
        let cmd = CompileCommand::build(
            &timeline(3, None),
            &RenderSettings::default(),
            None,
            "out.mp4",
        )
        .unwrap();
        let rendered = cmd.render();
        assert!(rendered.contains("-pix_fmt yuv420p"));
        assert!(rendered.contains("-movflags +faststart"));
        assert!(rendered.contains("-shortest"));
        assert!(rendered.contains("-crf 23"));
        assert!(rendered.contains("-preset medium"));
        assert!(rendered.contains("-b:a 192k"));
        assert!(rendered.contains("-g 60"));
        assert!(rendered.starts_with("-y -stats_period 0.5"));
    }

    #[test]
    fn test_blur_background_variant() {
        let settings = RenderSettings {
            blur_background: true,
            ..Default::default()
        };
        let cmd =
            CompileCommand::build(&timeline(3, None), &settings, None, "out.mp4").unwrap();
        let rendered = cmd.render();
        assert!(rendered.contains("boxblur"));
        assert!(rendered.contains("overlay=(W-w)/2:(H-h)/2"));
        assert!(!rendered.contains("force_original_aspect_ratio=decrease,pad="));
    }
}

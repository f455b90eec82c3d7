//! Render settings and quality presets.

use serde::{Deserialize, Serialize};

/// Default output width (portrait, mobile full-screen)
pub const DEFAULT_WIDTH: u32 = 1080;
/// Default output height
pub const DEFAULT_HEIGHT: u32 = 1920;
/// Default frame rate
pub const DEFAULT_FRAME_RATE: u32 = 30;
/// Default per-image slot duration in seconds
pub const DEFAULT_IMAGE_DURATION: f64 = 4.0;
/// Default crossfade duration in seconds
pub const DEFAULT_TRANSITION_DURATION: f64 = 1.0;
/// Default music attenuation (constant gain)
pub const DEFAULT_MUSIC_VOLUME: f64 = 0.3;
/// Default audio fade-in/out length in seconds
pub const DEFAULT_AUDIO_FADE_SECS: f64 = 2.0;
/// Audio sample rate (video standard)
pub const AUDIO_SAMPLE_RATE: u32 = 48_000;

/// Output quality preset, mapped to CRF / encoder preset / audio bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QualityPreset {
    Draft,
    #[default]
    Standard,
    High,
}

impl QualityPreset {
    /// Constant Rate Factor for libx264 (lower is better).
    pub fn crf(&self) -> u8 {
        match self {
            QualityPreset::Draft => 28,
            QualityPreset::Standard => 23,
            QualityPreset::High => 20,
        }
    }

    /// libx264 speed preset.
    pub fn encoder_preset(&self) -> &'static str {
        match self {
            QualityPreset::Draft => "ultrafast",
            QualityPreset::Standard => "medium",
            QualityPreset::High => "slow",
        }
    }

    /// AAC audio bitrate.
    pub fn audio_bitrate(&self) -> &'static str {
        match self {
            QualityPreset::Draft => "128k",
            QualityPreset::Standard => "192k",
            QualityPreset::High => "256k",
        }
    }
}

/// Settings bundle for one compilation.
///
/// Hashed together with the selection to form the cache key, so any change
/// here produces a distinct output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Output width in pixels
    #[serde(default = "default_width")]
    pub width: u32,
    /// Output height in pixels
    #[serde(default = "default_height")]
    pub height: u32,
    /// Output frame rate
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    /// Seconds each still image is shown
    #[serde(default = "default_image_duration")]
    pub image_duration: f64,
    /// Crossfade overlap between adjacent slots in seconds
    #[serde(default = "default_transition_duration")]
    pub transition_duration: f64,
    /// Ken Burns intensity multiplier (1.0 = default motion)
    #[serde(default = "default_intensity")]
    pub ken_burns_intensity: f64,
    /// Quality preset for the encoder
    #[serde(default)]
    pub quality: QualityPreset,
    /// Background music gain (0.0..=1.0)
    #[serde(default = "default_music_volume")]
    pub music_volume: f64,
    /// Apply linear fade-in/out to the music track
    #[serde(default = "default_true")]
    pub audio_fade: bool,
    /// Fill letterbox bars with a blurred copy of the frame instead of padding
    #[serde(default)]
    pub blur_background: bool,
    /// Apply a soft vignette shadow to image slots
    #[serde(default)]
    pub shadow: bool,
    /// Letterbox padding color (ffmpeg color name or hex)
    #[serde(default = "default_pad_color")]
    pub pad_color: String,
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}
fn default_height() -> u32 {
    DEFAULT_HEIGHT
}
fn default_frame_rate() -> u32 {
    DEFAULT_FRAME_RATE
}
fn default_image_duration() -> f64 {
    DEFAULT_IMAGE_DURATION
}
fn default_transition_duration() -> f64 {
    DEFAULT_TRANSITION_DURATION
}
fn default_intensity() -> f64 {
    1.0
}
fn default_music_volume() -> f64 {
    DEFAULT_MUSIC_VOLUME
}
fn default_true() -> bool {
    true
}
fn default_pad_color() -> String {
    "black".to_string()
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            frame_rate: DEFAULT_FRAME_RATE,
            image_duration: DEFAULT_IMAGE_DURATION,
            transition_duration: DEFAULT_TRANSITION_DURATION,
            ken_burns_intensity: 1.0,
            quality: QualityPreset::Standard,
            music_volume: DEFAULT_MUSIC_VOLUME,
            audio_fade: true,
            blur_background: false,
            shadow: false,
            pad_color: "black".to_string(),
        }
    }
}

impl RenderSettings {
    /// Keyframe interval: one keyframe every two seconds.
    pub fn keyframe_interval(&self) -> u32 {
        self.frame_rate * 2
    }

    /// Frame count for a slot of the given duration at the configured rate.
    pub fn frames_for(&self, duration_secs: f64) -> u32 {
        (duration_secs * self.frame_rate as f64).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = RenderSettings::default();
        assert_eq!(s.width, 1080);
        assert_eq!(s.height, 1920);
        assert_eq!(s.frame_rate, 30);
        assert_eq!(s.quality.crf(), 23);
        assert_eq!(s.keyframe_interval(), 60);
    }

    #[test]
    fn test_frames_for() {
        let s = RenderSettings::default();
        assert_eq!(s.frames_for(4.0), 120);
        assert_eq!(s.frames_for(6.5), 195);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let s: RenderSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(s, RenderSettings::default());
    }
}

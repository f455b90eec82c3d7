//! Inbound request payloads from the web layer.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::selection::Selection;
use crate::settings::RenderSettings;
use crate::template::Template;

/// User-supplied overrides for transition and pan/zoom candidates.
///
/// When `enabled`, the effect selector draws only from the listed subsets;
/// an empty subset falls back to the template's default list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvancedOptions {
    #[serde(default)]
    pub enabled: bool,
    /// xfade transition names (e.g. "fade", "circleopen")
    #[serde(default)]
    pub transitions: Vec<String>,
    /// Indices into the pan/zoom pattern table
    #[serde(default)]
    pub ken_burns_patterns: Vec<usize>,
}

/// A generation request as received from the web layer.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerateRequest {
    #[serde(default)]
    pub template: Template,
    #[validate(length(min = 15, max = 40, message = "images must be between 15 and 40"))]
    pub images: Vec<String>,
    #[validate(length(min = 1, max = 5, message = "videos must be between 1 and 5"))]
    pub videos: Vec<String>,
    #[serde(default)]
    pub audio: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub settings: RenderSettings,
    #[serde(default)]
    pub advanced: AdvancedOptions,
    /// Regenerate even if a cached output exists for this selection
    #[serde(default)]
    pub force: bool,
}

impl GenerateRequest {
    /// The selection portion of the request, used for fingerprinting.
    pub fn selection(&self) -> Selection {
        Selection {
            template: self.template,
            images: self.images.clone(),
            videos: self.videos.clone(),
            audio: self.audio.clone(),
            background: self.background.clone(),
        }
    }
}

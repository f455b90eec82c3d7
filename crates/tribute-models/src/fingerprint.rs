//! Selection fingerprinting for cache keys.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

use crate::selection::Selection;
use crate::settings::RenderSettings;

/// Hex characters of the digest kept in the key.
const KEY_DIGEST_LEN: usize = 12;

/// Stable fingerprint of a selection + settings.
///
/// Identical inputs always produce the identical key; changing any field of
/// the selection or the settings changes it. Used to deduplicate jobs and to
/// derive output/log/command file paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the cache key from a selection and its settings.
    pub fn from_selection(selection: &Selection, settings: &RenderSettings) -> Self {
        // serde_json maps are sorted by key, so the payload is canonical.
        let payload = serde_json::json!({
            "template": selection.template.as_str(),
            "images": selection.images,
            "videos": selection.videos,
            "audio": selection.audio,
            "background": selection.background,
            "settings": settings,
        });
        let digest = Sha256::digest(payload.to_string().as_bytes());
        let mut hex = String::with_capacity(KEY_DIGEST_LEN);
        for byte in digest.iter().take(KEY_DIGEST_LEN / 2) {
            let _ = write!(hex, "{byte:02x}");
        }
        CacheKey(format!("memorial_{}_{hex}", selection.template.as_str()))
    }

    /// Wrap an existing key string (e.g. one received from a delete request).
    pub fn from_raw(key: impl Into<String>) -> Self {
        CacheKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

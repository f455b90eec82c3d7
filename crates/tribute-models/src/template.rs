//! Video template styles.

use serde::{Deserialize, Serialize};

/// Visual template for a compiled video.
///
/// The template selects which transition candidates and pan/zoom patterns
/// the effect selector draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    #[default]
    Classic,
    Modern,
    Elegant,
}

impl Template {
    /// All known templates.
    pub const ALL: [Template; 3] = [Template::Classic, Template::Modern, Template::Elegant];

    /// Get string representation of the template.
    pub fn as_str(&self) -> &'static str {
        match self {
            Template::Classic => "classic",
            Template::Modern => "modern",
            Template::Elegant => "elegant",
        }
    }

    /// Parse a template name, falling back to classic for unknown values.
    pub fn from_name(name: &str) -> Self {
        match name {
            "modern" => Template::Modern,
            "elegant" => Template::Elegant,
            _ => Template::Classic,
        }
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

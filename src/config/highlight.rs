//! Hover highlight colours for editable markers

use serde::Deserialize;

use crate::controller::HighlightStyle;

/// Highlight configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightConfig {
    /// Background while the pointer is over a marker (light yellow)
    pub edit_color: String,
    /// Background restored when the pointer leaves
    pub idle_color: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        let style = HighlightStyle::default();
        Self {
            edit_color: style.edit,
            idle_color: style.idle,
        }
    }
}

/// Highlight settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileHighlight {
    pub edit_color: Option<String>,
    pub idle_color: Option<String>,
}

impl HighlightConfig {
    /// Create from file config with defaults
    pub fn from_file(file: Option<FileHighlight>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            edit_color: file.edit_color.unwrap_or(defaults.edit_color),
            idle_color: file.idle_color.unwrap_or(defaults.idle_color),
        }
    }

    pub fn style(&self) -> HighlightStyle {
        HighlightStyle {
            edit: self.edit_color.clone(),
            idle: self.idle_color.clone(),
        }
    }
}

//! Editor configuration.
//!
//! Every field has a default, so hosts can ship a partial JSON document (or
//! none at all) and override only what their layout needs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::format::FontSizeToken;
use crate::types::Size;

/// How toolbar coordinates are expressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionMode {
    /// Viewport coordinates, for a `position: fixed` toolbar.
    #[default]
    Fixed,
    /// Viewport coordinates plus scroll offset, for a `position: absolute` toolbar.
    Document,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolbarConfig {
    /// Distance between the toolbar and its target rect.
    pub gap: f64,
    /// Minimum distance kept from the viewport's left and right edges.
    pub padding: f64,
    /// Size assumed before the toolbar has been measured.
    pub default_size: Size,
    pub mode: PositionMode,
}

impl Default for ToolbarConfig {
    fn default() -> Self {
        Self {
            gap: 10.0,
            padding: 10.0,
            default_size: Size::new(360.0, 48.0),
            mode: PositionMode::Fixed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Settle window for bursts of selection-change events.
    pub debounce_ms: u64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self { debounce_ms: 10 }
    }
}

impl SelectionConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// One entry of the font-size menu.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSizeOption {
    pub label: String,
    pub token: FontSizeToken,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub toolbar: ToolbarConfig,
    pub selection: SelectionConfig,
    /// Colors offered by the color sub-panel.
    pub palette: Vec<String>,
    pub font_sizes: Vec<FontSizeOption>,
    /// Text fields scanned, in order, for a project name at save time.
    pub title_fields: Vec<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        let palette = [
            "#000000", "#374151", "#6B7280", "#9CA3AF", "#FFFFFF", "#EF4444", "#F59E0B",
            "#10B981", "#3B82F6", "#8B5CF6", "#EC4899", "#14B8A6", "#F97316", "#84CC16",
            "#06B6D4",
        ];
        Self {
            toolbar: ToolbarConfig::default(),
            selection: SelectionConfig::default(),
            palette: palette.iter().map(|c| c.to_string()).collect(),
            font_sizes: FontSizeToken::ALL
                .iter()
                .map(|token| FontSizeOption {
                    label: token.label().to_string(),
                    token: *token,
                })
                .collect(),
            title_fields: Vec::new(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

//! Core editor types: field identity, geometry, and toolbar state.
//!
//! These types are framework-agnostic and can be used with any platform host.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Stable identifier of one editable region within a page.
///
/// Rendered into the DOM as the `data-eid` attribute. The same id re-binds
/// persisted content to the same visual slot across save/load cycles.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(SmolStr);

impl FieldId {
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FieldId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for FieldId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The fixed kind a template declares for a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Image,
    Button,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::Text => "text",
            FieldKind::Image => "image",
            FieldKind::Button => "button",
        })
    }
}

/// Block-level text alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    /// CSS `text-align` value.
    pub fn as_css(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }

    /// Parse a CSS `text-align` value. `start`/`end` map onto left/right.
    pub fn from_css(value: &str) -> Option<Self> {
        match value.trim() {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            _ => None,
        }
    }
}

/// Axis-aligned rectangle in viewport coordinates (CSS pixels).
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    /// Zero-area rects are what browsers report for detached or hidden ranges.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 && self.height <= 0.0
    }
}

/// Measured size of a rendered element.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Computed toolbar position.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub top: f64,
    pub left: f64,
}

impl Position {
    pub fn new(top: f64, left: f64) -> Self {
        Self { top, left }
    }
}

/// Current viewport dimensions and scroll offsets.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ViewportMetrics {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl ViewportMetrics {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    pub fn with_scroll(mut self, scroll_x: f64, scroll_y: f64) -> Self {
        self.scroll_x = scroll_x;
        self.scroll_y = scroll_y;
        self
    }
}

/// Toolbar sub-panel that may be open on top of the main controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Subpanel {
    #[default]
    None,
    Color,
    FontSize,
    Link,
}

impl Subpanel {
    pub fn is_open(&self) -> bool {
        !matches!(self, Subpanel::None)
    }
}

/// Observable state of the floating toolbar.
///
/// `visible == false` always implies `open_subpanel == Subpanel::None`.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ToolbarState {
    pub visible: bool,
    /// Rect the toolbar was last positioned against.
    pub anchor_rect: Rect,
    pub target_field: Option<FieldId>,
    pub open_subpanel: Subpanel,
    pub position: Position,
}

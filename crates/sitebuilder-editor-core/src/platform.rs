//! Platform abstraction traits for editor operations.
//!
//! These traits define the interface between the editing core and a concrete
//! page host (the browser DOM, or the in-memory fake used by tests). The core
//! never reads ambient state: the current selection, layout boxes and the
//! native formatting commands all come through an injected host.

use std::fmt;

use crate::error::PlatformError;
use crate::field::FieldValue;
use crate::types::{FieldId, FieldKind, Rect, Size, ViewportMetrics};

/// What a node is, as far as the editing core is concerned.
///
/// Hosts derive this from dedicated markers (the `data-eid` attribute plus an
/// editable flag or role), not from tag names alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeRole {
    /// Container of a text field; the rich-text toolbar may target it.
    EditableText(FieldId),
    /// Image field element. Edited through the image path, never the toolbar.
    ImageField(FieldId),
    /// Button/anchor field element. Edited through the button path.
    ButtonField(FieldId),
    /// An image that is not a field.
    Image,
    /// A button or button-role control that is not a field.
    Button,
    /// Anything else, including inline links inside text.
    Other,
}

impl NodeRole {
    /// Whether a text selection at or under this node must not activate the toolbar.
    pub fn blocks_text_toolbar(&self) -> bool {
        matches!(
            self,
            NodeRole::ImageField(_) | NodeRole::ButtonField(_) | NodeRole::Image | NodeRole::Button
        )
    }

    pub fn field(&self) -> Option<(&FieldId, FieldKind)> {
        match self {
            NodeRole::EditableText(id) => Some((id, FieldKind::Text)),
            NodeRole::ImageField(id) => Some((id, FieldKind::Image)),
            NodeRole::ButtonField(id) => Some((id, FieldKind::Button)),
            _ => None,
        }
    }
}

/// A boundary point: a node plus an offset into it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomPoint<N> {
    pub node: N,
    pub offset: u32,
}

impl<N> DomPoint<N> {
    pub fn new(node: N, offset: u32) -> Self {
        Self { node, offset }
    }
}

/// Directed range between two boundary points (anchor to focus).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomRange<N> {
    pub anchor: DomPoint<N>,
    pub focus: DomPoint<N>,
}

impl<N: PartialEq> DomRange<N> {
    pub fn new(anchor: DomPoint<N>, focus: DomPoint<N>) -> Self {
        Self { anchor, focus }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// Read-only view of the live selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiveSelection<N> {
    pub anchor: Option<DomPoint<N>>,
    pub focus: Option<DomPoint<N>>,
    pub is_collapsed: bool,
    pub range_count: u32,
}

impl<N> LiveSelection<N> {
    /// Both ends null: the selection was cleared entirely.
    pub fn is_cleared(&self) -> bool {
        self.anchor.is_none() && self.focus.is_none()
    }
}

/// Node tree queries shared by every host capability.
pub trait PageDom {
    type Node: Clone + PartialEq + fmt::Debug;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    fn role(&self, node: &Self::Node) -> NodeRole;

    /// Whether the node is still attached to the page.
    fn is_connected(&self, node: &Self::Node) -> bool;

    /// Bounding box in viewport coordinates.
    fn bounding_rect(&self, node: &Self::Node) -> Option<Rect>;

    /// Element carrying the given field id.
    fn find_field(&self, id: &FieldId) -> Option<Self::Node>;

    fn focus(&self, node: &Self::Node) -> Result<(), PlatformError>;
}

/// Access to the ambient text selection.
pub trait SelectionProvider: PageDom {
    /// Current selection, or None if the selection API is unavailable.
    fn selection(&self) -> Option<LiveSelection<Self::Node>>;

    /// First range of the selection, if there is one.
    fn first_range(&self) -> Option<DomRange<Self::Node>>;

    /// Bounding box of the first range. Errors when there are zero ranges.
    fn range_rect(&self) -> Result<Rect, PlatformError>;

    /// Replace the live selection with `range`.
    fn select(&self, range: &DomRange<Self::Node>) -> Result<(), PlatformError>;
}

/// Viewport and toolbar measurements.
pub trait Viewport {
    fn metrics(&self) -> ViewportMetrics;

    /// Measured toolbar size, None before the toolbar has rendered.
    fn toolbar_size(&self) -> Option<Size>;
}

/// Native text-formatting commands, applied to the live selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NativeCommand<'a> {
    Bold,
    Italic,
    Underline,
    ForeColor(&'a str),
    /// Legacy 1..=7 size scale.
    FontSize(u8),
    CreateLink(&'a str),
    Unlink,
}

/// Inline style properties the dispatcher may assign directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StyleProperty {
    TextAlign,
    Color,
    FontSize,
}

impl StyleProperty {
    pub fn css_name(&self) -> &'static str {
        match self {
            StyleProperty::TextAlign => "text-align",
            StyleProperty::Color => "color",
            StyleProperty::FontSize => "font-size",
        }
    }
}

/// Direct DOM mutation primitives.
pub trait FormatSurface: PageDom {
    fn exec_command(&self, command: NativeCommand<'_>) -> Result<(), PlatformError>;

    /// Whether a toggle command is in effect over the current selection.
    fn query_command_state(&self, command: NativeCommand<'_>) -> bool;

    /// Set (or with None, remove) an inline style on `node`.
    fn set_style(
        &self,
        node: &Self::Node,
        property: StyleProperty,
        value: Option<&str>,
    ) -> Result<(), PlatformError>;

    fn computed_style(&self, node: &Self::Node, property: StyleProperty) -> Option<String>;
}

/// Field-level read/write used by reconciliation.
pub trait FieldSurface: PageDom {
    /// Read the rendered value of a field element as the given kind.
    fn read_field(&self, node: &Self::Node, kind: FieldKind) -> Option<FieldValue>;

    /// Render a value into a field element.
    fn render_field(&self, node: &Self::Node, value: &FieldValue) -> Result<(), PlatformError>;
}

/// Everything the toolbar controller needs from its host.
pub trait EditorHost: SelectionProvider + FormatSurface + FieldSurface + Viewport {}

impl<T> EditorHost for T where T: SelectionProvider + FormatSurface + FieldSurface + Viewport {}

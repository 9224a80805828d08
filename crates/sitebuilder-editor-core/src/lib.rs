//! sitebuilder-editor-core: in-place page editing logic without DOM dependencies.
//!
//! This crate provides:
//! - `FieldValue`/`ContentMap` - the content model bound to template fields
//! - `SelectionTracker` - debounced detection of selections inside text fields
//! - `ToolbarController` - floating toolbar state, positioning and commands
//! - `Formatter` - the swappable mutation strategy behind formatting commands
//! - `EditingSession` - save, generation and revert against external services
//! - Platform traits that a host (the browser, or a test fake) implements

pub mod actions;
pub mod config;
pub mod content;
pub mod editor;
pub mod error;
pub mod execute;
pub mod field;
pub mod format;
pub mod generate;
pub mod platform;
pub mod position;
pub mod reconcile;
pub mod services;
pub mod session;
pub mod snapshot;
pub mod toolbar;
pub mod tracker;
pub mod types;

#[cfg(test)]
mod test_support;

pub use actions::{Key, KeyCombo, KeybindingConfig, KeydownResult, Modifiers, ToolbarAction};
pub use config::{EditorConfig, FontSizeOption, PositionMode, SelectionConfig, ToolbarConfig};
pub use content::{ButtonData, ContentMap, ProjectData};
pub use editor::PageEditor;
pub use error::{ContentError, FormatError, GenerationError, PlatformError, SessionError, StoreError};
pub use execute::{ActiveStyles, Formatter, NativeFormatter, alignment_container};
pub use field::{FieldValue, TemplateField, TemplateFields};
pub use format::{FontSizeToken, FormatCommand, InlineStyle, normalize_link_url, parse_hex_color};
pub use generate::{GenerationRequest, parse_generated};
pub use platform::{
    DomPoint, DomRange, EditorHost, FieldSurface, FormatSurface, LiveSelection, NativeCommand, NodeRole, PageDom,
    SelectionProvider, StyleProperty, Viewport,
};
pub use position::compute_position;
pub use reconcile::FieldModel;
pub use services::{AuthProvider, ContentGenerator, ProjectStore, User, require_user};
pub use session::{BusyState, EditingSession, SaveRequest, UNTITLED_PROJECT};
pub use smol_str::SmolStr;
pub use snapshot::{RestoreOutcome, SelectionGuard, SelectionSnapshot};
pub use toolbar::{AnchorSource, CommandOutcome, ToolbarController};
pub use tracker::{ActiveSelection, SelectionEvent, SelectionTracker, SettleTicket, TargetClass, classify_target};
pub use types::{Alignment, FieldId, FieldKind, Position, Rect, Size, Subpanel, ToolbarState, ViewportMetrics};

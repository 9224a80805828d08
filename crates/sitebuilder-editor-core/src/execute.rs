//! Command execution against the live page.
//!
//! This module provides the [`Formatter`] seam and the default
//! [`NativeFormatter`], which mutates rendered markup in place through the
//! host's native formatting commands and inline styles. A structured-model
//! formatter can replace it without touching selection tracking or
//! positioning.

use crate::error::PlatformError;
use crate::format::{FormatCommand, InlineStyle};
use crate::platform::{FormatSurface, NativeCommand, StyleProperty};
use crate::types::FieldId;

/// Strategy that applies a validated command to a field.
pub trait Formatter {
    /// Apply `command`. `field` is the text field container the current
    /// selection belongs to; the selection has already been restored.
    fn apply<H>(&self, host: &H, field: &H::Node, command: &FormatCommand) -> Result<(), PlatformError>
    where
        H: FormatSurface + ?Sized;
}

/// Direct DOM mutation through native editing commands.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeFormatter;

impl Formatter for NativeFormatter {
    fn apply<H>(&self, host: &H, field: &H::Node, command: &FormatCommand) -> Result<(), PlatformError>
    where
        H: FormatSurface + ?Sized,
    {
        match command {
            FormatCommand::ToggleInline(style) => host.exec_command(style.native()),
            FormatCommand::SetTextColor(color) => host.exec_command(NativeCommand::ForeColor(color)),
            FormatCommand::SetFontSize(token) => host.exec_command(NativeCommand::FontSize(token.native_size())),
            FormatCommand::SetAlignment(alignment) => {
                let container = alignment_container(host, field).unwrap_or_else(|| field.clone());
                host.set_style(&container, StyleProperty::TextAlign, Some(alignment.as_css()))
            }
            FormatCommand::CreateLink(url) => host.exec_command(NativeCommand::CreateLink(url)),
            FormatCommand::RemoveLink => host.exec_command(NativeCommand::Unlink),
        }
    }
}

/// Container that receives block alignment for `node`.
///
/// The nearest ancestor-or-self carrying a field identifier. Wrappers without
/// an identifier are never aligned, so the persisted alignment always belongs
/// to exactly one field.
pub fn alignment_container<H>(host: &H, node: &H::Node) -> Option<H::Node>
where
    H: FormatSurface + ?Sized,
{
    field_owner(host, node).map(|(node, _)| node)
}

/// Nearest ancestor-or-self that is a field, with its id.
pub fn field_owner<H>(host: &H, node: &H::Node) -> Option<(H::Node, FieldId)>
where
    H: crate::platform::PageDom + ?Sized,
{
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if let Some((id, _)) = host.role(&n).field() {
            return Some((n.clone(), id.clone()));
        }
        current = host.parent(&n);
    }
    None
}

/// Inline styles in effect over the current selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActiveStyles {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl ActiveStyles {
    pub fn query<H: FormatSurface + ?Sized>(host: &H) -> Self {
        Self {
            bold: host.query_command_state(NativeCommand::Bold),
            italic: host.query_command_state(NativeCommand::Italic),
            underline: host.query_command_state(NativeCommand::Underline),
        }
    }

    pub fn is_active(&self, style: InlineStyle) -> bool {
        match style {
            InlineStyle::Bold => self.bold,
            InlineStyle::Italic => self.italic,
            InlineStyle::Underline => self.underline,
        }
    }
}

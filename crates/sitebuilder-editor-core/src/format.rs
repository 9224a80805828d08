//! Formatting commands and their argument validation.
//!
//! Commands arrive from toolbar controls with raw user input (a typed URL, a
//! palette color). [`FormatCommand::validated`] normalizes that input or
//! rejects it before anything touches the page.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::FormatError;
use crate::platform::NativeCommand;
use crate::types::{Alignment, Subpanel};

/// Inline styles with a native toggle command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InlineStyle {
    Bold,
    Italic,
    Underline,
}

impl InlineStyle {
    pub const ALL: [InlineStyle; 3] = [InlineStyle::Bold, InlineStyle::Italic, InlineStyle::Underline];

    pub fn native(&self) -> NativeCommand<'static> {
        match self {
            InlineStyle::Bold => NativeCommand::Bold,
            InlineStyle::Italic => NativeCommand::Italic,
            InlineStyle::Underline => NativeCommand::Underline,
        }
    }
}

/// Font size menu entries, mapped onto the legacy 1..=7 native scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSizeToken {
    Small,
    Normal,
    Large,
    Huge,
}

impl FontSizeToken {
    pub const ALL: [FontSizeToken; 4] = [
        FontSizeToken::Small,
        FontSizeToken::Normal,
        FontSizeToken::Large,
        FontSizeToken::Huge,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FontSizeToken::Small => "Small",
            FontSizeToken::Normal => "Normal",
            FontSizeToken::Large => "Large",
            FontSizeToken::Huge => "Huge",
        }
    }

    pub fn native_size(&self) -> u8 {
        match self {
            FontSizeToken::Small => 1,
            FontSizeToken::Normal => 3,
            FontSizeToken::Large => 5,
            FontSizeToken::Huge => 7,
        }
    }

    /// Nearest token for a native size value.
    pub fn from_native(size: u8) -> Self {
        match size {
            0..=2 => FontSizeToken::Small,
            3 | 4 => FontSizeToken::Normal,
            5 | 6 => FontSizeToken::Large,
            _ => FontSizeToken::Huge,
        }
    }
}

/// A formatting command issued from the toolbar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormatCommand {
    ToggleInline(InlineStyle),
    SetTextColor(String),
    SetFontSize(FontSizeToken),
    SetAlignment(Alignment),
    CreateLink(String),
    RemoveLink,
}

impl FormatCommand {
    /// Check and normalize user-supplied arguments.
    pub fn validated(self) -> Result<FormatCommand, FormatError> {
        match self {
            FormatCommand::SetTextColor(color) => Ok(FormatCommand::SetTextColor(parse_hex_color(&color)?)),
            FormatCommand::CreateLink(url) => Ok(FormatCommand::CreateLink(normalize_link_url(&url)?)),
            other => Ok(other),
        }
    }

    /// The sub-panel this command is issued from, if any.
    pub fn subpanel(&self) -> Subpanel {
        match self {
            FormatCommand::SetTextColor(_) => Subpanel::Color,
            FormatCommand::SetFontSize(_) => Subpanel::FontSize,
            FormatCommand::CreateLink(_) => Subpanel::Link,
            FormatCommand::ToggleInline(_) | FormatCommand::SetAlignment(_) | FormatCommand::RemoveLink => {
                Subpanel::None
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FormatCommand::ToggleInline(InlineStyle::Bold) => "bold",
            FormatCommand::ToggleInline(InlineStyle::Italic) => "italic",
            FormatCommand::ToggleInline(InlineStyle::Underline) => "underline",
            FormatCommand::SetTextColor(_) => "text_color",
            FormatCommand::SetFontSize(_) => "font_size",
            FormatCommand::SetAlignment(_) => "alignment",
            FormatCommand::CreateLink(_) => "create_link",
            FormatCommand::RemoveLink => "remove_link",
        }
    }
}

/// Accept `#rgb` or `#rrggbb`, returned lowercased.
pub fn parse_hex_color(input: &str) -> Result<String, FormatError> {
    let trimmed = input.trim();
    let valid = trimmed
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()));
    if valid {
        Ok(trimmed.to_ascii_lowercase())
    } else {
        Err(FormatError::InvalidColor(input.to_string()))
    }
}

const LINK_SCHEMES: [&str; 4] = ["http", "https", "mailto", "tel"];

/// Validate a link target typed by the user.
///
/// Absolute URLs must use a web, mail or phone scheme. Site-relative paths and
/// fragments pass through unchanged. A bare domain such as `example.com/about`
/// is given an `https://` prefix.
pub fn normalize_link_url(input: &str) -> Result<String, FormatError> {
    let trimmed = input.trim();
    let invalid = || FormatError::InvalidLinkUrl(input.to_string());

    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    if trimmed.starts_with('/') || trimmed.starts_with('#') {
        return Ok(trimmed.to_string());
    }

    match Url::parse(trimmed) {
        Ok(url) if LINK_SCHEMES.contains(&url.scheme()) => {
            if matches!(url.scheme(), "http" | "https") && url.host_str().is_none_or(str::is_empty) {
                return Err(invalid());
            }
            Ok(trimmed.to_string())
        }
        Ok(_) => Err(invalid()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let prefixed = format!("https://{trimmed}");
            match Url::parse(&prefixed) {
                Ok(url) if url.host_str().is_some_and(|host| host.contains('.') && !host.starts_with('.')) => {
                    Ok(prefixed)
                }
                _ => Err(invalid()),
            }
        }
        Err(_) => Err(invalid()),
    }
}

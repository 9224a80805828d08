//! Toolbar actions and keyboard bindings.
//!
//! Platform layers convert native key events into [`KeyCombo`]s; the
//! [`KeybindingConfig`] maps those to [`ToolbarAction`]s.

use std::collections::HashMap;

use smol_str::SmolStr;

use crate::format::{FormatCommand, InlineStyle};
use crate::types::Subpanel;

/// Something the user can ask the toolbar to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolbarAction {
    /// Run a formatting command.
    Format(FormatCommand),
    /// Open a sub-panel, or close it if it is already open.
    TogglePanel(Subpanel),
    /// Close the open sub-panel, or hide the toolbar if none is open.
    Dismiss,
}

/// Key values for keyboard input.
///
/// Only the keys the toolbar reacts to get their own variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key, lowercased.
    Character(SmolStr),
    Escape,
    Enter,
    Tab,
    Unidentified,
}

impl Key {
    pub fn character(s: impl Into<SmolStr>) -> Self {
        let s: SmolStr = s.into();
        if s.chars().any(|c| c.is_uppercase()) {
            Self::Character(SmolStr::new(s.to_lowercase()))
        } else {
            Self::Character(s)
        }
    }

    /// Parse a DOM `KeyboardEvent.key` value.
    pub fn parse(key: &str) -> Self {
        match key {
            "Escape" | "Esc" => Key::Escape,
            "Enter" => Key::Enter,
            "Tab" => Key::Tab,
            s if s.chars().count() == 1 => Key::character(s),
            _ => Key::Unidentified,
        }
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const META: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: true,
    };

    /// Get the primary modifier for the platform (Cmd on Mac, Ctrl elsewhere).
    pub fn primary(is_mac: bool) -> Self {
        if is_mac { Self::META } else { Self::CTRL }
    }
}

/// A key combination for triggering an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn primary(key: Key, is_mac: bool) -> Self {
        Self {
            key,
            modifiers: Modifiers::primary(is_mac),
        }
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, PartialEq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not a keybinding, let platform handle it.
    NotHandled,
}

/// Keyboard shortcuts available while the toolbar is visible.
#[derive(Debug, Clone)]
pub struct KeybindingConfig {
    bindings: HashMap<KeyCombo, ToolbarAction>,
}

impl KeybindingConfig {
    pub fn default_for_platform(is_mac: bool) -> Self {
        let mut bindings = HashMap::new();
        let primary = |c: &str| KeyCombo::primary(Key::character(c), is_mac);

        bindings.insert(primary("b"), ToolbarAction::Format(FormatCommand::ToggleInline(InlineStyle::Bold)));
        bindings.insert(primary("i"), ToolbarAction::Format(FormatCommand::ToggleInline(InlineStyle::Italic)));
        bindings.insert(
            primary("u"),
            ToolbarAction::Format(FormatCommand::ToggleInline(InlineStyle::Underline)),
        );
        bindings.insert(primary("k"), ToolbarAction::TogglePanel(Subpanel::Link));
        bindings.insert(KeyCombo::new(Key::Escape), ToolbarAction::Dismiss);

        Self { bindings }
    }

    pub fn lookup(&self, combo: &KeyCombo) -> Option<&ToolbarAction> {
        self.bindings.get(combo)
    }

    pub fn bind(&mut self, combo: KeyCombo, action: ToolbarAction) {
        self.bindings.insert(combo, action);
    }
}

impl Default for KeybindingConfig {
    fn default() -> Self {
        Self::default_for_platform(false)
    }
}

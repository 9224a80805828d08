//! Browser event wiring for the page editor.
//!
//! `EditorHandle` owns the `PageEditor` and the DOM listeners that feed it:
//! `selectionchange` (debounced through a timer per settle ticket),
//! focus and blur on the page root, outside presses, scroll/resize and
//! keyboard shortcuts. Events the editor causes itself while it is already
//! handling one (focusing a field during restore, for instance) are dropped.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo_timers::callback::Timeout;
use sitebuilder_editor_core::{
    ActiveStyles, CommandOutcome, ContentError, FieldId, FontSizeToken, FormatCommand, FormatError, Key, KeyCombo,
    KeybindingConfig, KeydownResult, Modifiers, PageEditor, StyleProperty, Subpanel, ToolbarAction, ToolbarState,
};
use wasm_bindgen::JsCast;

use crate::color::{css_color_to_hex, font_size_token};
use crate::dom::BrowserPage;

pub type BrowserEditor = PageEditor<BrowserPage>;

type StateCallback = Box<dyn Fn(&ToolbarState)>;

pub(crate) struct Shared {
    pub(crate) editor: RefCell<BrowserEditor>,
    settle: RefCell<Option<Timeout>>,
    on_change: RefCell<Option<StateCallback>>,
}

impl Shared {
    /// Run `f` against the editor unless it is already borrowed, then repaint.
    pub(crate) fn with_editor<R>(&self, f: impl FnOnce(&mut BrowserEditor) -> R) -> Option<R> {
        let (result, state) = {
            let Ok(mut editor) = self.editor.try_borrow_mut() else {
                tracing::trace!(target: "sitebuilder::toolbar", "re-entrant event dropped");
                return None;
            };
            let result = f(&mut editor);
            let mode = editor.toolbar().config().toolbar.mode;
            editor.host().paint_toolbar(editor.state(), mode);
            (result, editor.state().clone())
        };
        if let Ok(callback) = self.on_change.try_borrow() {
            if let Some(callback) = callback.as_ref() {
                callback(&state);
            }
        }
        Some(result)
    }
}

/// Whether the browser reports an Apple platform (Cmd instead of Ctrl).
pub fn is_mac() -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    let navigator = window.navigator();
    let platform = navigator.platform().unwrap_or_default();
    let agent = navigator.user_agent().unwrap_or_default();
    platform.starts_with("Mac") || platform.starts_with("iP") || agent.contains("Mac OS X")
}

/// Build a key combination from a DOM keyboard event.
pub fn key_combo(event: &web_sys::KeyboardEvent) -> KeyCombo {
    KeyCombo::with_modifiers(
        Key::parse(&event.key()),
        Modifiers {
            ctrl: event.ctrl_key(),
            alt: event.alt_key(),
            shift: event.shift_key(),
            meta: event.meta_key(),
        },
    )
}

fn event_node(event: &web_sys::Event) -> Option<web_sys::Node> {
    event.target()?.dyn_into::<web_sys::Node>().ok()
}

/// Initial values for the color and font-size panels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelValues {
    pub color: Option<String>,
    pub font_size: Option<FontSizeToken>,
}

/// A page editor attached to the live page.
///
/// Dropping the handle removes every listener and cancels a pending settle.
pub struct EditorHandle {
    shared: Rc<Shared>,
    listeners: Vec<EventListener>,
}

impl EditorHandle {
    pub fn attach(mut editor: BrowserEditor) -> Self {
        editor
            .toolbar_mut()
            .set_keybindings(KeybindingConfig::default_for_platform(is_mac()));
        let rendered = editor.render();
        tracing::debug!(target: "sitebuilder::sync", rendered, "initial render");

        let shared = Rc::new(Shared {
            editor: RefCell::new(editor),
            settle: RefCell::new(None),
            on_change: RefCell::new(None),
        });
        let mut handle = Self {
            shared,
            listeners: Vec::new(),
        };
        handle.listen();
        handle
    }

    /// Called with the toolbar state after every handled event.
    pub fn on_state_change(&self, callback: impl Fn(&ToolbarState) + 'static) {
        *self.shared.on_change.borrow_mut() = Some(Box::new(callback));
    }

    fn listen(&mut self) {
        let Some(page) = self.shared.editor.try_borrow().ok().map(|editor| {
            let host = editor.host();
            (host.document.clone(), host.window.clone(), host.root().clone(), host.toolbar().cloned())
        }) else {
            return;
        };
        let (document, window, root, toolbar) = page;

        let shared = self.shared.clone();
        self.listeners.push(EventListener::new(&document, "selectionchange", move |_| {
            on_selection_change(&shared);
        }));

        let shared = self.shared.clone();
        self.listeners.push(EventListener::new(&root, "focusin", move |event| {
            if let Some(node) = event_node(event) {
                shared.with_editor(|editor| editor.on_focus(&node));
            }
        }));

        let shared = self.shared.clone();
        self.listeners.push(EventListener::new(&root, "focusout", move |event| {
            if let Some(node) = event_node(event) {
                shared.with_editor(|editor| editor.on_blur(&node));
            }
        }));

        let shared = self.shared.clone();
        self.listeners.push(EventListener::new(&document, "mousedown", move |event| {
            let node = event_node(event);
            shared.with_editor(|editor| {
                let inside = node.as_ref().is_some_and(|node| editor.host().in_toolbar(node));
                editor.on_pointer_down(node.as_ref(), inside);
            });
        }));

        // Presses on toolbar controls must not move the page selection.
        if let Some(toolbar) = toolbar {
            self.listeners.push(EventListener::new_with_options(
                &toolbar,
                "mousedown",
                EventListenerOptions::enable_prevent_default(),
                |event| event.prevent_default(),
            ));
        }

        for kind in ["scroll", "resize"] {
            let shared = self.shared.clone();
            self.listeners.push(EventListener::new_with_options(
                &window,
                kind,
                EventListenerOptions {
                    phase: EventListenerPhase::Capture,
                    passive: true,
                },
                move |_| {
                    shared.with_editor(|editor| editor.on_viewport_change());
                },
            ));
        }

        let shared = self.shared.clone();
        self.listeners.push(EventListener::new_with_options(
            &document,
            "keydown",
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                let Some(event) = event.dyn_ref::<web_sys::KeyboardEvent>() else {
                    return;
                };
                let combo = key_combo(event);
                if shared.with_editor(|editor| editor.on_keydown(&combo)) == Some(KeydownResult::Handled) {
                    event.prevent_default();
                }
            },
        ));
    }

    pub(crate) fn shared(&self) -> &Rc<Shared> {
        &self.shared
    }

    pub fn state(&self) -> Option<ToolbarState> {
        self.shared.editor.try_borrow().ok().map(|editor| editor.state().clone())
    }

    /// Run a toolbar control. Errors are validation messages for the panel.
    pub fn apply(&self, command: FormatCommand) -> Result<CommandOutcome, FormatError> {
        self.shared
            .with_editor(|editor| editor.apply(command))
            .unwrap_or(Ok(CommandOutcome::Skipped))
    }

    pub fn dispatch(&self, action: ToolbarAction) -> Result<CommandOutcome, FormatError> {
        self.shared
            .with_editor(|editor| editor.dispatch(action))
            .unwrap_or(Ok(CommandOutcome::Skipped))
    }

    pub fn open_subpanel(&self, panel: Subpanel) {
        self.shared.with_editor(|editor| editor.open_subpanel(panel));
    }

    pub fn close_subpanel(&self) {
        self.shared.with_editor(|editor| editor.close_subpanel());
    }

    pub fn hide_toolbar(&self) {
        self.shared.with_editor(|editor| editor.hide_toolbar());
    }

    pub fn active_styles(&self) -> ActiveStyles {
        self.shared
            .editor
            .try_borrow()
            .map(|editor| editor.active_styles())
            .unwrap_or_default()
    }

    pub fn panel_values(&self) -> PanelValues {
        let Ok(editor) = self.shared.editor.try_borrow() else {
            return PanelValues {
                color: None,
                font_size: None,
            };
        };
        let toolbar = editor.toolbar();
        PanelValues {
            color: toolbar
                .current_style(editor.host(), StyleProperty::Color)
                .and_then(|value| css_color_to_hex(&value)),
            font_size: toolbar
                .current_style(editor.host(), StyleProperty::FontSize)
                .and_then(|value| font_size_token(&value)),
        }
    }

    pub fn update_image(&self, id: &FieldId, src: &str, link_url: Option<String>) -> Result<bool, ContentError> {
        self.shared
            .with_editor(|editor| editor.update_image(id, src, link_url))
            .unwrap_or(Ok(false))
    }

    pub fn update_button(&self, id: &FieldId, text: &str, url: &str) -> Result<bool, ContentError> {
        self.shared
            .with_editor(|editor| editor.update_button(id, text, url))
            .unwrap_or(Ok(false))
    }

    /// Re-render every field not under edit.
    pub fn render(&self) -> usize {
        self.shared.with_editor(|editor| editor.render()).unwrap_or(0)
    }
}

impl Drop for EditorHandle {
    fn drop(&mut self) {
        self.listeners.clear();
        self.shared.settle.borrow_mut().take();
        if let Ok(mut editor) = self.shared.editor.try_borrow_mut() {
            editor.teardown();
        }
    }
}

fn on_selection_change(shared: &Rc<Shared>) {
    let Some(ticket) = shared.with_editor(|editor| editor.on_selection_change()) else {
        return;
    };
    let Some(ticket) = ticket else {
        shared.settle.borrow_mut().take();
        return;
    };
    let delay = u32::try_from(ticket.delay.as_millis()).unwrap_or(u32::MAX);
    let weak = Rc::downgrade(shared);
    let timeout = Timeout::new(delay, move || {
        if let Some(shared) = weak.upgrade() {
            shared.with_editor(|editor| editor.settle(ticket));
        }
    });
    // Replacing the timer drops (and cancels) the previous one.
    *shared.settle.borrow_mut() = Some(timeout);
}

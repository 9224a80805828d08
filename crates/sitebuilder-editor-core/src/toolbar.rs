//! Floating toolbar controller.
//!
//! Owns the toolbar state machine and sequences everything around a command:
//! selection restore, mutation, reconciliation, re-save, panel bookkeeping
//! and repositioning. All DOM access goes through the injected host, so the
//! controller runs unchanged against the browser or the test fake.

use std::fmt;

use crate::actions::{KeyCombo, KeybindingConfig, KeydownResult, ToolbarAction};
use crate::config::EditorConfig;
use crate::error::FormatError;
use crate::execute::{ActiveStyles, Formatter, NativeFormatter, field_owner};
use crate::format::FormatCommand;
use crate::platform::{EditorHost, NodeRole, StyleProperty};
use crate::position::compute_position;
use crate::reconcile::FieldModel;
use crate::snapshot::{RestoreOutcome, SelectionGuard, SelectionSnapshot};
use crate::tracker::{ChangeOutcome, SelectionEvent, SelectionTracker, SettleTicket, TargetClass, classify_target};
use crate::types::{FieldId, Rect, Subpanel, ToolbarState};

/// What the toolbar is anchored to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AnchorSource {
    /// The live selection range.
    #[default]
    Selection,
    /// The whole field element (click-to-activate).
    Element,
}

/// Result of a command that passed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    /// Nothing to apply to, or the page refused the mutation. Logged only.
    Skipped,
}

pub struct ToolbarController<N, F = NativeFormatter> {
    config: EditorConfig,
    keybindings: KeybindingConfig,
    tracker: SelectionTracker<N>,
    guard: SelectionGuard<N>,
    state: ToolbarState,
    target: Option<N>,
    /// Target's rect when the toolbar was last placed.
    target_rect: Option<Rect>,
    anchor: AnchorSource,
    formatter: F,
}

impl<N: fmt::Debug, F> fmt::Debug for ToolbarController<N, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolbarController")
            .field("state", &self.state)
            .field("target", &self.target)
            .field("anchor", &self.anchor)
            .finish_non_exhaustive()
    }
}

impl<N> ToolbarController<N, NativeFormatter>
where
    N: Clone + PartialEq + fmt::Debug,
{
    pub fn new(config: EditorConfig) -> Self {
        Self::with_formatter(config, NativeFormatter)
    }
}

impl<N, F> ToolbarController<N, F>
where
    N: Clone + PartialEq + fmt::Debug,
    F: Formatter,
{
    pub fn with_formatter(config: EditorConfig, formatter: F) -> Self {
        Self {
            tracker: SelectionTracker::new(config.selection.debounce()),
            keybindings: KeybindingConfig::default(),
            guard: SelectionGuard::new(),
            state: ToolbarState::default(),
            target: None,
            target_rect: None,
            anchor: AnchorSource::Selection,
            config,
            formatter,
        }
    }

    pub fn set_keybindings(&mut self, keybindings: KeybindingConfig) {
        self.keybindings = keybindings;
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn state(&self) -> &ToolbarState {
        &self.state
    }

    pub fn target(&self) -> Option<&N> {
        self.target.as_ref()
    }

    /// Field currently being edited in place, if any.
    pub fn editing_field(&self) -> Option<&FieldId> {
        self.state.target_field.as_ref()
    }

    pub fn anchor(&self) -> AnchorSource {
        self.anchor
    }

    pub fn snapshot(&self) -> Option<&SelectionSnapshot<N>> {
        self.guard.snapshot()
    }

    /// Feed a raw selection-change notification.
    ///
    /// Returns a ticket when the caller should arm the settle timer.
    pub fn on_selection_change<H>(&mut self, host: &H, model: &mut FieldModel<'_>) -> Option<SettleTicket>
    where
        H: EditorHost<Node = N> + ?Sized,
    {
        match self.tracker.on_selection_change(host) {
            ChangeOutcome::Schedule(ticket) => Some(ticket),
            ChangeOutcome::Immediate(SelectionEvent::Inactive) => {
                self.on_inactive(host, model);
                None
            }
            ChangeOutcome::Immediate(SelectionEvent::Active(active)) => {
                self.show(host, model, active.element, active.field, active.rect, AnchorSource::Selection);
                None
            }
            ChangeOutcome::Ignored => None,
        }
    }

    /// Handle a fired settle timer.
    pub fn settle<H>(&mut self, host: &H, model: &mut FieldModel<'_>, ticket: SettleTicket)
    where
        H: EditorHost<Node = N> + ?Sized,
    {
        match self.tracker.settle(host, ticket) {
            Some(SelectionEvent::Active(active)) => {
                self.show(host, model, active.element, active.field, active.rect, AnchorSource::Selection)
            }
            Some(SelectionEvent::Inactive) => self.on_inactive(host, model),
            None => {}
        }
    }

    fn on_inactive<H>(&mut self, host: &H, model: &mut FieldModel<'_>)
    where
        H: EditorHost<Node = N> + ?Sized,
    {
        if !self.state.visible {
            return;
        }
        if self.state.open_subpanel.is_open() {
            // Focus moved into the panel; the snapshot carries the selection.
            tracing::trace!(target: "sitebuilder::toolbar", panel = ?self.state.open_subpanel, "keeping toolbar for open panel");
            return;
        }
        if self.anchor == AnchorSource::Element {
            if let Some(field) = self.state.target_field.clone() {
                model.commit(host, &field);
            }
            return;
        }
        self.hide(host, model);
    }

    fn show<H>(
        &mut self,
        host: &H,
        model: &mut FieldModel<'_>,
        element: N,
        field: FieldId,
        rect: Rect,
        anchor: AnchorSource,
    ) where
        H: EditorHost<Node = N> + ?Sized,
    {
        let previous = self.state.target_field.take();
        if let Some(previous) = previous.as_ref().filter(|previous| **previous != field) {
            model.commit(host, previous);
            self.state.open_subpanel = Subpanel::None;
            self.guard.clear();
        }
        if !self.state.visible {
            tracing::debug!(target: "sitebuilder::toolbar", %field, ?anchor, "toolbar shown");
        }

        self.target = Some(element);
        self.anchor = anchor;
        self.state.visible = true;
        self.state.target_field = Some(field);
        self.guard.save(host);
        self.place(host, rect);
    }

    fn place<H>(&mut self, host: &H, rect: Rect)
    where
        H: EditorHost<Node = N> + ?Sized,
    {
        let position = compute_position(rect, host.toolbar_size(), host.metrics(), &self.config.toolbar);
        self.target_rect = self.target.as_ref().and_then(|target| host.bounding_rect(target));
        self.state.anchor_rect = rect;
        self.state.position = position;
    }

    /// Show the toolbar for a focused or clicked text field with no range.
    pub fn activate_element<H>(&mut self, host: &H, model: &mut FieldModel<'_>, node: &N) -> bool
    where
        H: EditorHost<Node = N> + ?Sized,
    {
        let TargetClass::Text { element, field } = classify_target(host, node) else {
            return false;
        };
        if self.state.visible && self.target.as_ref() == Some(&element) {
            return true;
        }
        let Some(rect) = host.bounding_rect(&element) else {
            return false;
        };
        self.show(host, model, element, field, rect, AnchorSource::Element);
        true
    }

    /// A field lost focus: write its rendered content back.
    pub fn on_blur<H>(&mut self, host: &H, model: &mut FieldModel<'_>, node: &N)
    where
        H: EditorHost<Node = N> + ?Sized,
    {
        if let Some((element, id)) = field_owner(host, node) {
            if matches!(host.role(&element), NodeRole::EditableText(_)) {
                model.commit(host, &id);
            }
        }
    }

    /// Pointer pressed somewhere on the page.
    ///
    /// Presses outside both the toolbar and the target field dismiss it.
    pub fn on_pointer_down<H>(&mut self, host: &H, model: &mut FieldModel<'_>, node: Option<&N>, inside_toolbar: bool)
    where
        H: EditorHost<Node = N> + ?Sized,
    {
        if !self.state.visible || inside_toolbar {
            return;
        }
        if let (Some(node), Some(target)) = (node, self.target.as_ref()) {
            if is_within(host, node, target) {
                return;
            }
        }
        tracing::debug!(target: "sitebuilder::toolbar", "outside press dismissed toolbar");
        self.hide(host, model);
    }

    /// Scroll or resize: recompute from the live rect.
    pub fn on_viewport_change<H>(&mut self, host: &H) -> bool
    where
        H: EditorHost<Node = N> + ?Sized,
    {
        self.reposition(host)
    }

    /// Recompute the position. With no ranges at all the toolbar stays put.
    ///
    /// When the live selection has left the target (focus in a sub-panel
    /// input), the last anchor rect follows the target element instead.
    pub fn reposition<H>(&mut self, host: &H) -> bool
    where
        H: EditorHost<Node = N> + ?Sized,
    {
        if !self.state.visible {
            return false;
        }
        let rect = match self.anchor {
            AnchorSource::Selection => match SelectionTracker::evaluate(host) {
                Some(active) if self.target.as_ref() == Some(&active.element) => Some(active.rect),
                _ => self.follow_target(host),
            },
            AnchorSource::Element => self.target.as_ref().and_then(|target| host.bounding_rect(target)),
        };
        match rect {
            Some(rect) => {
                self.place(host, rect);
                true
            }
            None => {
                tracing::trace!(target: "sitebuilder::toolbar", "no live rect, keeping position");
                false
            }
        }
    }

    fn follow_target<H>(&self, host: &H) -> Option<Rect>
    where
        H: EditorHost<Node = N> + ?Sized,
    {
        if host.selection().is_none_or(|live| live.range_count == 0) {
            return None;
        }
        let current = host.bounding_rect(self.target.as_ref()?)?;
        let Some(last) = self.target_rect else {
            return Some(current);
        };
        let anchor = self.state.anchor_rect;
        Some(Rect::new(
            anchor.top + current.top - last.top,
            anchor.left + current.left - last.left,
            anchor.width,
            anchor.height,
        ))
    }

    /// Open `panel`, closing any other. Opening the open panel closes it.
    pub fn open_subpanel<H>(&mut self, host: &H, panel: Subpanel)
    where
        H: EditorHost<Node = N> + ?Sized,
    {
        if !self.state.visible {
            return;
        }
        self.guard.save(host);
        self.state.open_subpanel = if self.state.open_subpanel == panel {
            Subpanel::None
        } else {
            panel
        };
        tracing::trace!(target: "sitebuilder::toolbar", panel = ?self.state.open_subpanel, "sub-panel toggled");
    }

    pub fn close_subpanel(&mut self) {
        self.state.open_subpanel = Subpanel::None;
    }

    /// Validate and run a formatting command against the target field.
    ///
    /// Only argument validation fails; page-level problems are absorbed and
    /// reported as [`CommandOutcome::Skipped`].
    pub fn apply<H>(
        &mut self,
        host: &H,
        model: &mut FieldModel<'_>,
        command: FormatCommand,
    ) -> Result<CommandOutcome, FormatError>
    where
        H: EditorHost<Node = N> + ?Sized,
    {
        let command = command.validated().inspect_err(|err| {
            tracing::debug!(target: "sitebuilder::format", error = %err, "command rejected");
        })?;

        let (Some(element), Some(field)) = (self.target.clone(), self.state.target_field.clone()) else {
            tracing::trace!(target: "sitebuilder::format", command = command.name(), "no field context");
            return Ok(CommandOutcome::Skipped);
        };

        if self.guard.restore(host) == RestoreOutcome::Stale {
            return Ok(CommandOutcome::Skipped);
        }
        if let Err(err) = self.formatter.apply(host, &element, &command) {
            tracing::warn!(target: "sitebuilder::format", command = command.name(), error = %err, "command failed");
            return Ok(CommandOutcome::Skipped);
        }

        model.commit(host, &field);
        self.guard.save(host);

        let panel = command.subpanel();
        if panel.is_open() && self.state.open_subpanel == panel {
            self.state.open_subpanel = Subpanel::None;
        }
        self.reposition(host);

        tracing::debug!(target: "sitebuilder::format", command = command.name(), %field, "command applied");
        Ok(CommandOutcome::Applied)
    }

    /// Run a toolbar action from a control or shortcut.
    pub fn dispatch<H>(
        &mut self,
        host: &H,
        model: &mut FieldModel<'_>,
        action: ToolbarAction,
    ) -> Result<CommandOutcome, FormatError>
    where
        H: EditorHost<Node = N> + ?Sized,
    {
        match action {
            ToolbarAction::Format(command) => self.apply(host, model, command),
            ToolbarAction::TogglePanel(panel) => {
                self.open_subpanel(host, panel);
                Ok(CommandOutcome::Applied)
            }
            ToolbarAction::Dismiss => {
                if self.state.open_subpanel.is_open() {
                    self.close_subpanel();
                } else {
                    self.hide(host, model);
                }
                Ok(CommandOutcome::Applied)
            }
        }
    }

    /// Handle a keydown while the toolbar is visible.
    pub fn on_keydown<H>(&mut self, host: &H, model: &mut FieldModel<'_>, combo: &KeyCombo) -> KeydownResult
    where
        H: EditorHost<Node = N> + ?Sized,
    {
        if !self.state.visible {
            return KeydownResult::NotHandled;
        }
        let Some(action) = self.keybindings.lookup(combo).cloned() else {
            return KeydownResult::NotHandled;
        };
        if let Err(err) = self.dispatch(host, model, action) {
            tracing::debug!(target: "sitebuilder::toolbar", error = %err, "shortcut rejected");
        }
        KeydownResult::Handled
    }

    /// Inline styles active over the live selection.
    pub fn active_styles<H>(&self, host: &H) -> ActiveStyles
    where
        H: EditorHost<Node = N> + ?Sized,
    {
        if !self.state.visible {
            return ActiveStyles::default();
        }
        ActiveStyles::query(host)
    }

    /// Computed style of the target field, for panel initial values.
    pub fn current_style<H>(&self, host: &H, property: StyleProperty) -> Option<String>
    where
        H: EditorHost<Node = N> + ?Sized,
    {
        self.target.as_ref().and_then(|target| host.computed_style(target, property))
    }

    /// Commit the target field and hide.
    pub fn hide<H>(&mut self, host: &H, model: &mut FieldModel<'_>)
    where
        H: EditorHost<Node = N> + ?Sized,
    {
        if let Some(field) = self.state.target_field.clone() {
            model.commit(host, &field);
        }
        if self.state.visible {
            tracing::debug!(target: "sitebuilder::toolbar", "toolbar hidden");
        }
        self.reset();
    }

    /// Drop all toolbar state without touching the page.
    pub fn teardown(&mut self) {
        tracing::debug!(target: "sitebuilder::toolbar", "toolbar torn down");
        self.reset();
    }

    fn reset(&mut self) {
        self.state = ToolbarState::default();
        self.target = None;
        self.target_rect = None;
        self.anchor = AnchorSource::Selection;
        self.guard.clear();
        self.tracker.reset();
    }
}

fn is_within<H: EditorHost + ?Sized>(host: &H, node: &H::Node, ancestor: &H::Node) -> bool {
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if &n == ancestor {
            return true;
        }
        current = host.parent(&n);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Key;
    use crate::content::ContentMap;
    use crate::field::{FieldValue, TemplateField, TemplateFields};
    use crate::format::{FontSizeToken, InlineStyle};
    use crate::platform::FormatSurface;
    use crate::test_support::{FakePage, NodeId};
    use crate::types::{Alignment, Size, ViewportMetrics};

    struct Fixture {
        page: FakePage,
        fields: TemplateFields,
        content: ContentMap,
        toolbar: ToolbarController<NodeId>,
        title: NodeId,
        body: NodeId,
    }

    impl Fixture {
        fn new() -> Self {
            let page = FakePage::new();
            let title = page.add_text_field(None, "hero_title", "Hello world");
            let body = page.add_text_field(None, "body", "Some body copy");
            let fields = TemplateFields::new()
                .with(TemplateField::text("hero_title", "Hello world"))
                .and_then(|t| t.with(TemplateField::text("body", "Some body copy")))
                .unwrap();
            Self {
                page,
                fields,
                content: ContentMap::new(),
                toolbar: ToolbarController::new(EditorConfig::default()),
                title,
                body,
            }
        }

        /// Select and let the debounce settle.
        fn select(&mut self, node: NodeId, start: u32, end: u32) {
            self.page.select(node, start, end);
            let mut model = FieldModel::new(&self.fields, &mut self.content);
            if let Some(ticket) = self.toolbar.on_selection_change(&self.page, &mut model) {
                self.toolbar.settle(&self.page, &mut model, ticket);
            }
        }

        fn apply(&mut self, command: FormatCommand) -> Result<CommandOutcome, FormatError> {
            let mut model = FieldModel::new(&self.fields, &mut self.content);
            self.toolbar.apply(&self.page, &mut model, command)
        }

        fn open(&mut self, panel: Subpanel) {
            self.toolbar.open_subpanel(&self.page, panel);
        }

        fn stored_html(&self, id: &str) -> Option<String> {
            self.content.get(&id.into()).and_then(FieldValue::as_html).map(str::to_string)
        }
    }

    #[test]
    fn test_settled_selection_shows_toolbar_above() {
        let mut fx = Fixture::new();
        fx.page.set_toolbar_size(Some(Size::new(200.0, 40.0)));
        fx.page.set_rect(fx.title, Rect::new(300.0, 100.0, 88.0, 24.0));
        fx.select(fx.title, 0, 5);

        let state = fx.toolbar.state();
        assert!(state.visible);
        assert_eq!(state.target_field.as_ref().map(FieldId::as_str), Some("hero_title"));
        // Range "Hello" is 40px wide at left=100, so centered at 120.
        assert_eq!(state.position.top, 250.0);
        assert_eq!(state.position.left, 20.0);
        assert!(fx.toolbar.snapshot().is_some());
    }

    #[test]
    fn test_bold_twice_restores_original() {
        let mut fx = Fixture::new();
        fx.select(fx.title, 0, 5);
        let before = fx.page.html(fx.title);

        let bold = FormatCommand::ToggleInline(InlineStyle::Bold);
        assert_eq!(fx.apply(bold.clone()), Ok(CommandOutcome::Applied));
        assert_eq!(fx.page.html(fx.title), "<b>Hello</b> world");
        assert_eq!(fx.apply(bold), Ok(CommandOutcome::Applied));
        assert_eq!(fx.page.html(fx.title), before);
    }

    #[test]
    fn test_color_applies_to_saved_range_after_panel_focus() {
        let mut fx = Fixture::new();
        let panel_input = fx.page.add_plain(None, "");
        fx.select(fx.title, 6, 11);
        fx.open(Subpanel::Color);

        // Clicking into the panel moves the live selection away.
        fx.page.select(panel_input, 0, 0);
        let mut model = FieldModel::new(&fx.fields, &mut fx.content);
        if let Some(ticket) = fx.toolbar.on_selection_change(&fx.page, &mut model) {
            fx.toolbar.settle(&fx.page, &mut model, ticket);
        }
        assert!(fx.toolbar.state().visible);

        assert_eq!(fx.apply(FormatCommand::SetTextColor("#EF4444".into())), Ok(CommandOutcome::Applied));
        assert_eq!(fx.page.html(fx.title), "Hello <font color=\"#ef4444\">world</font>");
        assert_eq!(fx.toolbar.state().open_subpanel, Subpanel::None);
        assert_eq!(
            fx.stored_html("hero_title").as_deref(),
            Some("Hello <font color=\"#ef4444\">world</font>")
        );
    }

    #[test]
    fn test_commands_chain_on_resaved_selection() {
        let mut fx = Fixture::new();
        fx.select(fx.title, 0, 5);
        fx.apply(FormatCommand::ToggleInline(InlineStyle::Italic)).unwrap();
        fx.page.clear_selection();
        fx.apply(FormatCommand::SetFontSize(FontSizeToken::Large)).unwrap();
        assert_eq!(fx.page.html(fx.title), "<font size=\"5\"><i>Hello</i></font> world");
    }

    #[test]
    fn test_invalid_link_keeps_panel_open() {
        let mut fx = Fixture::new();
        fx.select(fx.title, 0, 11);
        fx.open(Subpanel::Link);

        let result = fx.apply(FormatCommand::CreateLink("not-a-url".into()));
        assert!(matches!(result, Err(FormatError::InvalidLinkUrl(_))));
        assert_eq!(fx.toolbar.state().open_subpanel, Subpanel::Link);
        assert!(fx.page.exec_log().is_empty());

        fx.apply(FormatCommand::CreateLink("example.com".into())).unwrap();
        assert_eq!(fx.page.html(fx.title), "<a href=\"https://example.com\">Hello world</a>");
        assert_eq!(fx.toolbar.state().open_subpanel, Subpanel::None);
    }

    #[test]
    fn test_remove_link_unwraps_and_commits() {
        let mut fx = Fixture::new();
        fx.select(fx.title, 0, 11);
        fx.apply(FormatCommand::CreateLink("https://example.com".into())).unwrap();
        assert_eq!(
            fx.stored_html("hero_title").as_deref(),
            Some("<a href=\"https://example.com\">Hello world</a>")
        );

        assert_eq!(fx.apply(FormatCommand::RemoveLink), Ok(CommandOutcome::Applied));
        assert_eq!(fx.page.html(fx.title), "Hello world");
        assert_eq!(fx.stored_html("hero_title").as_deref(), Some("Hello world"));
        assert_eq!(fx.page.exec_log().last().map(String::as_str), Some("Unlink"));
    }

    #[test]
    fn test_alignment_is_stored_with_field() {
        let mut fx = Fixture::new();
        fx.select(fx.body, 0, 4);
        fx.apply(FormatCommand::SetAlignment(Alignment::Right)).unwrap();
        assert_eq!(
            fx.content.get(&"body".into()),
            Some(&FieldValue::Text {
                html: "Some body copy".into(),
                align: Some(Alignment::Right),
            })
        );
    }

    #[test]
    fn test_command_without_target_is_silent() {
        let mut fx = Fixture::new();
        assert_eq!(
            fx.apply(FormatCommand::ToggleInline(InlineStyle::Bold)),
            Ok(CommandOutcome::Skipped)
        );
        assert!(fx.page.exec_log().is_empty());
    }

    #[test]
    fn test_subpanels_are_exclusive_and_toggle() {
        let mut fx = Fixture::new();
        fx.open(Subpanel::Color);
        assert_eq!(fx.toolbar.state().open_subpanel, Subpanel::None, "hidden toolbar ignores panels");

        fx.select(fx.title, 0, 5);
        fx.open(Subpanel::Color);
        fx.open(Subpanel::FontSize);
        assert_eq!(fx.toolbar.state().open_subpanel, Subpanel::FontSize);
        fx.open(Subpanel::FontSize);
        assert_eq!(fx.toolbar.state().open_subpanel, Subpanel::None);
    }

    #[test]
    fn test_clearing_selection_hides_and_commits() {
        let mut fx = Fixture::new();
        fx.select(fx.title, 0, 5);
        fx.apply(FormatCommand::ToggleInline(InlineStyle::Underline)).unwrap();
        fx.content = ContentMap::new();

        fx.page.clear_selection();
        let mut model = FieldModel::new(&fx.fields, &mut fx.content);
        assert_eq!(fx.toolbar.on_selection_change(&fx.page, &mut model), None);
        assert!(!fx.toolbar.state().visible);
        assert_eq!(fx.toolbar.state().open_subpanel, Subpanel::None);
        assert!(fx.toolbar.snapshot().is_none());
        assert_eq!(fx.stored_html("hero_title").as_deref(), Some("<u>Hello</u> world"));
    }

    #[test]
    fn test_switching_fields_commits_previous() {
        let mut fx = Fixture::new();
        fx.select(fx.title, 0, 5);
        fx.page.select(fx.title, 0, 5);
        fx.page.exec_command(crate::platform::NativeCommand::Bold).unwrap();
        fx.select(fx.body, 0, 4);

        assert_eq!(fx.stored_html("hero_title").as_deref(), Some("<b>Hello</b> world"));
        assert_eq!(fx.toolbar.editing_field().map(FieldId::as_str), Some("body"));
    }

    #[test]
    fn test_outside_press_dismisses() {
        let mut fx = Fixture::new();
        let elsewhere = fx.page.add_plain(None, "footer");
        let inner = fx.page.add_plain(Some(fx.title), "span");
        fx.select(fx.title, 0, 5);

        let mut model = FieldModel::new(&fx.fields, &mut fx.content);
        fx.toolbar.on_pointer_down(&fx.page, &mut model, Some(&inner), false);
        assert!(fx.toolbar.state().visible);
        fx.toolbar.on_pointer_down(&fx.page, &mut model, Some(&elsewhere), true);
        assert!(fx.toolbar.state().visible);
        fx.toolbar.on_pointer_down(&fx.page, &mut model, Some(&elsewhere), false);
        assert!(!fx.toolbar.state().visible);
    }

    #[test]
    fn test_click_activation_anchors_to_element() {
        let mut fx = Fixture::new();
        fx.page.set_rect(fx.body, Rect::new(400.0, 300.0, 400.0, 60.0));
        let mut model = FieldModel::new(&fx.fields, &mut fx.content);
        assert!(fx.toolbar.activate_element(&fx.page, &mut model, &fx.body));
        assert_eq!(fx.toolbar.anchor(), AnchorSource::Element);
        assert_eq!(fx.toolbar.state().anchor_rect, Rect::new(400.0, 300.0, 400.0, 60.0));

        // Alignment needs no range.
        fx.apply(FormatCommand::SetAlignment(Alignment::Center)).unwrap();
        assert_eq!(
            fx.page.style(fx.body, StyleProperty::TextAlign).as_deref(),
            Some("center")
        );

        let image = fx.page.add_image(None);
        let mut model = FieldModel::new(&fx.fields, &mut fx.content);
        assert!(!fx.toolbar.activate_element(&fx.page, &mut model, &image));
    }

    #[test]
    fn test_scroll_repositions_from_live_rect() {
        let mut fx = Fixture::new();
        fx.page.set_rect(fx.title, Rect::new(300.0, 100.0, 88.0, 24.0));
        fx.select(fx.title, 0, 5);
        let first = fx.toolbar.state().position;

        fx.page.set_rect(fx.title, Rect::new(20.0, 100.0, 88.0, 24.0));
        assert!(fx.toolbar.on_viewport_change(&fx.page));
        let moved = fx.toolbar.state().position;
        assert!(moved.top > 20.0 + 24.0, "flipped below: {moved:?}");
        assert_ne!(first, moved);

        // No live range: position is kept.
        fx.page.clear_selection();
        assert!(!fx.toolbar.on_viewport_change(&fx.page));
        assert_eq!(fx.toolbar.state().position, moved);
    }

    #[test]
    fn test_scroll_follows_target_while_panel_has_focus() {
        let mut fx = Fixture::new();
        let panel_input = fx.page.add_plain(None, "");
        fx.page.set_rect(fx.title, Rect::new(300.0, 100.0, 88.0, 24.0));
        fx.select(fx.title, 0, 5);
        fx.open(Subpanel::Link);
        let before = fx.toolbar.state().position;

        fx.page.select(panel_input, 0, 0);
        fx.page.set_rect(fx.title, Rect::new(100.0, 100.0, 88.0, 24.0));
        assert!(fx.toolbar.on_viewport_change(&fx.page));

        let after = fx.toolbar.state().position;
        assert_eq!(after.top, before.top - 200.0);
        assert_eq!(after.left, before.left);
        assert_eq!(fx.toolbar.state().anchor_rect, Rect::new(100.0, 100.0, 40.0, 24.0));
        assert_eq!(fx.toolbar.state().open_subpanel, Subpanel::Link);
    }

    #[test]
    fn test_narrow_viewport_clamps() {
        let mut fx = Fixture::new();
        fx.page.set_viewport(ViewportMetrics::new(300.0, 600.0));
        fx.page.set_rect(fx.title, Rect::new(300.0, 250.0, 88.0, 24.0));
        fx.select(fx.title, 6, 11);
        assert_eq!(fx.toolbar.state().position.left, 10.0);
    }

    #[test]
    fn test_shortcuts() {
        let mut fx = Fixture::new();
        fx.select(fx.title, 0, 5);
        let mut model = FieldModel::new(&fx.fields, &mut fx.content);

        let ctrl_b = KeyCombo::primary(Key::character("b"), false);
        assert_eq!(fx.toolbar.on_keydown(&fx.page, &mut model, &ctrl_b), KeydownResult::Handled);
        assert_eq!(fx.page.html(fx.title), "<b>Hello</b> world");

        let ctrl_k = KeyCombo::primary(Key::character("k"), false);
        fx.toolbar.on_keydown(&fx.page, &mut model, &ctrl_k);
        assert_eq!(fx.toolbar.state().open_subpanel, Subpanel::Link);

        let esc = KeyCombo::new(Key::Escape);
        fx.toolbar.on_keydown(&fx.page, &mut model, &esc);
        assert_eq!(fx.toolbar.state().open_subpanel, Subpanel::None);
        assert!(fx.toolbar.state().visible);
        fx.toolbar.on_keydown(&fx.page, &mut model, &esc);
        assert!(!fx.toolbar.state().visible);

        let plain = KeyCombo::new(Key::character("a"));
        assert_eq!(fx.toolbar.on_keydown(&fx.page, &mut model, &plain), KeydownResult::NotHandled);
    }

    #[test]
    fn test_stale_snapshot_skips_command() {
        let mut fx = Fixture::new();
        fx.select(fx.title, 0, 5);
        fx.page.detach(fx.title);
        assert_eq!(
            fx.apply(FormatCommand::ToggleInline(InlineStyle::Bold)),
            Ok(CommandOutcome::Skipped)
        );
        assert!(fx.toolbar.snapshot().is_none());
    }
}

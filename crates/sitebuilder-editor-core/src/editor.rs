//! Page editor: one host, one session, one toolbar.
//!
//! `PageEditor` is what platform layers drive from their event handlers. It
//! lends the session's content to the toolbar for each event and keeps the
//! page rendering consistent around save and generation.

use crate::actions::{KeyCombo, KeydownResult, ToolbarAction};
use crate::config::EditorConfig;
use crate::error::{ContentError, FormatError, GenerationError, SessionError, StoreError};
use crate::execute::{ActiveStyles, Formatter, NativeFormatter};
use crate::format::FormatCommand;
use crate::generate::GenerationRequest;
use crate::platform::EditorHost;
use crate::services::{ContentGenerator, ProjectStore};
use crate::session::{EditingSession, SaveRequest};
use crate::toolbar::{CommandOutcome, ToolbarController};
use crate::tracker::SettleTicket;
use crate::types::{FieldId, Subpanel, ToolbarState};

pub struct PageEditor<H: EditorHost, F = NativeFormatter> {
    host: H,
    session: EditingSession,
    toolbar: ToolbarController<H::Node, F>,
}

impl<H: EditorHost> PageEditor<H> {
    pub fn new(host: H, session: EditingSession, config: EditorConfig) -> Self {
        Self::with_formatter(host, session, config, NativeFormatter)
    }
}

impl<H: EditorHost, F: Formatter> PageEditor<H, F> {
    pub fn with_formatter(host: H, session: EditingSession, config: EditorConfig, formatter: F) -> Self {
        Self {
            host,
            session,
            toolbar: ToolbarController::with_formatter(config, formatter),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn session(&self) -> &EditingSession {
        &self.session
    }

    pub fn toolbar(&self) -> &ToolbarController<H::Node, F> {
        &self.toolbar
    }

    pub fn toolbar_mut(&mut self) -> &mut ToolbarController<H::Node, F> {
        &mut self.toolbar
    }

    pub fn state(&self) -> &ToolbarState {
        self.toolbar.state()
    }

    /// Render every field that is not being edited.
    pub fn render(&mut self) -> usize {
        let editing = self.toolbar.editing_field().cloned();
        self.session.model().render_all(&self.host, editing.as_ref())
    }

    pub fn on_selection_change(&mut self) -> Option<SettleTicket> {
        self.toolbar.on_selection_change(&self.host, &mut self.session.model())
    }

    pub fn settle(&mut self, ticket: SettleTicket) {
        self.toolbar.settle(&self.host, &mut self.session.model(), ticket);
    }

    pub fn on_focus(&mut self, node: &H::Node) -> bool {
        self.toolbar.activate_element(&self.host, &mut self.session.model(), node)
    }

    pub fn on_blur(&mut self, node: &H::Node) {
        self.toolbar.on_blur(&self.host, &mut self.session.model(), node);
    }

    pub fn on_pointer_down(&mut self, node: Option<&H::Node>, inside_toolbar: bool) {
        self.toolbar
            .on_pointer_down(&self.host, &mut self.session.model(), node, inside_toolbar);
    }

    pub fn on_viewport_change(&mut self) -> bool {
        self.toolbar.on_viewport_change(&self.host)
    }

    pub fn on_keydown(&mut self, combo: &KeyCombo) -> KeydownResult {
        self.toolbar.on_keydown(&self.host, &mut self.session.model(), combo)
    }

    pub fn open_subpanel(&mut self, panel: Subpanel) {
        self.toolbar.open_subpanel(&self.host, panel);
    }

    pub fn close_subpanel(&mut self) {
        self.toolbar.close_subpanel();
    }

    pub fn apply(&mut self, command: FormatCommand) -> Result<CommandOutcome, FormatError> {
        self.toolbar.apply(&self.host, &mut self.session.model(), command)
    }

    pub fn dispatch(&mut self, action: ToolbarAction) -> Result<CommandOutcome, FormatError> {
        self.toolbar.dispatch(&self.host, &mut self.session.model(), action)
    }

    pub fn active_styles(&self) -> ActiveStyles {
        self.toolbar.active_styles(&self.host)
    }

    pub fn hide_toolbar(&mut self) {
        self.toolbar.hide(&self.host, &mut self.session.model());
    }

    pub fn update_image(&mut self, id: &FieldId, src: &str, link_url: Option<String>) -> Result<bool, ContentError> {
        self.session.model().update_image(&self.host, id, src, link_url)
    }

    pub fn update_button(&mut self, id: &FieldId, text: &str, url: &str) -> Result<bool, ContentError> {
        self.session.model().update_button(&self.host, id, text, url)
    }

    /// Commit the field under edit, then enter the saving state.
    pub fn begin_save(&mut self) -> Result<SaveRequest, SessionError> {
        if let Some(field) = self.toolbar.editing_field().cloned() {
            self.session.model().commit(&self.host, &field);
        }
        self.session.begin_save()
    }

    pub fn finish_save(&mut self, result: Result<(), StoreError>) -> Result<(), SessionError> {
        self.session.finish_save(result)
    }

    pub async fn save<S>(&mut self, store: &S) -> Result<(), SessionError>
    where
        S: ProjectStore + ?Sized,
    {
        let request = self.begin_save()?;
        let result = store.save(&request.page_id, &request.name, &request.data).await;
        self.finish_save(result)
    }

    /// Hide the toolbar (committing its field) and enter the generating state.
    pub fn begin_generation(&mut self) -> Result<(), SessionError> {
        self.session.begin_generation()?;
        self.toolbar.hide(&self.host, &mut self.session.model());
        Ok(())
    }

    /// Merge generated copy and re-render on success.
    pub fn finish_generation(&mut self, result: Result<String, GenerationError>) -> Result<usize, SessionError> {
        let merged = self.session.finish_generation(result)?;
        self.render();
        Ok(merged)
    }

    pub async fn generate<G>(&mut self, generator: &G, request: &GenerationRequest) -> Result<usize, SessionError>
    where
        G: ContentGenerator + ?Sized,
    {
        self.begin_generation()?;
        let result = generator.generate(request).await;
        self.finish_generation(result)
    }

    pub fn revert_generation(&mut self) -> Result<(), SessionError> {
        if !self.session.has_backup() {
            return Err(SessionError::NothingToRevert);
        }
        self.toolbar.hide(&self.host, &mut self.session.model());
        self.session.revert_generation()?;
        self.render();
        Ok(())
    }

    /// Drop toolbar state when the page goes away.
    pub fn teardown(&mut self) {
        self.toolbar.teardown();
    }
}

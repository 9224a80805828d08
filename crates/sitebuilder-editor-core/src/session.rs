//! Page-editing session: content ownership, save and generation.
//!
//! Collaborator calls are split into `begin_*`/`finish_*` halves so a host
//! holding the session behind a `RefCell` never keeps it borrowed across an
//! await. The `save`/`generate` conveniences chain both halves for callers
//! that own the session outright.

use web_time::Instant;

use crate::config::EditorConfig;
use crate::content::{ContentMap, ProjectData};
use crate::error::{GenerationError, SessionError, StoreError};
use crate::field::{FieldValue, TemplateFields};
use crate::generate::{GenerationRequest, parse_generated};
use crate::reconcile::FieldModel;
use crate::services::{ContentGenerator, ProjectStore};
use crate::types::FieldId;

/// Name used when no headline field has text.
pub const UNTITLED_PROJECT: &str = "Untitled Website";

/// Outstanding collaborator call, if any.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BusyState {
    #[default]
    Idle,
    Saving,
    Generating,
}

impl BusyState {
    fn label(&self) -> &'static str {
        match self {
            BusyState::Idle => "idle",
            BusyState::Saving => "save",
            BusyState::Generating => "generation",
        }
    }
}

/// Everything a save call needs, detached from the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveRequest {
    pub page_id: String,
    pub name: String,
    pub data: ProjectData,
}

#[derive(Debug)]
pub struct EditingSession {
    page_id: String,
    fields: TemplateFields,
    content: ContentMap,
    backup: Option<ContentMap>,
    busy: BusyState,
    title_fields: Vec<FieldId>,
    last_saved: Option<Instant>,
}

impl EditingSession {
    /// Start a session with empty content.
    pub fn new(page_id: impl Into<String>, fields: TemplateFields, config: &EditorConfig) -> Self {
        Self {
            page_id: page_id.into(),
            fields,
            content: ContentMap::new(),
            backup: None,
            busy: BusyState::Idle,
            title_fields: config.title_fields.iter().map(|f| FieldId::from(f.as_str())).collect(),
            last_saved: None,
        }
    }

    /// Start a session from previously stored content.
    ///
    /// Stored values whose kind disagrees with the template are dropped so the
    /// template default renders instead.
    pub fn with_content(mut self, mut content: ContentMap) -> Self {
        for (id, expected) in content.mismatched(&self.fields) {
            tracing::warn!(target: "sitebuilder::session", %id, %expected, "dropping stored value of wrong kind");
            content.remove(&id);
        }
        self.content = content;
        self
    }

    /// Load a stored project, or start fresh when none exists.
    pub async fn load<S>(
        store: &S,
        page_id: impl Into<String>,
        fields: TemplateFields,
        config: &EditorConfig,
    ) -> Result<Self, SessionError>
    where
        S: ProjectStore + ?Sized,
    {
        let session = Self::new(page_id, fields, config);
        match store.load(&session.page_id).await {
            Ok(data) => {
                let content = ContentMap::from_project_data(data);
                tracing::debug!(target: "sitebuilder::session", page = %session.page_id, fields = content.len(), "project loaded");
                Ok(session.with_content(content))
            }
            Err(StoreError::NotFound(_)) => {
                tracing::debug!(target: "sitebuilder::session", page = %session.page_id, "no stored project, starting fresh");
                Ok(session)
            }
            Err(err) => Err(SessionError::Load(err)),
        }
    }

    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    pub fn fields(&self) -> &TemplateFields {
        &self.fields
    }

    pub fn content(&self) -> &ContentMap {
        &self.content
    }

    /// Mutable view handed to the toolbar and reconciliation.
    pub fn model(&mut self) -> FieldModel<'_> {
        FieldModel::new(&self.fields, &mut self.content)
    }

    pub fn busy(&self) -> BusyState {
        self.busy
    }

    pub fn has_backup(&self) -> bool {
        self.backup.is_some()
    }

    pub fn last_saved(&self) -> Option<Instant> {
        self.last_saved
    }

    /// Save name: the first configured headline field with text, tags stripped.
    pub fn project_name(&self) -> String {
        self.title_fields
            .iter()
            .filter_map(|id| self.content.get(id).or_else(|| self.fields.get(id).map(|f| &f.default)))
            .filter_map(FieldValue::as_html)
            .map(strip_tags)
            .find(|name| !name.is_empty())
            .unwrap_or_else(|| UNTITLED_PROJECT.to_string())
    }

    fn claim(&mut self, next: BusyState) -> Result<(), SessionError> {
        if self.busy != BusyState::Idle {
            return Err(SessionError::Busy(self.busy.label()));
        }
        self.busy = next;
        Ok(())
    }

    /// Enter the saving state and snapshot what should be written.
    pub fn begin_save(&mut self) -> Result<SaveRequest, SessionError> {
        self.claim(BusyState::Saving)?;
        let request = SaveRequest {
            page_id: self.page_id.clone(),
            name: self.project_name(),
            data: self.content.to_project_data(),
        };
        tracing::debug!(target: "sitebuilder::session", page = %request.page_id, name = %request.name, "saving project");
        Ok(request)
    }

    /// Leave the saving state. Content is untouched either way.
    pub fn finish_save(&mut self, result: Result<(), StoreError>) -> Result<(), SessionError> {
        self.busy = BusyState::Idle;
        match result {
            Ok(()) => {
                self.last_saved = Some(Instant::now());
                tracing::info!(target: "sitebuilder::session", page = %self.page_id, "project saved");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(target: "sitebuilder::session", page = %self.page_id, error = %err, "save failed");
                Err(SessionError::Save(err))
            }
        }
    }

    pub async fn save<S>(&mut self, store: &S) -> Result<(), SessionError>
    where
        S: ProjectStore + ?Sized,
    {
        let request = self.begin_save()?;
        let result = store.save(&request.page_id, &request.name, &request.data).await;
        self.finish_save(result)
    }

    pub fn begin_generation(&mut self) -> Result<(), SessionError> {
        self.claim(BusyState::Generating)?;
        tracing::debug!(target: "sitebuilder::session", page = %self.page_id, "generating content");
        Ok(())
    }

    /// Merge generated copy after backing up the current content.
    ///
    /// On any failure the content is left exactly as it was. Returns the
    /// number of fields written.
    pub fn finish_generation(&mut self, result: Result<String, GenerationError>) -> Result<usize, SessionError> {
        self.busy = BusyState::Idle;
        let generated = result
            .and_then(|raw| parse_generated(&raw, &self.fields))
            .map_err(|err| {
                tracing::warn!(target: "sitebuilder::session", error = %err, "generation failed");
                SessionError::Generation(err)
            })?;

        let backup = self.content.clone();
        let mut merged = 0;
        for (id, text) in generated {
            let align = match self.content.get(&id) {
                Some(FieldValue::Text { align, .. }) => *align,
                _ => None,
            };
            match self.content.set(id.clone(), FieldValue::Text { html: text, align }) {
                Ok(_) => merged += 1,
                Err(err) => {
                    tracing::debug!(target: "sitebuilder::session", %id, error = %err, "generated value not merged");
                }
            }
        }
        self.backup = Some(backup);
        tracing::info!(target: "sitebuilder::session", merged, "generated content merged");
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

    /// Restore the content from before the last generation.
    pub fn revert_generation(&mut self) -> Result<(), SessionError> {
        let backup = self.backup.take().ok_or(SessionError::NothingToRevert)?;
        self.content = backup;
        tracing::info!(target: "sitebuilder::session", "generation reverted");
        Ok(())
    }
}

/// Drop markup tags, decode the common entities and collapse whitespace.
fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    // `&amp;` last so `&amp;lt;` stays literal.
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

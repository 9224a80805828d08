//! Reconciliation between rendered fields and the content map.
//!
//! Page to map: after a command, on blur, and when a selection settles to
//! inactive, the field's rendered content is read back and stored. Map to
//! page: fields that are not being edited render their stored value or the
//! template default.

use crate::content::ContentMap;
use crate::error::ContentError;
use crate::field::{FieldValue, TemplateFields};
use crate::platform::FieldSurface;
use crate::types::{FieldId, FieldKind};

/// Mutable view of a session's field declarations and content.
#[derive(Debug)]
pub struct FieldModel<'a> {
    pub fields: &'a TemplateFields,
    pub content: &'a mut ContentMap,
}

impl<'a> FieldModel<'a> {
    pub fn new(fields: &'a TemplateFields, content: &'a mut ContentMap) -> Self {
        Self { fields, content }
    }

    /// Read a field's rendered value back into the map.
    ///
    /// Returns true if the stored value changed. Undeclared or missing fields
    /// are skipped.
    pub fn commit<H>(&mut self, host: &H, id: &FieldId) -> bool
    where
        H: FieldSurface + ?Sized,
    {
        let Some(kind) = self.fields.kind_of(id) else {
            tracing::debug!(target: "sitebuilder::sync", %id, "skipping commit of undeclared field");
            return false;
        };
        let Some(element) = host.find_field(id) else {
            tracing::debug!(target: "sitebuilder::sync", %id, "field element not on page");
            return false;
        };
        let Some(value) = host.read_field(&element, kind) else {
            return false;
        };

        match self.content.set(id.clone(), value) {
            Ok(changed) => {
                if changed {
                    tracing::debug!(target: "sitebuilder::sync", %id, %kind, "field committed");
                }
                changed
            }
            Err(err) => {
                tracing::warn!(target: "sitebuilder::sync", %id, error = %err, "field commit rejected");
                false
            }
        }
    }

    /// Render one declared field unless it is the field under edit.
    pub fn render<H>(&self, host: &H, id: &FieldId, editing: Option<&FieldId>) -> bool
    where
        H: FieldSurface + ?Sized,
    {
        if editing == Some(id) {
            return false;
        }
        let Some(field) = self.fields.get(id) else {
            return false;
        };
        let Some(element) = host.find_field(id) else {
            return false;
        };
        let value = self.content.value_or_default(field);
        match host.render_field(&element, value) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(target: "sitebuilder::sync", %id, error = %err, "field render failed");
                false
            }
        }
    }

    /// Render every declared field except the one under edit.
    pub fn render_all<H>(&self, host: &H, editing: Option<&FieldId>) -> usize
    where
        H: FieldSurface + ?Sized,
    {
        let rendered = self
            .fields
            .iter()
            .filter(|field| self.render(host, &field.id, editing))
            .count();
        tracing::debug!(target: "sitebuilder::sync", rendered, "page rendered from content");
        rendered
    }

    /// Store a new image source and optional link, then render it.
    pub fn update_image<H>(
        &mut self,
        host: &H,
        id: &FieldId,
        src: impl Into<String>,
        link_url: Option<String>,
    ) -> Result<bool, ContentError>
    where
        H: FieldSurface + ?Sized,
    {
        let value = FieldValue::Image {
            src: src.into(),
            link_url: link_url.filter(|url| !url.trim().is_empty()),
        };
        self.store_and_render(host, id, value)
    }

    /// Store a new button label and destination, then render it.
    pub fn update_button<H>(
        &mut self,
        host: &H,
        id: &FieldId,
        text: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<bool, ContentError>
    where
        H: FieldSurface + ?Sized,
    {
        self.store_and_render(host, id, FieldValue::button(text, url))
    }

    fn store_and_render<H>(&mut self, host: &H, id: &FieldId, value: FieldValue) -> Result<bool, ContentError>
    where
        H: FieldSurface + ?Sized,
    {
        let kind: FieldKind = value.kind();
        let changed = self.content.set_declared(self.fields, id.clone(), value)?;
        tracing::debug!(target: "sitebuilder::sync", %id, %kind, changed, "field updated");
        self.render(host, id, None);
        Ok(changed)
    }
}

//! Editable field primitive: values and template declarations.

use serde::{Deserialize, Serialize};

use crate::error::ContentError;
use crate::types::{Alignment, FieldId, FieldKind};

/// Value bound to one editable field.
///
/// Exactly one variant per field; which one is fixed by the template that
/// declares the field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldValue {
    /// Rendered as the inner markup of the field element.
    Text {
        html: String,
        /// Block alignment set on the field container, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        align: Option<Alignment>,
    },
    /// Rendered as an image source with an optional wrapping link.
    Image {
        src: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        link_url: Option<String>,
    },
    /// Rendered as an anchor/button label and destination.
    Button { text: String, url: String },
}

impl FieldValue {
    pub fn text(html: impl Into<String>) -> Self {
        FieldValue::Text {
            html: html.into(),
            align: None,
        }
    }

    pub fn image(src: impl Into<String>) -> Self {
        FieldValue::Image {
            src: src.into(),
            link_url: None,
        }
    }

    pub fn button(text: impl Into<String>, url: impl Into<String>) -> Self {
        FieldValue::Button {
            text: text.into(),
            url: url.into(),
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text { .. } => FieldKind::Text,
            FieldValue::Image { .. } => FieldKind::Image,
            FieldValue::Button { .. } => FieldKind::Button,
        }
    }

    /// Markup of a text value.
    pub fn as_html(&self) -> Option<&str> {
        match self {
            FieldValue::Text { html, .. } => Some(html),
            _ => None,
        }
    }
}

/// One field as declared by a template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateField {
    pub id: FieldId,
    pub kind: FieldKind,
    pub default: FieldValue,
}

impl TemplateField {
    pub fn text(id: impl Into<FieldId>, default: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: FieldKind::Text,
            default: FieldValue::text(default),
        }
    }

    pub fn image(id: impl Into<FieldId>, src: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: FieldKind::Image,
            default: FieldValue::image(src),
        }
    }

    pub fn button(id: impl Into<FieldId>, text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: FieldKind::Button,
            default: FieldValue::button(text, url),
        }
    }
}

/// The set of fields a template exposes to the editing core.
///
/// Declaration order is kept; it is the order fields are rendered and
/// scanned for a project name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TemplateFields {
    fields: Vec<TemplateField>,
}

impl TemplateFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field. Ids must be unique and the default must match the kind.
    pub fn declare(&mut self, field: TemplateField) -> Result<(), ContentError> {
        if field.default.kind() != field.kind {
            return Err(ContentError::KindMismatch {
                id: field.id,
                expected: field.kind,
                found: field.default.kind(),
            });
        }
        if self.get(&field.id).is_some() {
            return Err(ContentError::DuplicateField(field.id));
        }
        self.fields.push(field);
        Ok(())
    }

    /// Builder-style declaration for static template tables.
    pub fn with(mut self, field: TemplateField) -> Result<Self, ContentError> {
        self.declare(field)?;
        Ok(self)
    }

    pub fn get(&self, id: &FieldId) -> Option<&TemplateField> {
        self.fields.iter().find(|f| &f.id == id)
    }

    pub fn kind_of(&self, id: &FieldId) -> Option<FieldKind> {
        self.get(id).map(|f| f.kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TemplateField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

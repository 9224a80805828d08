//! Content model store: the session's map from field id to value.
//!
//! The map is the single source of truth for persistence. It is mutated only
//! by the reconciliation layer and the session, and read in full at save time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ContentError;
use crate::field::{FieldValue, TemplateField, TemplateFields};
use crate::types::{Alignment, FieldId, FieldKind};

/// Mapping from field id to its current value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentMap {
    values: BTreeMap<FieldId, FieldValue>,
}

impl ContentMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &FieldId) -> Option<&FieldValue> {
        self.values.get(id)
    }

    pub fn contains(&self, id: &FieldId) -> bool {
        self.values.contains_key(id)
    }

    /// Store a value, refusing to switch an existing field to another kind.
    ///
    /// Returns true if the stored value changed.
    pub fn set(&mut self, id: FieldId, value: FieldValue) -> Result<bool, ContentError> {
        if let Some(existing) = self.values.get(&id) {
            if existing.kind() != value.kind() {
                return Err(ContentError::KindMismatch {
                    id,
                    expected: existing.kind(),
                    found: value.kind(),
                });
            }
            if existing == &value {
                return Ok(false);
            }
        }
        self.values.insert(id, value);
        Ok(true)
    }

    /// Store a value after checking it against the template declaration.
    pub fn set_declared(
        &mut self,
        fields: &TemplateFields,
        id: FieldId,
        value: FieldValue,
    ) -> Result<bool, ContentError> {
        match fields.kind_of(&id) {
            Some(kind) if kind != value.kind() => Err(ContentError::KindMismatch {
                id,
                expected: kind,
                found: value.kind(),
            }),
            Some(_) => self.set(id, value),
            None => Err(ContentError::UnknownField(id)),
        }
    }

    pub fn remove(&mut self, id: &FieldId) -> Option<FieldValue> {
        self.values.remove(id)
    }

    /// Value to render for a declared field: stored value or template default.
    pub fn value_or_default<'a>(&'a self, field: &'a TemplateField) -> &'a FieldValue {
        match self.values.get(&field.id) {
            Some(value) if value.kind() == field.kind => value,
            _ => &field.default,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldId, &FieldValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flatten into the stored project document shape.
    pub fn to_project_data(&self) -> ProjectData {
        let mut data = ProjectData::default();
        for (id, value) in &self.values {
            let key = id.as_str().to_string();
            match value {
                FieldValue::Text { html, align } => {
                    data.texts.insert(key.clone(), html.clone());
                    if let Some(align) = align {
                        data.alignments.insert(key, *align);
                    }
                }
                FieldValue::Image { src, link_url } => {
                    data.images.insert(key.clone(), src.clone());
                    if let Some(link) = link_url {
                        data.image_links.insert(key, link.clone());
                    }
                }
                FieldValue::Button { text, url } => {
                    data.buttons.insert(
                        key,
                        ButtonData {
                            href: url.clone(),
                            text: text.clone(),
                        },
                    );
                }
            }
        }
        data
    }

    /// Rebuild from a stored project document.
    ///
    /// An id present in more than one section is malformed; the first kind
    /// seen (texts, then images, then buttons) wins and the rest is dropped.
    pub fn from_project_data(data: ProjectData) -> Self {
        let ProjectData {
            texts,
            images,
            buttons,
            image_links,
            alignments,
        } = data;
        let mut map = ContentMap::new();
        for (id, html) in texts {
            let align = alignments.get(&id).copied();
            map.values
                .insert(FieldId::from(id), FieldValue::Text { html, align });
        }
        for (id, src) in images {
            let link_url = image_links.get(&id).cloned();
            let id = FieldId::from(id);
            if map.contains(&id) {
                tracing::warn!(target: "sitebuilder::sync", %id, "image id collides with text field, dropping");
                continue;
            }
            map.values.insert(id, FieldValue::Image { src, link_url });
        }
        for (id, button) in buttons {
            let id = FieldId::from(id);
            if map.contains(&id) {
                tracing::warn!(target: "sitebuilder::sync", %id, "button id collides with another field, dropping");
                continue;
            }
            map.values.insert(id, FieldValue::button(button.text, button.href));
        }
        map
    }

    /// Ids whose stored kind disagrees with the template.
    pub fn mismatched(&self, fields: &TemplateFields) -> Vec<(FieldId, FieldKind)> {
        self.values
            .iter()
            .filter_map(|(id, value)| match fields.kind_of(id) {
                Some(kind) if kind != value.kind() => Some((id.clone(), kind)),
                _ => None,
            })
            .collect()
    }
}

impl FromIterator<(FieldId, FieldValue)> for ContentMap {
    fn from_iter<I: IntoIterator<Item = (FieldId, FieldValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Stored button payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonData {
    pub href: String,
    pub text: String,
}

/// Project document as exchanged with the persistence service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectData {
    #[serde(default)]
    pub texts: BTreeMap<String, String>,
    #[serde(default)]
    pub images: BTreeMap<String, String>,
    #[serde(default)]
    pub buttons: BTreeMap<String, ButtonData>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub image_links: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub alignments: BTreeMap<String, Alignment>,
}

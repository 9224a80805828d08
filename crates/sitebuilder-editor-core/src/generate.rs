//! Ingestion of generated page copy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::field::TemplateFields;
use crate::types::{FieldId, FieldKind};

/// What the generation collaborator is asked for.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Template the copy is written for.
    pub template: String,
    /// The user's description of their site.
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

/// Parse raw model output into field id to text pairs.
///
/// Accepts bare JSON or JSON wrapped in Markdown code fences, and falls back
/// to the outermost `{...}` span when the model adds prose around it. Keys the
/// template declares as image or button fields are dropped, as are non-string
/// values.
pub fn parse_generated(raw: &str, fields: &TemplateFields) -> Result<BTreeMap<FieldId, String>, GenerationError> {
    let value = parse_json(raw)?;
    let serde_json::Value::Object(object) = value else {
        return Err(GenerationError::NotAnObject);
    };

    let mut parsed = BTreeMap::new();
    for (key, value) in object {
        let id = FieldId::from(key);
        match fields.kind_of(&id) {
            Some(FieldKind::Image | FieldKind::Button) => {
                tracing::debug!(target: "sitebuilder::session", %id, "skipping generated value for non-text field");
                continue;
            }
            _ => {}
        }
        match value {
            serde_json::Value::String(text) => {
                parsed.insert(id, text);
            }
            other => {
                tracing::debug!(target: "sitebuilder::session", %id, kind = json_kind(&other), "skipping non-string generated value");
            }
        }
    }

    if parsed.is_empty() {
        return Err(GenerationError::Empty);
    }
    Ok(parsed)
}

fn parse_json(raw: &str) -> Result<serde_json::Value, GenerationError> {
    let cleaned = strip_fences(raw);
    match serde_json::from_str(cleaned) {
        Ok(value) => Ok(value),
        Err(err) => {
            let span = raw
                .find('{')
                .zip(raw.rfind('}'))
                .filter(|(start, end)| start < end)
                .map(|(start, end)| &raw[start..=end]);
            match span {
                Some(span) => serde_json::from_str(span).map_err(|e| GenerationError::Parse(e.to_string())),
                None => Err(GenerationError::Parse(err.to_string())),
            }
        }
    }
}

fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

//! Error types for the editing core.
//!
//! DOM-level failures (`PlatformError`, `FormatError`) are absorbed at the
//! lowest layer. Only collaborator failures reach the user, as `SessionError`.

use miette::Diagnostic;

use crate::types::{FieldId, FieldKind};

/// Error type for platform (DOM) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct PlatformError(pub String);

impl From<&str> for PlatformError {
    fn from(s: &str) -> Self {
        PlatformError(s.to_string())
    }
}

impl From<String> for PlatformError {
    fn from(s: String) -> Self {
        PlatformError(s)
    }
}

/// Content model invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    #[error("field {id} is declared as {expected}, got a {found} value")]
    KindMismatch {
        id: FieldId,
        expected: FieldKind,
        found: FieldKind,
    },
    #[error("field {0} is declared twice")]
    DuplicateField(FieldId),
    #[error("field {0} is not declared by the template")]
    UnknownField(FieldId),
}

/// Formatting command failures that are reported back to the toolbar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("invalid link url: {0:?}")]
    InvalidLinkUrl(String),
    #[error("invalid color: {0:?}")]
    InvalidColor(String),
}

/// Failure reported by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("project {0} not found")]
    NotFound(String),
    #[error("storage request failed: {0}")]
    Request(String),
    #[error("stored project data is malformed: {0}")]
    Malformed(String),
}

/// Failure reported by, or while ingesting from, the generation collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Request(String),
    #[error("generated content is not valid JSON: {0}")]
    Parse(String),
    #[error("generated content must be a JSON object of strings")]
    NotAnObject,
    #[error("generated content contained no usable fields")]
    Empty,
}

/// User-facing session errors.
#[derive(Debug, Clone, thiserror::Error, Diagnostic)]
pub enum SessionError {
    #[error("could not save project")]
    #[diagnostic(
        code(sitebuilder::persistence),
        help("your edits are still here; try saving again")
    )]
    Save(#[source] StoreError),

    #[error("could not load project")]
    #[diagnostic(code(sitebuilder::persistence))]
    Load(#[source] StoreError),

    #[error("content generation failed")]
    #[diagnostic(code(sitebuilder::generation), help("the page was left unchanged"))]
    Generation(#[source] GenerationError),

    #[error("another {0} is already in progress")]
    #[diagnostic(code(sitebuilder::busy))]
    Busy(&'static str),

    #[error("nothing to revert")]
    #[diagnostic(code(sitebuilder::revert))]
    NothingToRevert,

    #[error("sign in required")]
    #[diagnostic(code(sitebuilder::auth))]
    Unauthenticated { redirect: String },
}

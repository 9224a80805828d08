//! Boundaries to the external collaborators.
//!
//! Persistence, content generation and authentication live outside the
//! editing core. Hosts implement these traits over whatever backend they
//! talk to; the core only awaits them.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::content::ProjectData;
use crate::error::{GenerationError, SessionError, StoreError};
use crate::generate::GenerationRequest;

/// Project persistence.
pub trait ProjectStore {
    /// Load a stored project. A missing project is `StoreError::NotFound`.
    fn load(&self, page_id: &str) -> impl Future<Output = Result<ProjectData, StoreError>>;

    /// Create or update a project.
    fn save(&self, page_id: &str, name: &str, data: &ProjectData) -> impl Future<Output = Result<(), StoreError>>;
}

/// Generated page copy.
pub trait ContentGenerator {
    /// Returns the model's raw text output; parsing happens in the core.
    fn generate(&self, request: &GenerationRequest) -> impl Future<Output = Result<String, GenerationError>>;
}

/// Signed-in user identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

pub trait AuthProvider {
    fn current_user(&self) -> impl Future<Output = Option<User>>;
}

/// Resolve the signed-in user or the sign-in redirect for `return_to`.
pub async fn require_user<A>(auth: &A, sign_in_path: &str, return_to: &str) -> Result<User, SessionError>
where
    A: AuthProvider + ?Sized,
{
    match auth.current_user().await {
        Some(user) => Ok(user),
        None => {
            let encoded: String = url::form_urlencoded::byte_serialize(return_to.as_bytes()).collect();
            let redirect = format!("{sign_in_path}?redirect={encoded}");
            tracing::info!(target: "sitebuilder::session", %redirect, "no signed-in user");
            Err(SessionError::Unauthenticated { redirect })
        }
    }
}

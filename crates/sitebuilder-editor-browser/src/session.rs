//! Save, generation and sign-in flows driven from the browser.
//!
//! The editor is borrowed only for the synchronous begin/finish steps; the
//! service call itself runs on `spawn_local` with no borrow held, so the
//! toolbar keeps working while a request is outstanding.

use std::rc::Rc;

use sitebuilder_editor_core::{
    AuthProvider, ContentGenerator, GenerationRequest, ProjectStore, SessionError, User, require_user,
};

use crate::events::EditorHandle;

/// Save the project in the background, reporting the outcome to `on_done`.
pub fn spawn_save<S>(handle: &EditorHandle, store: Rc<S>, on_done: impl FnOnce(Result<(), SessionError>) + 'static)
where
    S: ProjectStore + 'static,
{
    let shared = handle.shared().clone();
    let request = match shared.with_editor(|editor| editor.begin_save()) {
        Some(Ok(request)) => request,
        Some(Err(err)) => return on_done(Err(err)),
        None => return on_done(Err(SessionError::Busy("save"))),
    };

    wasm_bindgen_futures::spawn_local(async move {
        let result = store.save(&request.page_id, &request.name, &request.data).await;
        let outcome = shared
            .with_editor(|editor| editor.finish_save(result))
            .unwrap_or_else(|| {
                tracing::warn!(target: "sitebuilder::session", "editor borrowed when save completed");
                Err(SessionError::Busy("save"))
            });
        on_done(outcome);
    });
}

/// Generate page copy in the background. `on_done` receives the merged field count.
pub fn spawn_generation<G>(
    handle: &EditorHandle,
    generator: Rc<G>,
    request: GenerationRequest,
    on_done: impl FnOnce(Result<usize, SessionError>) + 'static,
) where
    G: ContentGenerator + 'static,
{
    let shared = handle.shared().clone();
    match shared.with_editor(|editor| editor.begin_generation()) {
        Some(Ok(())) => {}
        Some(Err(err)) => return on_done(Err(err)),
        None => return on_done(Err(SessionError::Busy("generation"))),
    }

    wasm_bindgen_futures::spawn_local(async move {
        let result = generator.generate(&request).await;
        let outcome = shared
            .with_editor(|editor| editor.finish_generation(result))
            .unwrap_or_else(|| {
                tracing::warn!(target: "sitebuilder::session", "editor borrowed when generation completed");
                Err(SessionError::Busy("generation"))
            });
        on_done(outcome);
    });
}

/// Undo the last generation.
pub fn revert_generation(handle: &EditorHandle) -> Result<(), SessionError> {
    handle
        .shared()
        .with_editor(|editor| editor.revert_generation())
        .unwrap_or(Err(SessionError::Busy("generation")))
}

/// Resolve the signed-in user, navigating to the sign-in page when there is none.
///
/// The current path and query become the sign-in page's return target.
pub async fn ensure_signed_in<A>(auth: &A, sign_in_path: &str) -> Option<User>
where
    A: AuthProvider + ?Sized,
{
    let location = web_sys::window()?.location();
    let return_to = format!(
        "{}{}",
        location.pathname().unwrap_or_default(),
        location.search().unwrap_or_default()
    );
    match require_user(auth, sign_in_path, &return_to).await {
        Ok(user) => Some(user),
        Err(SessionError::Unauthenticated { redirect }) => {
            if let Err(err) = location.set_href(&redirect) {
                tracing::warn!(target: "sitebuilder::session", ?err, "sign-in redirect failed");
            }
            None
        }
        Err(err) => {
            tracing::warn!(target: "sitebuilder::session", error = %err, "auth check failed");
            None
        }
    }
}

//! Browser DOM layer for the site builder's in-place editor.
//!
//! This crate implements the core's platform traits over `web-sys` and wires
//! DOM events into a `PageEditor`. It assumes a `wasm32-unknown-unknown`
//! target environment.
//!
//! # Architecture
//!
//! - `dom`: `BrowserPage`, node classification and viewport metrics
//! - `cursor`: Selection API reads and selection restore
//! - `dom_sync`: field read/render and native editing commands
//! - `events`: listeners, settle timers and the `EditorHandle`
//! - `session`: background save and generation, sign-in redirect
//! - `color`: computed-style conversions for panel initial values
//! - `logging`: console subscriber and panic hook
//!
//! # Re-exports
//!
//! This crate re-exports `sitebuilder-editor-core` for convenience, so consumers
//! only need to depend on `sitebuilder-editor-browser`.

// Re-export core crate
pub use sitebuilder_editor_core;
pub use sitebuilder_editor_core::*;

pub mod color;
pub mod cursor;
pub mod dom;
pub mod dom_sync;
pub mod events;
pub mod logging;
pub mod session;

pub use dom::{BrowserPage, FIELD_ATTR, node_role};
pub use events::{BrowserEditor, EditorHandle, PanelValues, is_mac, key_combo};
pub use logging::init_logging;
pub use session::{ensure_signed_in, revert_generation, spawn_generation, spawn_save};

//! Selection save/restore around toolbar interaction.
//!
//! Clicking a toolbar control or typing into a sub-panel input moves focus
//! away from the field and collapses or replaces the live selection. The
//! guard keeps a copy of the range from before the interaction and puts it
//! back right before a command runs.

use crate::platform::{DomRange, SelectionProvider};
use crate::tracker::{TargetClass, classify_target};
use crate::types::FieldId;

/// A captured range plus the field that owns it.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionSnapshot<N> {
    pub range: DomRange<N>,
    pub field: FieldId,
    pub element: N,
}

/// Result of a restore attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored,
    /// Nothing was saved; the live selection is left alone.
    Missing,
    /// The saved nodes were detached or rejected. The snapshot was cleared.
    Stale,
}

#[derive(Clone, Debug)]
pub struct SelectionGuard<N> {
    snapshot: Option<SelectionSnapshot<N>>,
}

impl<N> Default for SelectionGuard<N> {
    fn default() -> Self {
        Self { snapshot: None }
    }
}

impl<N: Clone + PartialEq + std::fmt::Debug> SelectionGuard<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<&SelectionSnapshot<N>> {
        self.snapshot.as_ref()
    }

    /// Capture the first live range if it is non-collapsed and inside a text
    /// field. An earlier snapshot is kept when there is nothing to capture.
    pub fn save<S>(&mut self, host: &S) -> bool
    where
        S: SelectionProvider<Node = N> + ?Sized,
    {
        let Some(range) = host.first_range() else {
            return false;
        };
        if range.is_collapsed() {
            return false;
        }
        let TargetClass::Text { element, field } = classify_target(host, &range.anchor.node) else {
            return false;
        };

        tracing::trace!(target: "sitebuilder::selection", %field, "selection saved");
        self.snapshot = Some(SelectionSnapshot { range, field, element });
        true
    }

    /// Re-apply the snapshot and focus its field.
    pub fn restore<S>(&mut self, host: &S) -> RestoreOutcome
    where
        S: SelectionProvider<Node = N> + ?Sized,
    {
        let Some(snapshot) = &self.snapshot else {
            return RestoreOutcome::Missing;
        };

        let attached = host.is_connected(&snapshot.element)
            && host.is_connected(&snapshot.range.anchor.node)
            && host.is_connected(&snapshot.range.focus.node);
        if !attached {
            tracing::debug!(target: "sitebuilder::selection", field = %snapshot.field, "snapshot is stale");
            self.snapshot = None;
            return RestoreOutcome::Stale;
        }

        if let Err(err) = host.focus(&snapshot.element) {
            tracing::debug!(target: "sitebuilder::selection", error = %err, "could not focus field");
        }
        if let Err(err) = host.select(&snapshot.range) {
            tracing::debug!(target: "sitebuilder::selection", error = %err, "could not restore selection");
            self.snapshot = None;
            return RestoreOutcome::Stale;
        }
        RestoreOutcome::Restored
    }

    pub fn clear(&mut self) {
        self.snapshot = None;
    }
}

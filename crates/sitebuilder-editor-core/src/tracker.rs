//! Selection tracking.
//!
//! Turns the flood of raw selection-change notifications into settled
//! `Active`/`Inactive` transitions. Each raw change re-arms a short debounce;
//! the host schedules a timer for the returned [`SettleTicket`] and hands it
//! back via [`SelectionTracker::settle`]. Only the most recently issued ticket
//! is honoured, so a burst collapses into one evaluation of the final state.

use std::time::Duration;

use crate::platform::{PageDom, SelectionProvider};
use crate::types::{FieldId, Rect};

/// Where a node sits relative to the editable text fields.
#[derive(Clone, Debug, PartialEq)]
pub enum TargetClass<N> {
    /// Inside a text field; `element` is the field container.
    Text { element: N, field: FieldId },
    /// At or under an image, button, or button field.
    Excluded,
    /// Not inside any editable text field.
    Outside,
}

/// Classify a node by walking its ancestor chain.
///
/// The nearest text-field marker wins, but any image or button anywhere in
/// the chain excludes the node, even above the text field.
pub fn classify_target<D: PageDom + ?Sized>(dom: &D, node: &D::Node) -> TargetClass<D::Node> {
    let mut text: Option<(D::Node, FieldId)> = None;
    let mut current = Some(node.clone());

    while let Some(n) = current {
        let role = dom.role(&n);
        if role.blocks_text_toolbar() {
            return TargetClass::Excluded;
        }
        if text.is_none() {
            if let crate::platform::NodeRole::EditableText(id) = role {
                text = Some((n.clone(), id));
            }
        }
        current = dom.parent(&n);
    }

    match text {
        Some((element, field)) => TargetClass::Text { element, field },
        None => TargetClass::Outside,
    }
}

/// A settled, non-collapsed selection inside a text field.
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveSelection<N> {
    pub element: N,
    pub field: FieldId,
    pub rect: Rect,
}

/// Settled selection transition.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectionEvent<N> {
    Active(ActiveSelection<N>),
    Inactive,
}

/// Handle for one scheduled settle. Stale tickets are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettleTicket {
    generation: u64,
    pub delay: Duration,
}

/// Result of feeding one raw selection-change notification.
#[derive(Clone, Debug, PartialEq)]
pub enum ChangeOutcome<N> {
    /// Arm (or re-arm) the settle timer with this ticket.
    Schedule(SettleTicket),
    /// The selection was cleared; transition without waiting.
    Immediate(SelectionEvent<N>),
    /// Nothing to do.
    Ignored,
}

#[derive(Clone, Debug, PartialEq)]
enum TrackerState<N> {
    Inactive,
    Active(ActiveSelection<N>),
}

/// Two-state machine {Inactive, Active(target)} behind a debounce stage.
#[derive(Clone, Debug)]
pub struct SelectionTracker<N> {
    debounce: Duration,
    generation: u64,
    pending: bool,
    state: TrackerState<N>,
}

impl<N: Clone + PartialEq> SelectionTracker<N> {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            generation: 0,
            pending: false,
            state: TrackerState::Inactive,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, TrackerState::Active(_))
    }

    pub fn active(&self) -> Option<&ActiveSelection<N>> {
        match &self.state {
            TrackerState::Active(active) => Some(active),
            TrackerState::Inactive => None,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending
    }

    /// Feed one raw selection-change notification.
    pub fn on_selection_change<S>(&mut self, host: &S) -> ChangeOutcome<N>
    where
        S: SelectionProvider<Node = N> + ?Sized,
    {
        let cleared = host.selection().map_or(true, |sel| sel.is_cleared());
        if cleared {
            self.cancel();
            return match self.state {
                TrackerState::Active(_) => {
                    tracing::trace!(target: "sitebuilder::selection", "selection cleared");
                    self.state = TrackerState::Inactive;
                    ChangeOutcome::Immediate(SelectionEvent::Inactive)
                }
                TrackerState::Inactive => ChangeOutcome::Ignored,
            };
        }

        self.generation = self.generation.wrapping_add(1);
        self.pending = true;
        ChangeOutcome::Schedule(SettleTicket {
            generation: self.generation,
            delay: self.debounce,
        })
    }

    /// Evaluate the settled selection for a fired timer.
    pub fn settle<S>(&mut self, host: &S, ticket: SettleTicket) -> Option<SelectionEvent<N>>
    where
        S: SelectionProvider<Node = N> + ?Sized,
    {
        if !self.pending || ticket.generation != self.generation {
            tracing::trace!(
                target: "sitebuilder::selection",
                ticket = ticket.generation,
                current = self.generation,
                "ignoring stale settle ticket"
            );
            return None;
        }
        self.pending = false;

        match Self::evaluate(host) {
            Some(active) => {
                tracing::debug!(
                    target: "sitebuilder::selection",
                    field = %active.field,
                    "selection active"
                );
                self.state = TrackerState::Active(active.clone());
                Some(SelectionEvent::Active(active))
            }
            None => match self.state {
                TrackerState::Active(_) => {
                    tracing::debug!(target: "sitebuilder::selection", "selection inactive");
                    self.state = TrackerState::Inactive;
                    Some(SelectionEvent::Inactive)
                }
                TrackerState::Inactive => None,
            },
        }
    }

    /// Check the live selection without touching tracker state.
    pub fn evaluate<S>(host: &S) -> Option<ActiveSelection<N>>
    where
        S: SelectionProvider<Node = N> + ?Sized,
    {
        let selection = host.selection()?;
        if selection.is_collapsed || selection.range_count == 0 {
            return None;
        }
        let anchor = selection.anchor?;

        let TargetClass::Text { element, field } = classify_target(host, &anchor.node) else {
            return None;
        };

        let rect = match host.range_rect() {
            Ok(rect) => rect,
            Err(err) => {
                tracing::debug!(
                    target: "sitebuilder::selection",
                    error = %err,
                    "range rect unavailable, using field rect"
                );
                host.bounding_rect(&element)?
            }
        };

        Some(ActiveSelection {
            element,
            field,
            rect,
        })
    }

    /// Invalidate any outstanding ticket.
    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.pending = false;
    }

    /// Forget the current target and invalidate any outstanding ticket.
    pub fn reset(&mut self) {
        self.cancel();
        self.state = TrackerState::Inactive;
    }
}

//! Browser implementation of the selection capability.
//!
//! Uses the DOM Selection API to read the live selection, measure its first
//! range and put a saved range back.

use sitebuilder_editor_core::{DomPoint, DomRange, LiveSelection, PlatformError, Rect, SelectionProvider};

use crate::dom::{BrowserPage, to_rect};

impl BrowserPage {
    fn dom_selection(&self) -> Result<web_sys::Selection, PlatformError> {
        self.window
            .get_selection()
            .map_err(|e| PlatformError::from(format!("get_selection failed: {e:?}")))?
            .ok_or_else(|| "no selection object".into())
    }

    fn first_dom_range(&self) -> Result<web_sys::Range, PlatformError> {
        let selection = self.dom_selection()?;
        if selection.range_count() == 0 {
            return Err("selection has no ranges".into());
        }
        selection
            .get_range_at(0)
            .map_err(|e| PlatformError::from(format!("get_range_at failed: {e:?}")))
    }
}

impl SelectionProvider for BrowserPage {
    fn selection(&self) -> Option<LiveSelection<web_sys::Node>> {
        let selection = self.dom_selection().ok()?;
        let anchor = selection
            .anchor_node()
            .map(|node| DomPoint::new(node, selection.anchor_offset()));
        let focus = selection
            .focus_node()
            .map(|node| DomPoint::new(node, selection.focus_offset()));

        Some(LiveSelection {
            anchor,
            focus,
            is_collapsed: selection.is_collapsed(),
            range_count: selection.range_count(),
        })
    }

    fn first_range(&self) -> Option<DomRange<web_sys::Node>> {
        let selection = self.dom_selection().ok()?;
        if selection.range_count() == 0 {
            return None;
        }
        // Anchor/focus keep the user's selection direction; the range itself
        // only knows start and end.
        let anchor = DomPoint::new(selection.anchor_node()?, selection.anchor_offset());
        let focus = DomPoint::new(selection.focus_node()?, selection.focus_offset());
        Some(DomRange::new(anchor, focus))
    }

    fn range_rect(&self) -> Result<Rect, PlatformError> {
        let range = self.first_dom_range()?;
        Ok(to_rect(&range.get_bounding_client_rect()))
    }

    fn select(&self, range: &DomRange<web_sys::Node>) -> Result<(), PlatformError> {
        if !range.anchor.node.is_connected() || !range.focus.node.is_connected() {
            return Err("range endpoints are detached".into());
        }
        let selection = self.dom_selection()?;

        tracing::trace!(
            target: "sitebuilder::selection",
            anchor = %range.anchor.node.node_name(),
            anchor_offset = range.anchor.offset,
            focus = %range.focus.node.node_name(),
            focus_offset = range.focus.offset,
            "restoring selection"
        );

        selection
            .set_base_and_extent(
                &range.anchor.node,
                range.anchor.offset,
                &range.focus.node,
                range.focus.offset,
            )
            .map_err(|e| PlatformError::from(format!("set_base_and_extent failed: {e:?}")))
    }
}

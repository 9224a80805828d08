//! Toolbar positioning.

use crate::config::{PositionMode, ToolbarConfig};
use crate::types::{Position, Rect, Size, ViewportMetrics};

/// Place the toolbar relative to `target`.
///
/// Prefers above the target, flips below when that would leave the viewport,
/// centers horizontally and clamps into the padded viewport. When the viewport
/// is narrower than the toolbar the left edge pins to the padding.
pub fn compute_position(
    target: Rect,
    toolbar: Option<Size>,
    viewport: ViewportMetrics,
    config: &ToolbarConfig,
) -> Position {
    let size = match toolbar {
        Some(size) if size.width > 0.0 && size.height > 0.0 => size,
        _ => config.default_size,
    };

    let above = target.top - size.height - config.gap;
    let top = if above < 0.0 {
        target.bottom() + config.gap
    } else {
        above
    };

    let min_left = config.padding;
    let max_left = viewport.width - size.width - config.padding;
    let centered = target.center_x() - size.width / 2.0;
    let left = if max_left < min_left {
        min_left
    } else {
        centered.clamp(min_left, max_left)
    };

    match config.mode {
        PositionMode::Fixed => Position::new(top, left),
        PositionMode::Document => Position::new(top + viewport.scroll_y, left + viewport.scroll_x),
    }
}

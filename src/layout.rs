//! C4 — the per-window layout tree: stacked arrangement with sticky bands,
//! hit-testing, and scroll-into-view.

use crate::control::StickyPosition;
use crate::geometry::{Position, Rect, Size};

/// One node in a window's layout tree, holding the arranged bounds of a
/// control plus its children. Built fresh each arrange pass; cheap to
/// discard and rebuild rather than incrementally patched.
#[derive(Clone, Debug)]
pub struct LayoutNode {
    /// Stable id of the control this node positions (assigned by the
    /// window when it registers controls, not reused across rebuilds).
    pub control_id: u64,
    /// Bounds in window-local coordinates, already offset by scroll.
    pub bounds: Rect,
    /// Bounds before scroll offset was applied, used by scroll-into-view.
    pub content_bounds: Rect,
    /// Child nodes, in paint/hit-test order (first child painted first).
    pub children: Vec<LayoutNode>,
}

impl LayoutNode {
    /// A leaf node with no children.
    pub fn leaf(control_id: u64, bounds: Rect, content_bounds: Rect) -> Self {
        Self { control_id, bounds, content_bounds, children: Vec::new() }
    }
}

/// One control's layout inputs, as the window renderer collects them before
/// calling [`arrange`].
pub struct LayoutItem {
    /// Stable id of the control.
    pub control_id: u64,
    /// Desired size from [`crate::control::Control::measure_desired`].
    pub desired: Size,
    /// Sticky placement.
    pub sticky: StickyPosition,
    /// Margin around the desired box.
    pub margin: crate::control::Margin,
}

/// Arrange `items` as a vertical stack within `viewport`, offset by
/// `scroll_y`. Sticky-top items are pinned at the top of the viewport in
/// the order given; sticky-bottom items are pinned at the bottom. Normal
/// items flow in between and scroll with `scroll_y`.
///
/// Returns one [`LayoutNode`] per item, in input order.
pub fn arrange(items: &[LayoutItem], viewport: Rect, scroll_y: u16) -> Vec<LayoutNode> {
    let mut nodes = Vec::with_capacity(items.len());

    let mut top_cursor = viewport.top();
    let mut bottom_cursor = viewport.bottom();
    let mut flow_cursor: i64 = viewport.top() as i64 - scroll_y as i64;

    for item in items {
        let h = item.desired.height + item.margin.top + item.margin.bottom;
        let w = item.desired.width.min(viewport.size.width);
        match item.sticky {
            StickyPosition::Top => {
                let y = top_cursor;
                top_cursor = top_cursor.saturating_add(h);
                let bounds = Rect::new(
                    viewport.left() + item.margin.left,
                    y + item.margin.top,
                    w,
                    item.desired.height,
                );
                nodes.push(LayoutNode::leaf(item.control_id, bounds, bounds));
            }
            StickyPosition::Bottom => {
                bottom_cursor = bottom_cursor.saturating_sub(h);
                let bounds = Rect::new(
                    viewport.left() + item.margin.left,
                    bottom_cursor + item.margin.top,
                    w,
                    item.desired.height,
                );
                nodes.push(LayoutNode::leaf(item.control_id, bounds, bounds));
            }
            StickyPosition::None => {
                let content_y = flow_cursor + item.margin.top as i64;
                flow_cursor += h as i64;
                let content_bounds = Rect::new(
                    viewport.left() + item.margin.left,
                    content_y.clamp(0, u16::MAX as i64) as u16,
                    w,
                    item.desired.height,
                );
                let clipped = clip_to_band(content_bounds, viewport, top_cursor, bottom_cursor);
                nodes.push(LayoutNode { control_id: item.control_id, bounds: clipped, content_bounds, children: Vec::new() });
            }
        }
    }
    nodes
}

/// Clip a flowed item's bounds so it never paints over the sticky bands at
/// the top or bottom of the viewport, and never escapes negative rows when
/// scrolled past its own position (an empty, zero-height rect in that case).
fn clip_to_band(bounds: Rect, viewport: Rect, band_top: u16, band_bottom: u16) -> Rect {
    if bounds.bottom() <= band_top || bounds.top() >= band_bottom {
        return Rect::new(bounds.left(), bounds.top(), 0, 0);
    }
    if bounds.left() < viewport.left() || bounds.top() < band_top {
        let top = bounds.top().max(band_top);
        let height = bounds.bottom().saturating_sub(top).min(band_bottom.saturating_sub(top));
        return Rect::new(bounds.left(), top, bounds.size.width, height);
    }
    let height = bounds.size.height.min(band_bottom.saturating_sub(bounds.top()));
    Rect::new(bounds.left(), bounds.top(), bounds.size.width, height)
}

/// Depth-first hit-test, visiting last-child-first so the topmost-painted
/// sibling wins when controls overlap. Returns the id of the deepest
/// matching control.
pub fn hit_test(nodes: &[LayoutNode], pos: Position) -> Option<u64> {
    for node in nodes.iter().rev() {
        if !node.bounds.contains(pos) {
            continue;
        }
        if let Some(found) = hit_test(&node.children, pos) {
            return Some(found);
        }
        return Some(node.control_id);
    }
    None
}

/// Compute the scroll offset that brings `content_bounds` (a node's
/// pre-scroll bounds) fully into `viewport`, clamped to the scrollable
/// content height. Returns `scroll_y` unchanged if already visible.
pub fn scroll_into_view(content_bounds: Rect, viewport: Rect, scroll_y: u16, content_height: u16) -> u16 {
    let viewport_height = viewport.size.height;
    let max_scroll = content_height.saturating_sub(viewport_height);
    let top = content_bounds.top();
    let bottom = content_bounds.bottom();

    let visible_top = viewport.top() as i64 + scroll_y as i64;
    let visible_bottom = visible_top + viewport_height as i64;

    let mut new_scroll = scroll_y as i64;
    if (top as i64) < visible_top {
        new_scroll -= visible_top - top as i64;
    } else if (bottom as i64) > visible_bottom {
        new_scroll += bottom as i64 - visible_bottom;
    }
    new_scroll.clamp(0, max_scroll as i64) as u16
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn scroll_into_view_always_within_clamped_bounds(
            viewport_height in 1u16..50,
            content_height in 0u16..500,
            scroll_y in 0u16..500,
            content_top in 0u16..500,
            content_h in 0u16..50,
        ) {
            let viewport = Rect::new(0, 0, 10, viewport_height);
            let content = Rect::new(0, content_top, 10, content_h);
            let result = scroll_into_view(content, viewport, scroll_y, content_height);
            let max_scroll = content_height.saturating_sub(viewport_height);
            prop_assert!(result <= max_scroll);
        }
    }
}

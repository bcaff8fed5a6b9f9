//! C5 — the window renderer: measure -> arrange -> paint for a single
//! window, composing its border chrome with its controls' own painting.

pub mod border;

use crate::control::{Control, EventOutcome};
use crate::error::WmError;
use crate::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use crate::geometry::{Position, Rect, Size};
use crate::grid::Grid;
use crate::layout::{self, LayoutItem, LayoutNode};
use crate::theme::Theme;
use crate::window::{FocusState, WindowId};

use border::{BorderRenderer, BorderSpec};

/// One control plus the layout inputs the renderer needs from it, collected
/// up front so the measure/arrange passes don't need `dyn Control` object
/// safety workarounds for anything beyond the trait itself.
pub struct RenderItem<'a> {
    /// Stable id assigned by the window when the control was registered.
    pub control_id: u64,
    /// The control to measure, arrange, and paint.
    pub control: &'a mut dyn Control,
}

/// Renders one window's full chrome + content into a fresh grid sized to
/// its outer bounds. A faulting control does not abort the frame: its
/// region is replaced with a diagnostic row and the fault is returned
/// alongside the otherwise-complete grid so the caller can log it.
pub struct WindowRenderer {
    border: BorderRenderer,
}

impl WindowRenderer {
    /// A renderer with a fresh border cache.
    pub fn new() -> Self {
        Self { border: BorderRenderer::new() }
    }

    /// Run the full measure -> arrange -> paint pipeline for one window.
    ///
    /// `outer` is the window's full bounds including the border; controls
    /// are laid out within the interior (`outer` inset by one cell on each
    /// side). Returns the painted grid, sized to `outer`, plus the first
    /// render fault encountered (if any) for the caller to log.
    pub fn render(
        &self,
        window_id: WindowId,
        outer: Size,
        title: &str,
        focused: bool,
        flashing: bool,
        scroll_y: u16,
        items: &mut [RenderItem<'_>],
    ) -> (Grid, Option<WmError>) {
        let mut grid = Grid::new(outer.width, outer.height);
        let interior = Rect::new(1, 1, outer.width.saturating_sub(2), outer.height.saturating_sub(2));

        let mut fault = None;
        let content_height = self.paint_content(&mut grid, interior, scroll_y, items, &mut fault, window_id);

        let border_spec = BorderSpec {
            width: outer.width,
            height: outer.height,
            title: title.to_string(),
            focused,
            flashing,
            show_close: true,
            show_minimize: true,
            scrollbar: if content_height > interior.size.height {
                Some(border::ScrollbarInfo { content_height, viewport_height: interior.size.height, scroll_y })
            } else {
                None
            },
        };
        let border_grid = self.border.render(&border_spec, &Theme::default());
        overlay_border(&mut grid, &border_grid);

        (grid, fault)
    }

    /// Deliver a key event to a window's controls. The currently focused
    /// control gets first refusal; if it ignores the key (or none is
    /// focused), `Tab`/`Shift+Tab` cycle focus among focusable, enabled
    /// controls, wrapping at either end, and `Escape` clears focus while
    /// remembering it in `focus.escaped_from` so the next Tab restores it
    /// instead of restarting the cycle.
    pub fn process_key(&self, focus: &mut FocusState, event: &KeyEvent, items: &mut [RenderItem<'_>]) -> EventOutcome {
        if let Some(focused_id) = focus.focused_control {
            if let Some(item) = items.iter_mut().find(|i| i.control_id == focused_id) {
                if item.control.is_enabled() {
                    let outcome = item.control.process_key(event);
                    if outcome != EventOutcome::Ignored {
                        return outcome;
                    }
                }
            }
        }

        match event.code {
            KeyCode::Tab => {
                self.cycle_focus(focus, items, !event.shift());
                EventOutcome::ConsumedAndDirty
            }
            KeyCode::Escape if focus.focused_control.is_some() => {
                focus.escaped_from = focus.focused_control.take();
                EventOutcome::ConsumedAndDirty
            }
            _ => EventOutcome::Ignored,
        }
    }

    /// Move focus to the next (`forward`) or previous focusable, enabled
    /// control, in the order `items` were given. If nothing is currently
    /// focused and a control was previously escaped from, focus returns
    /// there instead of starting over.
    fn cycle_focus(&self, focus: &mut FocusState, items: &[RenderItem<'_>], forward: bool) {
        let focusable: Vec<u64> =
            items.iter().filter(|i| i.control.can_focus() && i.control.is_enabled()).map(|i| i.control_id).collect();
        if focusable.is_empty() {
            focus.focused_control = None;
            return;
        }
        if focus.focused_control.is_none() {
            if let Some(restored) = focus.escaped_from.take() {
                if focusable.contains(&restored) {
                    focus.focused_control = Some(restored);
                    return;
                }
            }
        }
        let current_idx = focus.focused_control.and_then(|id| focusable.iter().position(|c| *c == id));
        let next_idx = match current_idx {
            Some(i) if forward => (i + 1) % focusable.len(),
            Some(i) => (i + focusable.len() - 1) % focusable.len(),
            None if forward => 0,
            None => focusable.len() - 1,
        };
        focus.focused_control = Some(focusable[next_idx]);
    }

    /// Hit-test `event` against `items` laid out the same way
    /// [`WindowRenderer::render`] would, and deliver it to whichever
    /// control's bounds contain the point and wants mouse input. A press
    /// on a control that accepts mouse focus also moves keyboard focus to
    /// it.
    pub fn process_mouse(
        &self,
        focus: &mut FocusState,
        interior: Rect,
        scroll_y: u16,
        event: &MouseEvent,
        items: &mut [RenderItem<'_>],
    ) -> EventOutcome {
        let measured: Vec<LayoutItem> = items
            .iter()
            .filter(|item| item.control.visible())
            .map(|item| LayoutItem {
                control_id: item.control_id,
                desired: item.control.measure_desired(interior.size),
                sticky: item.control.sticky_position(),
                margin: item.control.margin(),
            })
            .collect();
        let nodes = layout::arrange(&measured, interior, scroll_y);
        let pos = Position::new(event.x, event.y);
        let Some(control_id) = layout::hit_test(&nodes, pos) else {
            return EventOutcome::Ignored;
        };
        let Some(item) = items.iter_mut().find(|i| i.control_id == control_id) else {
            return EventOutcome::Ignored;
        };
        if !item.control.wants_mouse() || !item.control.is_enabled() {
            return EventOutcome::Ignored;
        }
        if matches!(event.kind, MouseEventKind::Pressed(_)) && item.control.can_focus_with_mouse() {
            focus.focused_control = Some(control_id);
        }
        item.control.process_mouse(event)
    }

    fn paint_content(
        &self,
        grid: &mut Grid,
        interior: Rect,
        scroll_y: u16,
        items: &mut [RenderItem<'_>],
        fault: &mut Option<WmError>,
        window_id: WindowId,
    ) -> u16 {
        let measured: Vec<LayoutItem> = items
            .iter()
            .filter(|item| item.control.visible())
            .map(|item| LayoutItem {
                control_id: item.control_id,
                desired: item.control.measure_desired(interior.size),
                sticky: item.control.sticky_position(),
                margin: item.control.margin(),
            })
            .collect();

        let nodes = layout::arrange(&measured, interior, scroll_y);
        let content_height = nodes.iter().map(|n| n.content_bounds.bottom()).max().unwrap_or(interior.top());

        for node in &nodes {
            if node.bounds.is_empty() {
                continue;
            }
            let Some(item) = items.iter_mut().find(|i| i.control_id == node.control_id) else { continue };
            paint_one(grid, node, item, fault, window_id);
        }
        content_height.saturating_sub(interior.top())
    }
}

impl Default for WindowRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn paint_one(grid: &mut Grid, node: &LayoutNode, item: &mut RenderItem<'_>, fault: &mut Option<WmError>, window_id: WindowId) {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        item.control.render(grid, node.bounds);
    }));
    if result.is_err() {
        let message = format!("control {} panicked during render", node.control_id);
        tracing::warn!(window = window_id.raw(), control = node.control_id, "render fault: {message}");
        grid.write_clipped(node.bounds.left(), node.bounds.top(), "[render error]", None, None, node.bounds);
        if fault.is_none() {
            *fault = Some(WmError::RenderFault { window_id: window_id.raw(), message });
        }
    }
}

fn overlay_border(grid: &mut Grid, border_grid: &Grid) {
    for y in 0..border_grid.height() {
        for x in 0..border_grid.width() {
            let Ok(cell) = border_grid.get(x, y) else { continue };
            let is_border_edge = x == 0 || y == 0 || x == border_grid.width() - 1 || y == border_grid.height() - 1;
            if is_border_edge {
                let _ = grid.set(x, y, cell.clone());
            }
        }
    }
}

/// Compute the interior content rect for a window of outer size `outer`,
/// accounting for the one-cell border on every side.
pub fn interior_of(outer: Size) -> Rect {
    Rect::new(1, 1, outer.width.saturating_sub(2), outer.height.saturating_sub(2))
}

//! C8 — the compositor: Z-ordered per-frame painting of window grids onto
//! the shared double buffer, and flush.

pub mod region;

use std::collections::HashMap;

use crate::buffer::{ConsoleBuffer, FlushMode};
use crate::cell::Cell;
use crate::color::ColorSupport;
use crate::geometry::{Rect, Size};
use crate::grid::Grid;
use crate::style::Style;
use crate::theme::Theme;
use crate::window::{WindowId, WindowRegistry};

/// Owns the shared double buffer and paints windows into it each frame.
///
/// Frame algorithm: (1) fill the desktop background, (2) for each window
/// from bottom to top, compute the regions of it not covered by any
/// higher window (C7), (3) blit the window's own grid into those regions
/// only, (4) paint the top/bottom status bars over everything, (5) flush
/// the buffer to an escape-sequence string, (6) clear per-window dirty
/// state (callers do this once they've consumed the flushed string).
pub struct Compositor {
    buffer: ConsoleBuffer,
    theme: Theme,
}

impl Compositor {
    /// Create a compositor of the given size.
    pub fn new(size: Size, mode: FlushMode, color_support: ColorSupport, theme: Theme) -> Self {
        Self { buffer: ConsoleBuffer::new(size, mode, color_support), theme }
    }

    /// Resize the underlying buffer.
    pub fn resize(&mut self, size: Size) {
        self.buffer.resize(size);
    }

    /// Paint one frame: desktop, then windows bottom-to-top clipped against
    /// higher occluders, then status bars. `window_grids` holds one
    /// window-local grid per visible window, produced by the window
    /// renderer (C5). Before blitting each window, any region it vacated
    /// since the last frame (moved or shrunk away from) is exposed back to
    /// the desktop so a dragged or resized window doesn't leave a ghost.
    pub fn paint(&mut self, registry: &WindowRegistry, window_grids: &HashMap<WindowId, Grid>, top_bar: Option<&str>, bottom_bar: Option<&str>) {
        self.paint_desktop();

        let stack = registry.by_z_order();
        let visible_stack: Vec<_> = stack
            .iter()
            .filter(|w| {
                let inner = w.lock();
                inner.visible && !inner.minimized
            })
            .cloned()
            .collect();

        for (i, window) in visible_stack.iter().enumerate() {
            let Some(grid) = window_grids.get(&window.id()) else { continue };
            let (bounds, previous_bounds) = {
                let mut inner = window.lock();
                let previous = inner.previous_bounds;
                inner.previous_bounds = inner.bounds;
                (inner.bounds, previous)
            };
            if previous_bounds != bounds {
                for exposed in previous_bounds.subtract(&bounds) {
                    self.expose_desktop(exposed);
                }
            }
            let occluders: Vec<Rect> = visible_stack[i + 1..].iter().map(|w| w.lock().bounds).collect();
            let regions = region::visible_regions(bounds, &occluders);
            for visible_rect in regions {
                blit(self.buffer.back_mut(), grid, bounds, visible_rect);
            }
        }

        if let Some(text) = top_bar {
            self.paint_bar(0, text, self.theme.top_bar);
        }
        if let Some(text) = bottom_bar {
            let y = self.buffer.back().height().saturating_sub(1);
            self.paint_bar(y, text, self.theme.bottom_bar);
        }
    }

    fn paint_desktop(&mut self) {
        let width = self.buffer.back().width();
        let height = self.buffer.back().height();
        let style = Style::new().bg(self.theme.desktop_bg);
        self.buffer.back_mut().fill(Rect::new(0, 0, width, height), self.theme.desktop_char, style.fg, style.bg);
        for y in 0..height {
            self.buffer.mark_dirty(y);
        }
    }

    /// Fill a rectangle vacated by a moved or resized window with the
    /// desktop background and mark its rows dirty for the next flush.
    fn expose_desktop(&mut self, rect: Rect) {
        self.buffer.back_mut().fill(rect, self.theme.desktop_char, None, Some(self.theme.desktop_bg));
        for y in rect.top()..rect.bottom() {
            self.buffer.mark_dirty(y);
        }
    }

    fn paint_bar(&mut self, y: u16, text: &str, colors: (crate::color::Color, crate::color::Color)) {
        let width = self.buffer.back().width();
        self.buffer.back_mut().fill(Rect::new(0, y, width, 1), ' ', Some(colors.0), Some(colors.1));
        self.buffer.back_mut().write(0, y, text, Some(colors.0), Some(colors.1));
        self.buffer.mark_dirty(y);
    }

    /// Flush the accumulated frame to an escape-sequence string.
    pub fn flush(&mut self) -> String {
        self.buffer.flush()
    }
}

/// Copy the cells of `region` (screen coordinates, must lie within
/// `window_bounds`) from `src` (window-local coordinates) into `dst`.
fn blit(dst: &mut Grid, src: &Grid, window_bounds: Rect, region: Rect) {
    for y in region.top()..region.bottom() {
        for x in region.left()..region.right() {
            let local_x = x - window_bounds.left();
            let local_y = y - window_bounds.top();
            let cell = src.get(local_x, local_y).map(Clone::clone).unwrap_or_else(|_| Cell::blank());
            let _ = dst.set(x, y, cell);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_grid(size: Size, ch: char) -> Grid {
        let mut g = Grid::new(size.width, size.height);
        g.fill(Rect::new(0, 0, size.width, size.height), ch, None, None);
        g
    }

    #[test]
    fn paints_single_window_fully() {
        let registry = WindowRegistry::new();
        let w = registry.create("a", Rect::new(0, 0, 5, 5));
        let mut grids = HashMap::new();
        grids.insert(w.id(), solid_grid(Size::new(5, 5), 'X'));

        let mut comp = Compositor::new(Size::new(20, 10), FlushMode::Cell, ColorSupport::TrueColor, Theme::default());
        comp.paint(&registry, &grids, None, None);
        let out = comp.flush();
        assert!(out.contains('X'));
    }

    #[test]
    fn occluded_region_not_painted_from_lower_window() {
        let registry = WindowRegistry::new();
        let back = registry.create("back", Rect::new(0, 0, 10, 10));
        let front = registry.create("front", Rect::new(2, 2, 4, 4));
        let mut grids = HashMap::new();
        grids.insert(back.id(), solid_grid(Size::new(10, 10), 'B'));
        grids.insert(front.id(), solid_grid(Size::new(4, 4), 'F'));

        let mut comp = Compositor::new(Size::new(20, 20), FlushMode::Cell, ColorSupport::TrueColor, Theme::default());
        comp.paint(&registry, &grids, None, None);
        comp.flush();
        // The cell under the front window must show 'F', not 'B'.
        assert_eq!(comp.buffer.back().get(3, 3).unwrap().char, 'F');
        assert_eq!(comp.buffer.back().get(0, 0).unwrap().char, 'B');
    }

    #[test]
    fn minimized_windows_are_skipped() {
        let registry = WindowRegistry::new();
        let w = registry.create("a", Rect::new(0, 0, 5, 5));
        w.lock().minimized = true;
        let mut grids = HashMap::new();
        grids.insert(w.id(), solid_grid(Size::new(5, 5), 'X'));

        let mut comp = Compositor::new(Size::new(20, 10), FlushMode::Cell, ColorSupport::TrueColor, Theme::default());
        comp.paint(&registry, &grids, None, None);
        assert_eq!(comp.buffer.back().get(0, 0).unwrap().char, Theme::default().desktop_char);
    }

    #[test]
    fn moving_window_exposes_desktop_at_old_bounds() {
        let registry = WindowRegistry::new();
        let w = registry.create("a", Rect::new(0, 0, 5, 5));
        let mut grids = HashMap::new();
        grids.insert(w.id(), solid_grid(Size::new(5, 5), 'X'));

        let mut comp = Compositor::new(Size::new(20, 10), FlushMode::Cell, ColorSupport::TrueColor, Theme::default());
        comp.paint(&registry, &grids, None, None);
        comp.flush();

        w.set_bounds(Rect::new(10, 0, 5, 5));
        comp.paint(&registry, &grids, None, None);
        comp.flush();

        assert_eq!(comp.buffer.back().get(0, 0).unwrap().char, Theme::default().desktop_char);
        assert_eq!(comp.buffer.back().get(10, 0).unwrap().char, 'X');
    }

    #[test]
    fn status_bars_paint_over_windows() {
        let registry = WindowRegistry::new();
        let w = registry.create("a", Rect::new(0, 0, 10, 10));
        let mut grids = HashMap::new();
        grids.insert(w.id(), solid_grid(Size::new(10, 10), 'W'));

        let mut comp = Compositor::new(Size::new(20, 10), FlushMode::Cell, ColorSupport::TrueColor, Theme::default());
        comp.paint(&registry, &grids, Some("menu"), None);
        assert_eq!(comp.buffer.back().get(0, 0).unwrap().char, 'm');
    }
}

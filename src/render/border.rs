//! C6 — border renderer: chrome, title, buttons, and scrollbar thumb, with
//! a single-entry cache so an unchanged frame skips redrawing the border.

use std::sync::Mutex;

use crate::ansi::truncate_markup;
use crate::geometry::Rect;
use crate::grid::Grid;
use crate::style::Style;
use crate::theme::Theme;

const BOX_CHARS: (char, char, char, char, char, char) = ('\u{250c}', '\u{2510}', '\u{2514}', '\u{2518}', '\u{2500}', '\u{2502}');
const CLOSE_GLYPH: char = '\u{2573}';
const MINIMIZE_GLYPH: char = '_';
const SCROLLBAR_TRACK: char = '\u{2591}';
const SCROLLBAR_THUMB: char = '\u{2588}';

/// Scrollbar thumb placement inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScrollbarInfo {
    /// Total scrollable content height.
    pub content_height: u16,
    /// Height of the visible viewport.
    pub viewport_height: u16,
    /// Current scroll offset.
    pub scroll_y: u16,
}

/// Everything the border renderer needs to draw one window's chrome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BorderSpec {
    /// Outer width of the window, including the border itself.
    pub width: u16,
    /// Outer height of the window, including the border itself.
    pub height: u16,
    /// Title text, markup-decorated (see [`crate::ansi::truncate_markup`]).
    pub title: String,
    /// Whether this window currently has focus (controls border color).
    pub focused: bool,
    /// Whether this window should flash to draw attention (e.g. the user
    /// tried to activate a window blocked by this one's modal descendant).
    /// Takes priority over `focused` for color selection.
    pub flashing: bool,
    /// Whether to draw a close button in the top-right corner.
    pub show_close: bool,
    /// Whether to draw a minimize button beside the close button.
    pub show_minimize: bool,
    /// Scrollbar thumb state, if the content scrolls.
    pub scrollbar: Option<ScrollbarInfoKey>,
}

/// Hashable projection of [`ScrollbarInfo`] used as part of the cache key
/// (floats aren't involved, so the raw fields suffice).
pub type ScrollbarInfoKey = ScrollbarInfo;

/// Renders window chrome, caching the last-built grid so an unchanged
/// frame (same title, size, focus, and scroll position) is a cache hit
/// rather than a full redraw.
pub struct BorderRenderer {
    cache: Mutex<Option<(BorderSpec, Grid)>>,
}

impl BorderRenderer {
    /// A renderer with an empty cache.
    pub fn new() -> Self {
        Self { cache: Mutex::new(None) }
    }

    /// Render (or reuse a cached) border grid for `spec`.
    pub fn render(&self, spec: &BorderSpec, theme: &Theme) -> Grid {
        let mut guard = self.cache.lock().unwrap_or_else(|p| p.into_inner());
        if let Some((cached_spec, cached_grid)) = guard.as_ref() {
            if cached_spec == spec {
                return cached_grid.clone();
            }
        }
        let grid = build(spec, theme);
        *guard = Some((spec.clone(), grid.clone()));
        grid
    }
}

impl Default for BorderRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn build(spec: &BorderSpec, theme: &Theme) -> Grid {
    let mut grid = Grid::new(spec.width, spec.height);
    if spec.width < 2 || spec.height < 2 {
        return grid;
    }
    let color = if spec.flashing {
        theme.modal_flash
    } else if spec.focused {
        theme.border_active
    } else {
        theme.border_inactive
    };
    grid.draw_box(Rect::new(0, 0, spec.width, spec.height), BOX_CHARS, Some(color), None);

    draw_title(&mut grid, spec, color);
    draw_buttons(&mut grid, spec, theme);
    if let Some(info) = spec.scrollbar {
        draw_scrollbar(&mut grid, spec, info, color);
    }
    grid
}

fn draw_title(grid: &mut Grid, spec: &BorderSpec, color: crate::color::Color) {
    let reserved = reserved_button_cells(spec);
    let available = spec.width.saturating_sub(4 + reserved);
    if available == 0 {
        return;
    }
    let truncated = truncate_markup(&spec.title, available as usize);
    if truncated.is_empty() {
        return;
    }
    grid.write_clipped(2, 0, &truncated, Some(color), None, Rect::new(2, 0, available, 1));
}

fn reserved_button_cells(spec: &BorderSpec) -> u16 {
    u16::from(spec.show_close) + u16::from(spec.show_minimize)
}

fn draw_buttons(grid: &mut Grid, spec: &BorderSpec, theme: &Theme) {
    let mut x = spec.width.saturating_sub(2);
    if spec.show_close {
        let _ = grid.set(x, 0, crate::cell::Cell::new(CLOSE_GLYPH, Style::new().fg(theme.button.0)));
        x = x.saturating_sub(1);
    }
    if spec.show_minimize {
        let _ = grid.set(x, 0, crate::cell::Cell::new(MINIMIZE_GLYPH, Style::new().fg(theme.button.0)));
    }
}

fn draw_scrollbar(grid: &mut Grid, spec: &BorderSpec, info: ScrollbarInfo, color: crate::color::Color) {
    if spec.height < 3 || info.content_height <= info.viewport_height {
        return;
    }
    let track_height = spec.height - 2;
    let x = spec.width.saturating_sub(1);
    let thumb_size = ((info.viewport_height as u32 * track_height as u32) / info.content_height as u32)
        .max(1)
        .min(track_height as u32) as u16;
    let max_scroll = info.content_height.saturating_sub(info.viewport_height);
    let thumb_offset = if max_scroll == 0 {
        0
    } else {
        ((info.scroll_y as u32 * (track_height - thumb_size) as u32) / max_scroll as u32) as u16
    };

    for row in 0..track_height {
        let is_thumb = row >= thumb_offset && row < thumb_offset + thumb_size;
        let ch = if is_thumb { SCROLLBAR_THUMB } else { SCROLLBAR_TRACK };
        let _ = grid.set(x, row + 1, crate::cell::Cell::new(ch, Style::new().fg(color)));
    }
}

//! C2 — the double buffer: front/back grids, dirty tracking, and flush.

use std::collections::BTreeSet;

use crate::cell::Cell;
use crate::color::ColorSupport;
use crate::geometry::{Position, Rect, Size};
use crate::grid::Grid;
use crate::style::Style;

/// How a [`ConsoleBuffer`] emits a dirty row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlushMode {
    /// Re-emit the entire row whenever any cell in it changed.
    Line,
    /// Emit only the runs of cells that actually changed.
    Cell,
}

/// Front/back double buffer with per-line dirty tracking.
///
/// Invariant: after a successful [`ConsoleBuffer::flush`], `front` equals
/// `back` cell-for-cell and there are no dirty lines left.
pub struct ConsoleBuffer {
    front: Grid,
    back: Grid,
    dirty_lines: BTreeSet<u16>,
    mode: FlushMode,
    color_support: ColorSupport,
    /// Cursor position last written, to avoid redundant positioning escapes.
    last_cursor: Option<Position>,
}

impl ConsoleBuffer {
    /// Create a buffer of the given size.
    pub fn new(size: Size, mode: FlushMode, color_support: ColorSupport) -> Self {
        Self {
            front: Grid::new(size.width, size.height),
            back: Grid::new(size.width, size.height),
            dirty_lines: BTreeSet::new(),
            mode,
            color_support,
            last_cursor: None,
        }
    }

    /// Mutable access to the back buffer for staging the next frame.
    pub fn back_mut(&mut self) -> &mut Grid {
        &mut self.back
    }

    /// Read-only access to the back buffer.
    pub fn back(&self) -> &Grid {
        &self.back
    }

    /// Read-only access to the front buffer (what the terminal currently
    /// shows, as far as this buffer knows).
    pub fn front(&self) -> &Grid {
        &self.front
    }

    /// Overwrite row `y` of the back buffer starting at column 0 and mark it
    /// dirty if it actually differs afterward (checked at flush time).
    pub fn stage_line(&mut self, y: u16, text: &str) {
        self.back.write(0, y, text, None, None);
        self.dirty_lines.insert(y);
    }

    /// Write `text` into the back buffer starting at `(x, y)`.
    pub fn stage_at(&mut self, x: u16, y: u16, text: &str) {
        self.back.write(x, y, text, None, None);
        self.dirty_lines.insert(y);
    }

    /// Mark a row dirty without writing to it (e.g. after an external
    /// compositor mutation of the back buffer).
    pub fn mark_dirty(&mut self, y: u16) {
        self.dirty_lines.insert(y);
    }

    /// Resize both buffers, preserving overlap.
    pub fn resize(&mut self, size: Size) {
        self.front.resize(size.width, size.height);
        self.back.resize(size.width, size.height);
        self.dirty_lines = (0..size.height).collect();
        self.last_cursor = None;
    }

    /// Diff front vs. back for dirty lines and emit ANSI text, then copy
    /// back -> front and clear the dirty set. Returns the emitted bytes
    /// (empty if nothing changed, satisfying the no-op-frame invariant).
    pub fn flush(&mut self) -> String {
        let mut out = String::new();
        let dirty: Vec<u16> = self.dirty_lines.iter().copied().collect();
        self.dirty_lines.clear();

        for y in dirty {
            let changed = row_changed(&self.front, &self.back, y);
            if !changed {
                continue;
            }
            match self.mode {
                FlushMode::Line => self.flush_line(&mut out, y),
                FlushMode::Cell => self.flush_cell_runs(&mut out, y),
            }
            copy_row(&mut self.front, &self.back, y);
        }
        out
    }

    fn flush_line(&mut self, out: &mut String, y: u16) {
        move_cursor(out, &mut self.last_cursor, Position::new(0, y));
        let mut prev_style = Style::default();
        let mut opened = false;
        for x in 0..self.back.width() {
            let Ok(cell) = self.back.get(x, y) else { continue };
            if cell.is_continuation() {
                continue;
            }
            if let Some(escape) = &cell.ansi_escape {
                out.push_str(escape);
            }
            write_style_diff(out, &prev_style, &cell.attrs, self.color_support);
            if !cell.attrs.is_empty() {
                opened = true;
            }
            out.push(cell.char);
            prev_style = cell.attrs;
        }
        out.push_str(self.back.trailing_escape(y));
        if opened {
            out.push_str("\x1b[0m");
        }
    }

    fn flush_cell_runs(&mut self, out: &mut String, y: u16) {
        let width = self.back.width();
        let mut x = 0u16;
        while x < width {
            let Ok(front_cell) = self.front.get(x, y) else { break };
            let Ok(back_cell) = self.back.get(x, y) else { break };
            if front_cell == back_cell {
                x += 1;
                continue;
            }
            // Start of a differing run: extend while cells keep differing.
            let run_start = x;
            let mut prev_style = Style::default();
            move_cursor(out, &mut self.last_cursor, Position::new(run_start, y));
            let mut opened = false;
            while x < width {
                let Ok(f) = self.front.get(x, y) else { break };
                let Ok(b) = self.back.get(x, y) else { break };
                if f == b {
                    break;
                }
                if b.is_continuation() {
                    x += 1;
                    continue;
                }
                if let Some(escape) = &b.ansi_escape {
                    out.push_str(escape);
                }
                write_style_diff(out, &prev_style, &b.attrs, self.color_support);
                if !b.attrs.is_empty() {
                    opened = true;
                }
                out.push(b.char);
                prev_style = b.attrs;
                x += b.width.max(1) as u16;
                self.last_cursor = Some(Position::new(x, y));
            }
            if opened {
                out.push_str("\x1b[0m");
            }
        }
    }
}

fn row_changed(front: &Grid, back: &Grid, y: u16) -> bool {
    for x in 0..front.width() {
        match (front.get(x, y), back.get(x, y)) {
            (Ok(a), Ok(b)) if a != b => return true,
            (Ok(_), Ok(_)) => {}
            _ => return true,
        }
    }
    front.trailing_escape(y) != back.trailing_escape(y)
}

fn copy_row(front: &mut Grid, back: &Grid, y: u16) {
    for x in 0..front.width() {
        if let Ok(cell) = back.get(x, y) {
            let _ = front.set(x, y, cell.clone());
        }
    }
}

fn move_cursor(out: &mut String, last: &mut Option<Position>, pos: Position) {
    if *last == Some(pos) {
        return;
    }
    out.push_str(&format!("\x1b[{};{}H", pos.y + 1, pos.x + 1));
    *last = Some(pos);
}

/// Emit the SGR codes needed to go from `prev` to `next`. If an attribute
/// turned off, emit a full reset first (cheaper and correct, since SGR has
/// no single-attribute-off codes for every attribute uniformly).
fn write_style_diff(out: &mut String, prev: &Style, next: &Style, support: ColorSupport) {
    if next.needs_reset_from(prev) {
        out.push_str("\x1b[0m");
        out.push_str(&build_sgr_sequence(next, support));
        return;
    }
    if next == prev {
        return;
    }
    out.push_str(&build_sgr_sequence(next, support));
}

/// Build one combined SGR escape for `style`'s active attributes/colors, or
/// an empty string if the style has nothing to set.
pub fn build_sgr_sequence(style: &Style, support: ColorSupport) -> String {
    let mut codes: Vec<String> = Vec::new();
    if style.bold {
        codes.push("1".into());
    }
    if style.dim {
        codes.push("2".into());
    }
    if style.italic {
        codes.push("3".into());
    }
    if style.underline {
        codes.push("4".into());
    }
    if style.reverse {
        codes.push("7".into());
    }
    if style.strikethrough {
        codes.push("9".into());
    }
    if let Some(fg) = style.fg {
        push_color_codes(&mut codes, fg.downgrade(support), true);
    }
    if let Some(bg) = style.bg {
        push_color_codes(&mut codes, bg.downgrade(support), false);
    }
    if codes.is_empty() {
        String::new()
    } else {
        format!("\x1b[{}m", codes.join(";"))
    }
}

fn push_color_codes(codes: &mut Vec<String>, color: crate::color::Color, is_fg: bool) {
    use crate::color::{Color, NamedColor};
    match color {
        Color::Rgb { r, g, b } => codes.push(format!("{};2;{r};{g};{b}", if is_fg { 38 } else { 48 })),
        Color::Indexed(i) => codes.push(format!("{};5;{i}", if is_fg { 38 } else { 48 })),
        Color::Named(n) => codes.push(named_code(n, is_fg).to_string()),
        Color::Reset => {}
    }
}

fn named_code(n: crate::color::NamedColor, is_fg: bool) -> u8 {
    use crate::color::NamedColor::*;
    let base = if is_fg { 30 } else { 40 };
    let bright_base = if is_fg { 90 } else { 100 };
    match n {
        Black => base,
        Red => base + 1,
        Green => base + 2,
        Yellow => base + 3,
        Blue => base + 4,
        Magenta => base + 5,
        Cyan => base + 6,
        White => base + 7,
        BrightBlack => bright_base,
        BrightRed => bright_base + 1,
        BrightGreen => bright_base + 2,
        BrightYellow => bright_base + 3,
        BrightBlue => bright_base + 4,
        BrightMagenta => bright_base + 5,
        BrightCyan => bright_base + 6,
        BrightWhite => bright_base + 7,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(mode: FlushMode) -> ConsoleBuffer {
        ConsoleBuffer::new(Size::new(10, 3), mode, ColorSupport::TrueColor)
    }

    #[test]
    fn no_op_frame_emits_zero_bytes_line_mode() {
        let mut b = buf(FlushMode::Line);
        b.stage_line(0, "hello");
        let first = b.flush();
        assert!(!first.is_empty());
        // Second flush with no staged changes: nothing dirty, nothing emitted.
        assert_eq!(b.flush(), "");
    }

    #[test]
    fn no_op_frame_emits_zero_bytes_cell_mode() {
        let mut b = buf(FlushMode::Cell);
        b.stage_at(0, 0, "hello");
        let first = b.flush();
        assert!(!first.is_empty());
        assert_eq!(b.flush(), "");
    }

    #[test]
    fn buffer_equivalence_after_flush() {
        let mut b = buf(FlushMode::Cell);
        b.stage_at(2, 1, "hi");
        b.flush();
        for y in 0..3 {
            for x in 0..10 {
                assert_eq!(b.front().get(x, y).unwrap(), b.back().get(x, y).unwrap());
            }
        }
    }

    #[test]
    fn single_char_change_is_cell_mode_minimal() {
        let mut b = buf(FlushMode::Cell);
        b.stage_at(0, 0, "ABCDEF");
        b.flush();
        b.stage_at(2, 0, "X"); // change C -> X
        let out = b.flush();
        assert!(out.contains('X'));
        assert!(!out.contains("ABCDEF"));
    }

    #[test]
    fn resize_marks_all_dirty() {
        let mut b = buf(FlushMode::Cell);
        b.flush();
        b.resize(Size::new(20, 5));
        assert_eq!(b.back().width(), 20);
    }

    #[test]
    fn build_sgr_sequence_empty_for_default_style() {
        assert_eq!(build_sgr_sequence(&Style::default(), ColorSupport::TrueColor), "");
    }

    #[test]
    fn build_sgr_sequence_combines_attrs() {
        let style = Style::new().bold(true).underline(true);
        let seq = build_sgr_sequence(&style, ColorSupport::TrueColor);
        assert!(seq.starts_with("\x1b["));
        assert!(seq.contains('1'));
        assert!(seq.contains('4'));
    }
}

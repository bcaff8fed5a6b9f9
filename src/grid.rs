//! C1 — the character grid: the drawing surface windows and chrome paint into.

use unicode_segmentation::UnicodeSegmentation;

use crate::cell::Cell;
use crate::color::Color;
use crate::error::{Result, WmError};
use crate::geometry::Rect;
use crate::style::Style;

/// A width x height matrix of [`Cell`]s.
///
/// All drawing operations except [`Grid::get`]/[`Grid::set`] clip silently:
/// content outside the grid bounds is simply dropped rather than erroring.
/// `get`/`set` fail with [`WmError::InvalidBounds`] on out-of-range explicit
/// coordinates, since those are almost always a programmer error.
#[derive(Clone, Debug)]
pub struct Grid {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
    /// Escape sequences that occur after the last visible character on a
    /// row (e.g. a trailing reset); emitted after the row's last cell.
    trailing_escapes: Vec<String>,
}

impl Grid {
    /// Create a new grid filled with blank cells.
    pub fn new(width: u16, height: u16) -> Self {
        let count = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![Cell::blank(); count],
            trailing_escapes: vec![String::new(); height as usize],
        }
    }

    /// Grid width in columns.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Grid height in rows.
    pub fn height(&self) -> u16 {
        self.height
    }

    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Read the cell at `(x, y)`.
    pub fn get(&self, x: u16, y: u16) -> Result<&Cell> {
        self.index(x, y)
            .map(|i| &self.cells[i])
            .ok_or_else(|| WmError::InvalidBounds(format!("get({x},{y}) outside {}x{}", self.width, self.height)))
    }

    /// Overwrite the cell at `(x, y)`.
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) -> Result<()> {
        let i = self
            .index(x, y)
            .ok_or_else(|| WmError::InvalidBounds(format!("set({x},{y}) outside {}x{}", self.width, self.height)))?;
        self.cells[i] = cell;
        Ok(())
    }

    /// Trailing escape sequence for row `y`, if any.
    pub fn trailing_escape(&self, y: u16) -> &str {
        self.trailing_escapes
            .get(y as usize)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Write `text` at `(x, y)`, clipped silently to the grid. Embedded ANSI
    /// escape sequences are absorbed: bytes matching `ESC [ ... letter` are
    /// not drawn as cells but attached as an `ansi_escape` prefix on the
    /// grapheme that follows them (or, if they occur after the last visible
    /// grapheme, recorded as the row's trailing escape).
    pub fn write(&mut self, x: u16, y: u16, text: &str, fg: Option<Color>, bg: Option<Color>) {
        self.write_clipped(x, y, text, fg, bg, Rect::new(0, 0, self.width, self.height));
    }

    /// Like [`Grid::write`] but additionally clips to `clip` (e.g. a
    /// window's content viewport) on top of the grid bounds.
    pub fn write_clipped(
        &mut self,
        x: u16,
        y: u16,
        text: &str,
        fg: Option<Color>,
        bg: Option<Color>,
        clip: Rect,
    ) {
        if y >= self.height || y < clip.top() || y >= clip.bottom() {
            return;
        }
        let style = Style { fg, bg, ..Style::default() };
        let (tokens, trailing) = tokenize_ansi(text);

        let mut col = x;
        for (escape, grapheme) in tokens {
            if col >= self.width || col >= clip.right() {
                break;
            }
            if col >= clip.left() {
                let ch = grapheme.chars().next().unwrap_or(' ');
                let mut cell = Cell::new(ch, style);
                if let Some(esc) = escape {
                    cell = cell.with_ansi_escape(esc);
                }
                let width = cell.width.max(1);
                let _ = self.set(col, y, cell);
                if width > 1 {
                    let _ = self.set(col + 1, y, Cell::continuation());
                }
                col += width as u16;
            } else {
                col += 1;
            }
        }
        if let Some(trailing) = trailing {
            if let Some(slot) = self.trailing_escapes.get_mut(y as usize) {
                slot.push_str(&trailing);
            }
        }
    }

    /// Fill `rect` with `ch`/`fg`/`bg`, clipped to the grid.
    pub fn fill(&mut self, rect: Rect, ch: char, fg: Option<Color>, bg: Option<Color>) {
        let style = Style { fg, bg, ..Style::default() };
        for y in rect.top()..rect.bottom().min(self.height) {
            for x in rect.left()..rect.right().min(self.width) {
                let _ = self.set(x, y, Cell::new(ch, style));
            }
        }
    }

    /// Draw a horizontal run of `len` cells starting at `(x, y)`.
    pub fn hline(&mut self, x: u16, y: u16, len: u16, ch: char, fg: Option<Color>, bg: Option<Color>) {
        let style = Style { fg, bg, ..Style::default() };
        for dx in 0..len {
            let cx = x.saturating_add(dx);
            if cx < self.width && y < self.height {
                let _ = self.set(cx, y, Cell::new(ch, style));
            }
        }
    }

    /// Draw a vertical run of `len` cells starting at `(x, y)`.
    pub fn vline(&mut self, x: u16, y: u16, len: u16, ch: char, fg: Option<Color>, bg: Option<Color>) {
        let style = Style { fg, bg, ..Style::default() };
        for dy in 0..len {
            let cy = y.saturating_add(dy);
            if x < self.width && cy < self.height {
                let _ = self.set(x, cy, Cell::new(ch, style));
            }
        }
    }

    /// Draw a box outline using `chars` = (top-left, top-right, bottom-left,
    /// bottom-right, horizontal, vertical), clipped to the grid.
    pub fn draw_box(
        &mut self,
        rect: Rect,
        chars: (char, char, char, char, char, char),
        fg: Option<Color>,
        bg: Option<Color>,
    ) {
        if rect.is_empty() {
            return;
        }
        let (tl, tr, bl, br, h, v) = chars;
        let style = Style { fg, bg, ..Style::default() };
        let (x1, y1) = (rect.left(), rect.top());
        let x2 = rect.right().saturating_sub(1);
        let y2 = rect.bottom().saturating_sub(1);

        let _ = self.set(x1, y1, Cell::new(tl, style));
        if x2 != x1 {
            let _ = self.set(x2, y1, Cell::new(tr, style));
        }
        if y2 != y1 {
            let _ = self.set(x1, y2, Cell::new(bl, style));
        }
        if x2 != x1 && y2 != y1 {
            let _ = self.set(x2, y2, Cell::new(br, style));
        }
        if x2 > x1 {
            self.hline(x1 + 1, y1, x2 - x1 - 1, h, fg, bg);
            if y2 != y1 {
                self.hline(x1 + 1, y2, x2 - x1 - 1, h, fg, bg);
            }
        }
        if y2 > y1 {
            self.vline(x1, y1 + 1, y2 - y1 - 1, v, fg, bg);
            if x2 != x1 {
                self.vline(x2, y1 + 1, y2 - y1 - 1, v, fg, bg);
            }
        }
    }

    /// Clear the full grid to blank cells with the given background.
    pub fn clear(&mut self, bg: Option<Color>) {
        let rect = Rect::new(0, 0, self.width, self.height);
        self.clear_rect(rect, bg);
    }

    /// Clear `rect` to blank cells with the given background.
    pub fn clear_rect(&mut self, rect: Rect, bg: Option<Color>) {
        let style = Style { bg, ..Style::default() };
        for y in rect.top()..rect.bottom().min(self.height) {
            for x in rect.left()..rect.right().min(self.width) {
                let _ = self.set(x, y, Cell::new(' ', style));
            }
        }
    }

    /// Resize the grid, preserving the overlapping region and filling new
    /// area with blank cells.
    pub fn resize(&mut self, width: u16, height: u16) {
        let mut new = Grid::new(width, height);
        for y in 0..self.height.min(height) {
            for x in 0..self.width.min(width) {
                if let Ok(cell) = self.get(x, y) {
                    let _ = new.set(x, y, cell.clone());
                }
            }
            new.trailing_escapes[y as usize] = self.trailing_escapes[y as usize].clone();
        }
        *self = new;
    }
}

/// Split `text` into `(escape-before-this-grapheme, grapheme)` pairs plus
/// any escape sequence occurring after the last grapheme (the trailing
/// escape for the row). ANSI escapes (`ESC [ ... letter`) are absorbed
/// rather than drawn; each one is attached to the grapheme that follows it.
fn tokenize_ansi(text: &str) -> (Vec<(Option<String>, &str)>, Option<String>) {
    let mut tokens = Vec::new();
    let mut pending = String::new();

    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == 0x1b && i + 1 < bytes.len() && bytes[i + 1] == b'[' {
            let start = i;
            i += 2;
            while i < bytes.len() && !bytes[i].is_ascii_alphabetic() {
                i += 1;
            }
            if i < bytes.len() {
                i += 1; // consume the final letter
            }
            pending.push_str(&text[start..i]);
            continue;
        }
        let rest = &text[i..];
        let Some(g) = rest.graphemes(true).next() else {
            break;
        };
        let escape = if pending.is_empty() { None } else { Some(std::mem::take(&mut pending)) };
        tokens.push((escape, g));
        i += g.len();
    }
    let trailing = if pending.is_empty() { None } else { Some(pending) };
    (tokens, trailing)
}

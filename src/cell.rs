//! Cell — the fundamental unit of the character grid.

use crate::style::Style;

/// One character position in a [`crate::grid::Grid`].
///
/// `char` is always a printable codepoint, even for cells produced by
/// passing raw ANSI through (see [`Cell::with_ansi_escape`]): the escape
/// itself lives in `ansi_escape` and is emitted verbatim immediately before
/// the codepoint, never in place of it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    /// The Unicode scalar value displayed in this cell.
    pub char: char,
    /// Foreground color.
    pub fg: Option<crate::color::Color>,
    /// Background color.
    pub bg: Option<crate::color::Color>,
    /// Style attributes (bold, underline, ...).
    pub attrs: Style,
    /// Raw ANSI escape sequence to emit verbatim immediately before `char`,
    /// for content that embeds escapes the grid should pass through rather
    /// than interpret (see [`crate::grid::Grid::write`]).
    pub ansi_escape: Option<String>,
    /// Display width: 1 for most characters, 2 for wide CJK/emoji, 0 for a
    /// continuation cell (the second column of a wide character).
    pub width: u8,
    /// Set whenever this cell is mutated; cleared by [`crate::buffer`] flush.
    pub dirty: bool,
}

impl Cell {
    /// Create a cell from a character and style, auto-detecting width.
    pub fn new(ch: char, attrs: Style) -> Self {
        let width = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0) as u8;
        Self {
            char: ch,
            fg: attrs.fg,
            bg: attrs.bg,
            attrs,
            ansi_escape: None,
            width,
            dirty: true,
        }
    }

    /// A blank cell: space, default style, width 1, not dirty.
    pub fn blank() -> Self {
        Self {
            char: ' ',
            fg: None,
            bg: None,
            attrs: Style::default(),
            ansi_escape: None,
            width: 1,
            dirty: false,
        }
    }

    /// Attach a raw ANSI escape prefix to this cell (builder pattern).
    #[must_use]
    pub fn with_ansi_escape(mut self, escape: impl Into<String>) -> Self {
        self.ansi_escape = Some(escape.into());
        self
    }

    /// The second, width-0 cell of a wide character.
    pub fn continuation() -> Self {
        Self {
            char: '\0',
            fg: None,
            bg: None,
            attrs: Style::default(),
            ansi_escape: None,
            width: 0,
            dirty: true,
        }
    }

    /// True if this is a blank cell (space, no style, no escape).
    pub fn is_blank(&self) -> bool {
        self.char == ' ' && self.attrs.is_empty() && self.ansi_escape.is_none() && self.width == 1
    }

    /// True if this cell occupies more than one column.
    pub fn is_wide(&self) -> bool {
        self.width > 1
    }

    /// True if this is a continuation cell (the second half of a wide char).
    pub fn is_continuation(&self) -> bool {
        self.width == 0
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_cell() {
        let c = Cell::blank();
        assert!(c.is_blank());
        assert_eq!(c.width, 1);
        assert!(!c.dirty);
    }

    #[test]
    fn ascii_cell() {
        let c = Cell::new('A', Style::default());
        assert_eq!(c.width, 1);
        assert!(!c.is_wide());
        assert!(c.dirty);
    }

    #[test]
    fn cjk_cell_is_wide() {
        let c = Cell::new('\u{4e16}', Style::default());
        assert_eq!(c.width, 2);
        assert!(c.is_wide());
    }

    #[test]
    fn combining_mark_is_zero_width() {
        let c = Cell::new('\u{0301}', Style::default());
        assert_eq!(c.width, 0);
    }

    #[test]
    fn continuation_cell_is_zero_width_and_empty() {
        let c = Cell::continuation();
        assert!(c.is_continuation());
        assert_eq!(c.width, 0);
    }

    #[test]
    fn ansi_escape_passthrough_preserves_printable_char() {
        let c = Cell::new('X', Style::default()).with_ansi_escape("\x1b[38;5;196m");
        assert_eq!(c.char, 'X');
        assert_eq!(c.ansi_escape.as_deref(), Some("\x1b[38;5;196m"));
    }

    #[test]
    fn styled_space_is_not_blank() {
        use crate::color::{Color, NamedColor};
        let c = Cell::new(' ', Style::new().fg(Color::Named(NamedColor::Red)));
        assert!(!c.is_blank());
    }
}

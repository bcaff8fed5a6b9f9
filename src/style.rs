//! Per-cell style attributes.

use crate::color::Color;

/// Style attributes carried by a [`crate::cell::Cell`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Style {
    /// Foreground color.
    pub fg: Option<Color>,
    /// Background color.
    pub bg: Option<Color>,
    /// Bold text.
    pub bold: bool,
    /// Italic text.
    pub italic: bool,
    /// Underlined text.
    pub underline: bool,
    /// Strikethrough text.
    pub strikethrough: bool,
    /// Dim/faint text.
    pub dim: bool,
    /// Reverse video.
    pub reverse: bool,
}

impl Style {
    /// An empty style with no attributes set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the foreground color.
    #[must_use]
    pub fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    /// Set the background color.
    #[must_use]
    pub fn bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    /// Set bold.
    #[must_use]
    pub fn bold(mut self, val: bool) -> Self {
        self.bold = val;
        self
    }

    /// Set underline.
    #[must_use]
    pub fn underline(mut self, val: bool) -> Self {
        self.underline = val;
        self
    }

    /// Set reverse video.
    #[must_use]
    pub fn reverse(mut self, val: bool) -> Self {
        self.reverse = val;
        self
    }

    /// Merge `other` on top of this style; `other`'s set fields win.
    #[must_use]
    pub fn merge(&self, other: &Style) -> Style {
        Style {
            fg: other.fg.or(self.fg),
            bg: other.bg.or(self.bg),
            bold: other.bold || self.bold,
            italic: other.italic || self.italic,
            underline: other.underline || self.underline,
            strikethrough: other.strikethrough || self.strikethrough,
            dim: other.dim || self.dim,
            reverse: other.reverse || self.reverse,
        }
    }

    /// True if no attributes are set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// True if turning this style off (attribute went true -> false relative
    /// to `prev`) requires a full SGR reset rather than an incremental code.
    pub fn needs_reset_from(&self, prev: &Style) -> bool {
        (prev.bold && !self.bold)
            || (prev.italic && !self.italic)
            || (prev.underline && !self.underline)
            || (prev.strikethrough && !self.strikethrough)
            || (prev.dim && !self.dim)
            || (prev.reverse && !self.reverse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::NamedColor;

    #[test]
    fn builder_pattern() {
        let s = Style::new().fg(Color::Named(NamedColor::Red)).bold(true);
        assert_eq!(s.fg, Some(Color::Named(NamedColor::Red)));
        assert!(s.bold);
    }

    #[test]
    fn default_is_empty() {
        assert!(Style::new().is_empty());
    }

    #[test]
    fn merge_fg_override() {
        let base = Style::new().fg(Color::Named(NamedColor::Red));
        let over = Style::new().fg(Color::Named(NamedColor::Blue));
        assert_eq!(base.merge(&over).fg, Some(Color::Named(NamedColor::Blue)));
    }

    #[test]
    fn needs_reset_when_attr_turned_off() {
        let prev = Style::new().bold(true);
        let next = Style::new();
        assert!(next.needs_reset_from(&prev));
    }

    #[test]
    fn no_reset_when_attrs_only_added() {
        let prev = Style::new();
        let next = Style::new().bold(true);
        assert!(!next.needs_reset_from(&prev));
    }
}

//! Desktop and chrome color fallbacks, dependency-injected into the system.

use crate::color::{Color, NamedColor};

/// Default colors a window falls back to when it hasn't set its own. Built
/// once by the embedding application and handed to the system at
/// construction rather than read from global state.
#[derive(Clone, Debug)]
pub struct Theme {
    /// Desktop background fill character.
    pub desktop_char: char,
    /// Desktop background color.
    pub desktop_bg: Color,
    /// Top status bar colors.
    pub top_bar: (Color, Color),
    /// Bottom status bar colors.
    pub bottom_bar: (Color, Color),
    /// Border color when a window is active.
    pub border_active: Color,
    /// Border color when a window is inactive.
    pub border_inactive: Color,
    /// Button palette (normal, hovered).
    pub button: (Color, Color),
    /// Modal "blocked parent" flash color.
    pub modal_flash: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            desktop_char: '\u{2591}',
            desktop_bg: Color::Named(NamedColor::Blue),
            top_bar: (Color::Named(NamedColor::Black), Color::Named(NamedColor::White)),
            bottom_bar: (Color::Named(NamedColor::Black), Color::Named(NamedColor::White)),
            border_active: Color::Named(NamedColor::BrightWhite),
            border_inactive: Color::Named(NamedColor::BrightBlack),
            button: (Color::Named(NamedColor::White), Color::Named(NamedColor::Yellow)),
            modal_flash: Color::Named(NamedColor::BrightYellow),
        }
    }
}

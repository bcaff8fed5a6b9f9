//! Input event types, independent of any particular terminal driver.

use std::fmt;

/// A terminal input event, as delivered by the driver (see [`crate::terminal::Terminal`]).
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// A mouse event occurred.
    Mouse(MouseEvent),
    /// The terminal was resized to (width, height).
    Resize(u16, u16),
    /// Text was pasted (bracketed paste mode).
    Paste(String),
}

/// A keyboard event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code.
    pub code: KeyCode,
    /// Active modifiers.
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// Create a new key event.
    pub fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    /// Create a plain key event with no modifiers.
    pub fn plain(code: KeyCode) -> Self {
        Self { code, modifiers: Modifiers::NONE }
    }

    /// True if Ctrl is held.
    pub fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// True if Alt is held.
    pub fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    /// True if Shift is held.
    pub fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }
}

/// A key code.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum KeyCode {
    /// A character key.
    Char(char),
    /// Enter / Return.
    Enter,
    /// Tab.
    Tab,
    /// Backspace.
    Backspace,
    /// Delete.
    Delete,
    /// Escape.
    Escape,
    /// Arrow up.
    Up,
    /// Arrow down.
    Down,
    /// Arrow left.
    Left,
    /// Arrow right.
    Right,
    /// Home.
    Home,
    /// End.
    End,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// Function key (F1-F12).
    F(u8),
}

/// Keyboard modifier flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Modifiers(u8);

impl Modifiers {
    /// No modifiers.
    pub const NONE: Self = Self(0);
    /// Shift.
    pub const SHIFT: Self = Self(1);
    /// Ctrl.
    pub const CTRL: Self = Self(2);
    /// Alt/Option.
    pub const ALT: Self = Self(4);

    /// True if this set contains `other`.
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0 && other.0 != 0
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Which mouse button (or wheel) an event concerns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseButton {
    /// Primary (usually left) button.
    Button1,
    /// Secondary (usually right) button.
    Button2,
    /// Middle button.
    Button3,
    /// Fourth button (rarely present).
    Button4,
}

/// The kind of mouse event, including click-discrimination states the
/// dispatcher's click-target cache (C10) depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum MouseEventKind {
    /// A button went down.
    Pressed(MouseButton),
    /// A button went up.
    Released(MouseButton),
    /// A full press+release at the same target resolved to a single click.
    Clicked(MouseButton),
    /// Two clicks within the double-click window at a stable target.
    DoubleClicked(MouseButton),
    /// Three clicks within the double-click window at a stable target.
    TripleClicked(MouseButton),
    /// The mouse moved while reporting motion (drag or hover tracking).
    Moved,
    /// The pointer entered a control's bounds.
    Enter,
    /// The pointer left a control's bounds.
    Leave,
    /// Scroll wheel up.
    WheelUp,
    /// Scroll wheel down.
    WheelDown,
}

/// A mouse event in absolute screen coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MouseEvent {
    /// The kind of mouse event.
    pub kind: MouseEventKind,
    /// Column (0-based, absolute screen space).
    pub x: u16,
    /// Row (0-based, absolute screen space).
    pub y: u16,
    /// Active modifiers.
    pub modifiers: Modifiers,
}

// --- crossterm conversions ---

impl From<crossterm::event::Event> for Event {
    fn from(ct: crossterm::event::Event) -> Self {
        match ct {
            crossterm::event::Event::Key(key) => Event::Key(key.into()),
            crossterm::event::Event::Mouse(mouse) => Event::Mouse(mouse.into()),
            crossterm::event::Event::Resize(w, h) => Event::Resize(w, h),
            crossterm::event::Event::Paste(text) => Event::Paste(text),
            _ => Event::Key(KeyEvent::plain(KeyCode::Escape)),
        }
    }
}

impl From<crossterm::event::KeyEvent> for KeyEvent {
    fn from(ct: crossterm::event::KeyEvent) -> Self {
        Self { code: ct.code.into(), modifiers: ct.modifiers.into() }
    }
}

impl From<crossterm::event::KeyCode> for KeyCode {
    fn from(ct: crossterm::event::KeyCode) -> Self {
        match ct {
            crossterm::event::KeyCode::Char(c) => KeyCode::Char(c),
            crossterm::event::KeyCode::Enter => KeyCode::Enter,
            crossterm::event::KeyCode::Tab => KeyCode::Tab,
            crossterm::event::KeyCode::Backspace => KeyCode::Backspace,
            crossterm::event::KeyCode::Delete => KeyCode::Delete,
            crossterm::event::KeyCode::Esc => KeyCode::Escape,
            crossterm::event::KeyCode::Up => KeyCode::Up,
            crossterm::event::KeyCode::Down => KeyCode::Down,
            crossterm::event::KeyCode::Left => KeyCode::Left,
            crossterm::event::KeyCode::Right => KeyCode::Right,
            crossterm::event::KeyCode::Home => KeyCode::Home,
            crossterm::event::KeyCode::End => KeyCode::End,
            crossterm::event::KeyCode::PageUp => KeyCode::PageUp,
            crossterm::event::KeyCode::PageDown => KeyCode::PageDown,
            crossterm::event::KeyCode::F(n) => KeyCode::F(n),
            _ => KeyCode::Escape,
        }
    }
}

impl From<crossterm::event::KeyModifiers> for Modifiers {
    fn from(ct: crossterm::event::KeyModifiers) -> Self {
        let mut m = Modifiers::NONE;
        if ct.contains(crossterm::event::KeyModifiers::SHIFT) {
            m = m | Modifiers::SHIFT;
        }
        if ct.contains(crossterm::event::KeyModifiers::CONTROL) {
            m = m | Modifiers::CTRL;
        }
        if ct.contains(crossterm::event::KeyModifiers::ALT) {
            m = m | Modifiers::ALT;
        }
        m
    }
}

impl From<crossterm::event::MouseEvent> for MouseEvent {
    fn from(ct: crossterm::event::MouseEvent) -> Self {
        let (kind, button) = match ct.kind {
            crossterm::event::MouseEventKind::Down(b) => (0u8, b),
            crossterm::event::MouseEventKind::Up(b) => (1u8, b),
            _ => (2u8, crossterm::event::MouseButton::Left),
        };
        let mapped_button = match button {
            crossterm::event::MouseButton::Left => MouseButton::Button1,
            crossterm::event::MouseButton::Right => MouseButton::Button2,
            crossterm::event::MouseButton::Middle => MouseButton::Button3,
        };
        let mapped_kind = match (kind, ct.kind) {
            (0, _) => MouseEventKind::Pressed(mapped_button),
            (1, _) => MouseEventKind::Released(mapped_button),
            (_, crossterm::event::MouseEventKind::Drag(_)) => MouseEventKind::Moved,
            (_, crossterm::event::MouseEventKind::Moved) => MouseEventKind::Moved,
            (_, crossterm::event::MouseEventKind::ScrollUp) => MouseEventKind::WheelUp,
            (_, crossterm::event::MouseEventKind::ScrollDown) => MouseEventKind::WheelDown,
            _ => MouseEventKind::Moved,
        };
        Self { kind: mapped_kind, x: ct.column, y: ct.row, modifiers: ct.modifiers.into() }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::Enter => write!(f, "Enter"),
            KeyCode::Tab => write!(f, "Tab"),
            KeyCode::Backspace => write!(f, "Backspace"),
            KeyCode::Delete => write!(f, "Delete"),
            KeyCode::Escape => write!(f, "Escape"),
            KeyCode::Up => write!(f, "Up"),
            KeyCode::Down => write!(f, "Down"),
            KeyCode::Left => write!(f, "Left"),
            KeyCode::Right => write!(f, "Right"),
            KeyCode::Home => write!(f, "Home"),
            KeyCode::End => write!(f, "End"),
            KeyCode::PageUp => write!(f, "PageUp"),
            KeyCode::PageDown => write!(f, "PageDown"),
            KeyCode::F(n) => write!(f, "F{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_event_modifier_queries() {
        let k = KeyEvent::new(KeyCode::Char('c'), Modifiers::CTRL);
        assert!(k.ctrl());
        assert!(!k.alt());
    }

    #[test]
    fn modifier_union() {
        let m = Modifiers::CTRL | Modifiers::SHIFT;
        assert!(m.contains(Modifiers::CTRL));
        assert!(!m.contains(Modifiers::ALT));
    }

    #[test]
    fn crossterm_key_conversion() {
        let ct = crossterm::event::KeyEvent::new(
            crossterm::event::KeyCode::Char('x'),
            crossterm::event::KeyModifiers::CONTROL,
        );
        let k: KeyEvent = ct.into();
        assert_eq!(k.code, KeyCode::Char('x'));
        assert!(k.ctrl());
    }

    #[test]
    fn crossterm_mouse_press_conversion() {
        let ct = crossterm::event::MouseEvent {
            kind: crossterm::event::MouseEventKind::Down(crossterm::event::MouseButton::Left),
            column: 5,
            row: 2,
            modifiers: crossterm::event::KeyModifiers::NONE,
        };
        let m: MouseEvent = ct.into();
        assert_eq!(m.kind, MouseEventKind::Pressed(MouseButton::Button1));
        assert_eq!((m.x, m.y), (5, 2));
    }

    #[test]
    fn keycode_display() {
        assert_eq!(format!("{}", KeyCode::Char('a')), "a");
        assert_eq!(format!("{}", KeyCode::F(1)), "F1");
    }
}

//! C10 — routes keyboard and mouse input to windows: focus management,
//! modal redirection, click-target-stable double/triple-click
//! discrimination, and the system-level key bindings (window switching,
//! moving, resizing, closing, shutdown) that sit above per-control input.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use crate::geometry::{Position, Rect};
use crate::window::{WindowId, WindowRegistry};

/// What the dispatcher decided to do with an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Routing {
    /// Deliver the event to this window.
    Deliver(WindowId),
    /// The event was consumed by the dispatcher itself (e.g. a click on a
    /// window blocked by a modal, which instead flashes the modal and is
    /// not forwarded).
    Handled,
    /// Nothing in the system wants this event.
    Unhandled,
}

/// What a system-level key binding (see [`EventDispatcher::dispatch_system_key`])
/// resolved to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SystemKeyOutcome {
    /// The dispatcher acted on the key itself (switched windows, moved or
    /// resized one, closed one); nothing further needs to happen.
    Handled,
    /// The user asked to shut down with this exit code (`Ctrl+Q`). The
    /// caller is expected to bridge this into [`crate::scheduler::Scheduler::request_shutdown`].
    Shutdown(i32),
}

/// Remembers the last completed click so a second click at the same
/// control within the double-click window promotes to `DoubleClicked`,
/// and a third promotes to `TripleClicked`. A click at a different
/// position/window, or one that arrives after the window has elapsed,
/// resets the count to one.
struct ClickCache {
    window: Option<WindowId>,
    position: Position,
    button: MouseButton,
    count: u8,
    last_at: Instant,
}

/// Keyboard focus and mouse routing for the whole window set.
pub struct EventDispatcher {
    click_cache: Mutex<Option<ClickCache>>,
    double_click_window: Duration,
}

impl EventDispatcher {
    /// Create a dispatcher with no click history yet.
    pub fn new(double_click_window: Duration) -> Self {
        Self { click_cache: Mutex::new(None), double_click_window }
    }

    /// Route a keyboard event to a window. A modal stack at the top always
    /// wins: `Escape` pops it, anything else is delivered to it. Otherwise
    /// the event goes to the registry's active window (see
    /// [`WindowRegistry::active_window`]), or is unhandled if there isn't
    /// one. System-level bindings and control-local `Tab` cycling are
    /// handled separately by [`EventDispatcher::dispatch_system_key`] and
    /// [`crate::render::WindowRenderer::process_key`] respectively — callers
    /// should try those first and only fall through to this method when
    /// neither claims the event.
    pub fn dispatch_key(&self, registry: &WindowRegistry, event: &KeyEvent) -> Routing {
        if let Some(modal) = registry.top_modal() {
            if event.code == KeyCode::Escape {
                let _ = registry.pop_modal(modal);
                return Routing::Handled;
            }
            return Routing::Deliver(modal);
        }
        match registry.active_window() {
            Some(id) => Routing::Deliver(id),
            None => Routing::Unhandled,
        }
    }

    /// Route a mouse event to the topmost window whose bounds contain it,
    /// respecting the modal stack: a click on a blocked window is consumed
    /// by the dispatcher, which also flashes the blocking modal, rather
    /// than forwarded. Clicking any unblocked window also raises and
    /// activates it, matching direct-manipulation conventions.
    pub fn dispatch_mouse(&self, registry: &WindowRegistry, event: &MouseEvent) -> Routing {
        let pos = Position::new(event.x, event.y);
        let target = registry
            .by_z_order()
            .into_iter()
            .rev()
            .find(|w| w.lock().visible && w.lock().bounds.contains(pos));

        let Some(window) = target else {
            return Routing::Unhandled;
        };

        if registry.is_blocked(window.id()) {
            if matches!(event.kind, MouseEventKind::Pressed(_)) {
                tracing::debug!(window = window.id().raw(), "click blocked by modal");
                if let Some(modal) = registry.top_modal() {
                    registry.bring_to_front(modal);
                    registry.request_flash(modal);
                }
            }
            return Routing::Handled;
        }

        if matches!(event.kind, MouseEventKind::Pressed(_)) {
            registry.set_active(window.id());
        }

        Routing::Deliver(window.id())
    }

    /// Classify a just-completed click (button released over the same
    /// control it went down on) as a single/double/triple click, tracking
    /// the click-target cache. Call this once per completed click, not per
    /// press/release pair.
    pub fn classify_click(&self, window: WindowId, position: Position, button: MouseButton, now: Instant) -> MouseEventKind {
        let mut guard = self.click_cache.lock().unwrap_or_else(|p| p.into_inner());
        let count = match guard.as_ref() {
            Some(prev)
                if prev.window == Some(window)
                    && prev.position == position
                    && prev.button == button
                    && now.duration_since(prev.last_at) <= self.double_click_window =>
            {
                (prev.count + 1).min(3)
            }
            _ => 1,
        };
        *guard = Some(ClickCache { window: Some(window), position, button, count, last_at: now });
        match count {
            1 => MouseEventKind::Clicked(button),
            2 => MouseEventKind::DoubleClicked(button),
            _ => MouseEventKind::TripleClicked(button),
        }
    }

    /// Intercept the system-level bindings that act on the window set
    /// itself rather than on a window's content: `Ctrl+T` cycles the
    /// active window, `Ctrl+Q` requests shutdown, `Ctrl+X` closes the
    /// active window, `Alt+1..9` jump-activates the Nth window by creation
    /// order, `Shift+arrows` resizes the active window, and `Ctrl+arrows`
    /// moves it. Returns `None` if `event` isn't one of these bindings.
    pub fn dispatch_system_key(&self, registry: &WindowRegistry, event: &KeyEvent) -> Option<SystemKeyOutcome> {
        if event.ctrl() {
            match event.code {
                KeyCode::Char('t') => {
                    registry.cycle_active(true);
                    return Some(SystemKeyOutcome::Handled);
                }
                KeyCode::Char('q') => return Some(SystemKeyOutcome::Shutdown(0)),
                KeyCode::Char('x') => {
                    if let Some(id) = registry.active_window() {
                        let _ = registry.close(id);
                    }
                    return Some(SystemKeyOutcome::Handled);
                }
                KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right => {
                    if let Some(id) = registry.active_window() {
                        move_window(registry, id, &event.code);
                    }
                    return Some(SystemKeyOutcome::Handled);
                }
                _ => {}
            }
        }
        if event.alt() {
            if let KeyCode::Char(c) = event.code {
                if let Some(n) = c.to_digit(10) {
                    if (1..=9).contains(&n) {
                        if let Some(id) = registry.nth(n as usize - 1) {
                            registry.set_active(id);
                        }
                        return Some(SystemKeyOutcome::Handled);
                    }
                }
            }
        }
        if event.shift() {
            if matches!(event.code, KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right) {
                if let Some(id) = registry.active_window() {
                    resize_window(registry, id, &event.code);
                }
                return Some(SystemKeyOutcome::Handled);
            }
        }
        None
    }

    /// Apply a scroll key (`Up`/`Down`/`PageUp`/`PageDown`/`Ctrl+Home`/
    /// `Ctrl+End`) to `window_id`'s scroll offset, clamping to
    /// `0..=max(0, content_height - viewport_height)`. Returns `true` if the
    /// key was a scroll key (whether or not the offset actually moved).
    pub fn apply_scroll_key(&self, registry: &WindowRegistry, window_id: WindowId, viewport_height: u16, event: &KeyEvent) -> bool {
        let Some(window) = registry.get(window_id) else {
            return false;
        };
        let step: i32 = match event.code {
            KeyCode::Up => -1,
            KeyCode::Down => 1,
            KeyCode::PageUp => -(viewport_height.max(1) as i32),
            KeyCode::PageDown => viewport_height.max(1) as i32,
            KeyCode::Home if event.ctrl() => i32::MIN,
            KeyCode::End if event.ctrl() => i32::MAX,
            _ => return false,
        };
        let mut inner = window.lock();
        let max_scroll = inner.content_height.saturating_sub(viewport_height);
        let current = inner.scroll_y as i32;
        let target = current.saturating_add(step).clamp(0, max_scroll as i32);
        inner.scroll_y = target as u16;
        true
    }
}

fn move_window(registry: &WindowRegistry, id: WindowId, code: &KeyCode) {
    let Some(window) = registry.get(id) else { return };
    let (movable, bounds) = {
        let inner = window.lock();
        (inner.movable, inner.bounds)
    };
    if !movable {
        return;
    }
    let (dx, dy): (i32, i32) = match code {
        KeyCode::Up => (0, -1),
        KeyCode::Down => (0, 1),
        KeyCode::Left => (-1, 0),
        KeyCode::Right => (1, 0),
        _ => return,
    };
    let x = (bounds.position.x as i32 + dx).max(0) as u16;
    let y = (bounds.position.y as i32 + dy).max(0) as u16;
    window.set_bounds(Rect::new(x, y, bounds.size.width, bounds.size.height));
}

fn resize_window(registry: &WindowRegistry, id: WindowId, code: &KeyCode) {
    let Some(window) = registry.get(id) else { return };
    let (resizable, bounds) = {
        let inner = window.lock();
        (inner.resizable, inner.bounds)
    };
    if !resizable {
        return;
    }
    let (dw, dh): (i32, i32) = match code {
        KeyCode::Up => (0, -1),
        KeyCode::Down => (0, 1),
        KeyCode::Left => (-1, 0),
        KeyCode::Right => (1, 0),
        _ => return,
    };
    let width = (bounds.size.width as i32 + dw).max(2) as u16;
    let height = (bounds.size.height as i32 + dh).max(2) as u16;
    window.set_bounds(Rect::new(bounds.position.x, bounds.position.y, width, height));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn registry_with_two() -> (WindowRegistry, WindowId, WindowId) {
        let reg = WindowRegistry::new();
        let a = reg.create("a", Rect::new(0, 0, 10, 10));
        let b = reg.create("b", Rect::new(20, 0, 10, 10));
        (reg, a.id(), b.id())
    }

    fn ctrl(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, crate::event::Modifiers::CTRL)
    }

    fn alt(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, crate::event::Modifiers::ALT)
    }

    fn shift(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, crate::event::Modifiers::SHIFT)
    }

    #[test]
    fn dispatch_key_delivers_to_active_window() {
        let (reg, a, b) = registry_with_two();
        let d = EventDispatcher::new(Duration::from_millis(500));
        reg.set_active(a);
        assert_eq!(d.dispatch_key(&reg, &KeyEvent::plain(KeyCode::Char('x'))), Routing::Deliver(a));
        let _ = b;
    }

    #[test]
    fn escape_closes_topmost_modal() {
        let (reg, a, b) = registry_with_two();
        reg.push_modal(b, a).unwrap();
        let d = EventDispatcher::new(Duration::from_millis(500));
        d.dispatch_key(&reg, &KeyEvent::plain(KeyCode::Escape));
        assert!(reg.top_modal().is_none());
    }

    #[test]
    fn mouse_click_on_blocked_window_is_consumed_not_delivered() {
        let (reg, a, b) = registry_with_two();
        reg.push_modal(b, a).unwrap();
        let d = EventDispatcher::new(Duration::from_millis(500));
        let event = MouseEvent { kind: MouseEventKind::Pressed(MouseButton::Button1), x: 2, y: 2, modifiers: crate::event::Modifiers::NONE };
        assert_eq!(d.dispatch_mouse(&reg, &event), Routing::Handled);
        assert!(reg.take_flash(b));
    }

    #[test]
    fn mouse_click_raises_and_focuses_target() {
        let (reg, a, b) = registry_with_two();
        let d = EventDispatcher::new(Duration::from_millis(500));
        let event = MouseEvent { kind: MouseEventKind::Pressed(MouseButton::Button1), x: 1, y: 1, modifiers: crate::event::Modifiers::NONE };
        assert_eq!(d.dispatch_mouse(&reg, &event), Routing::Deliver(a));
        assert_eq!(reg.active_window(), Some(a));
        let _ = b;
    }

    #[test]
    fn double_click_detected_within_window() {
        let (reg, w, _) = registry_with_two();
        let d = EventDispatcher::new(Duration::from_millis(500));
        let pos = Position::new(5, 5);
        let t0 = Instant::now();
        let first = d.classify_click(w, pos, MouseButton::Button1, t0);
        let second = d.classify_click(w, pos, MouseButton::Button1, t0 + Duration::from_millis(100));
        assert_eq!(first, MouseEventKind::Clicked(MouseButton::Button1));
        assert_eq!(second, MouseEventKind::DoubleClicked(MouseButton::Button1));
        let _ = reg;
    }

    #[test]
    fn click_resets_after_window_elapses() {
        let (reg, w, _) = registry_with_two();
        let d = EventDispatcher::new(Duration::from_millis(100));
        let pos = Position::new(5, 5);
        let t0 = Instant::now();
        d.classify_click(w, pos, MouseButton::Button1, t0);
        let late = d.classify_click(w, pos, MouseButton::Button1, t0 + Duration::from_millis(500));
        assert_eq!(late, MouseEventKind::Clicked(MouseButton::Button1));
        let _ = reg;
    }

    #[test]
    fn click_resets_when_target_moves() {
        let (reg, w, _) = registry_with_two();
        let d = EventDispatcher::new(Duration::from_millis(500));
        let t0 = Instant::now();
        d.classify_click(w, Position::new(5, 5), MouseButton::Button1, t0);
        let moved = d.classify_click(w, Position::new(6, 5), MouseButton::Button1, t0 + Duration::from_millis(10));
        assert_eq!(moved, MouseEventKind::Clicked(MouseButton::Button1));
        let _ = reg;
    }

    #[test]
    fn ctrl_t_cycles_active_window() {
        let (reg, a, b) = registry_with_two();
        let d = EventDispatcher::new(Duration::from_millis(500));
        reg.set_active(a);
        assert_eq!(d.dispatch_system_key(&reg, &ctrl(KeyCode::Char('t'))), Some(SystemKeyOutcome::Handled));
        assert_eq!(reg.active_window(), Some(b));
    }

    #[test]
    fn ctrl_q_requests_shutdown() {
        let (reg, _, _) = registry_with_two();
        let d = EventDispatcher::new(Duration::from_millis(500));
        assert_eq!(d.dispatch_system_key(&reg, &ctrl(KeyCode::Char('q'))), Some(SystemKeyOutcome::Shutdown(0)));
    }

    #[test]
    fn ctrl_x_closes_active_window() {
        let (reg, a, _) = registry_with_two();
        let d = EventDispatcher::new(Duration::from_millis(500));
        reg.set_active(a);
        d.dispatch_system_key(&reg, &ctrl(KeyCode::Char('x')));
        assert!(reg.get(a).is_none());
    }

    #[test]
    fn alt_digit_activates_nth_window() {
        let (reg, a, b) = registry_with_two();
        let d = EventDispatcher::new(Duration::from_millis(500));
        d.dispatch_system_key(&reg, &alt(KeyCode::Char('2')));
        assert_eq!(reg.active_window(), Some(b));
        let _ = a;
    }

    #[test]
    fn ctrl_arrow_moves_active_window() {
        let (reg, a, _) = registry_with_two();
        let d = EventDispatcher::new(Duration::from_millis(500));
        reg.set_active(a);
        let window = reg.get(a).unwrap();
        let before = window.lock().bounds;
        d.dispatch_system_key(&reg, &ctrl(KeyCode::Right));
        let after = window.lock().bounds;
        assert_eq!(after.position.x, before.position.x + 1);
    }

    #[test]
    fn ctrl_arrow_does_not_move_unmovable_window() {
        let (reg, a, _) = registry_with_two();
        let d = EventDispatcher::new(Duration::from_millis(500));
        reg.set_active(a);
        let window = reg.get(a).unwrap();
        window.lock().movable = false;
        let before = window.lock().bounds;
        d.dispatch_system_key(&reg, &ctrl(KeyCode::Right));
        assert_eq!(window.lock().bounds, before);
    }

    #[test]
    fn shift_arrow_resizes_active_window() {
        let (reg, a, _) = registry_with_two();
        let d = EventDispatcher::new(Duration::from_millis(500));
        reg.set_active(a);
        let window = reg.get(a).unwrap();
        let before = window.lock().bounds;
        d.dispatch_system_key(&reg, &shift(KeyCode::Right));
        let after = window.lock().bounds;
        assert_eq!(after.size.width, before.size.width + 1);
    }

    #[test]
    fn plain_arrow_is_not_a_system_key() {
        let (reg, a, _) = registry_with_two();
        let d = EventDispatcher::new(Duration::from_millis(500));
        reg.set_active(a);
        assert_eq!(d.dispatch_system_key(&reg, &KeyEvent::plain(KeyCode::Right)), None);
    }

    #[test]
    fn scroll_down_increments_offset_and_clamps_at_max() {
        let reg = WindowRegistry::new();
        let w = reg.create("a", Rect::new(0, 0, 10, 10));
        w.lock().content_height = 15;
        let d = EventDispatcher::new(Duration::from_millis(500));
        assert!(d.apply_scroll_key(&reg, w.id(), 10, &KeyEvent::plain(KeyCode::Down)));
        assert_eq!(w.lock().scroll_y, 1);
        for _ in 0..10 {
            d.apply_scroll_key(&reg, w.id(), 10, &KeyEvent::plain(KeyCode::Down));
        }
        assert_eq!(w.lock().scroll_y, 5);
    }

    #[test]
    fn ctrl_end_jumps_to_max_scroll() {
        let reg = WindowRegistry::new();
        let w = reg.create("a", Rect::new(0, 0, 10, 10));
        w.lock().content_height = 30;
        let d = EventDispatcher::new(Duration::from_millis(500));
        assert!(d.apply_scroll_key(&reg, w.id(), 10, &ctrl(KeyCode::End)));
        assert_eq!(w.lock().scroll_y, 20);
    }

    #[test]
    fn ctrl_home_returns_to_top() {
        let reg = WindowRegistry::new();
        let w = reg.create("a", Rect::new(0, 0, 10, 10));
        w.lock().content_height = 30;
        w.lock().scroll_y = 15;
        let d = EventDispatcher::new(Duration::from_millis(500));
        assert!(d.apply_scroll_key(&reg, w.id(), 10, &ctrl(KeyCode::Home)));
        assert_eq!(w.lock().scroll_y, 0);
    }

    #[test]
    fn non_scroll_key_is_rejected() {
        let reg = WindowRegistry::new();
        let w = reg.create("a", Rect::new(0, 0, 10, 10));
        let d = EventDispatcher::new(Duration::from_millis(500));
        assert!(!d.apply_scroll_key(&reg, w.id(), 10, &KeyEvent::plain(KeyCode::Char('a'))));
    }
}

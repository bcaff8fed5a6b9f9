use std::collections::HashMap;
use std::time::Duration;

use consolewm::buffer::FlushMode;
use consolewm::color::ColorSupport;
use consolewm::compositor::Compositor;
use consolewm::dispatch::{EventDispatcher, Routing};
use consolewm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind, Modifiers};
use consolewm::geometry::{Position, Rect, Size};
use consolewm::grid::Grid;
use consolewm::theme::Theme;
use consolewm::window::WindowRegistry;

#[test]
fn two_overlapping_windows_composite_without_bleed() {
    let registry = WindowRegistry::new();
    let back = registry.create("back", Rect::new(0, 0, 20, 20));
    let front = registry.create("front", Rect::new(5, 5, 10, 10));

    let mut back_grid = Grid::new(20, 20);
    back_grid.fill(Rect::new(0, 0, 20, 20), 'B', None, None);
    let mut front_grid = Grid::new(10, 10);
    front_grid.fill(Rect::new(0, 0, 10, 10), 'F', None, None);

    let mut grids = HashMap::new();
    grids.insert(back.id(), back_grid);
    grids.insert(front.id(), front_grid);

    let mut compositor = Compositor::new(Size::new(40, 20), FlushMode::Cell, ColorSupport::TrueColor, Theme::default());
    compositor.paint(&registry, &grids, None, None);
    let frame = compositor.flush();
    assert!(!frame.is_empty());

    // A second, identical frame should emit nothing (no-op invariant).
    compositor.paint(&registry, &grids, None, None);
    assert_eq!(compositor.flush(), "");
}

#[test]
fn focus_cycles_and_modal_blocks_siblings() {
    let registry = WindowRegistry::new();
    let main = registry.create("main", Rect::new(0, 0, 20, 20));
    let dialog = registry.create("dialog", Rect::new(5, 5, 10, 10));
    registry.push_modal(dialog.id(), main.id()).unwrap();

    let dispatcher = EventDispatcher::new(Duration::from_millis(500));
    registry.set_active(main.id());

    // Escape closes the topmost modal.
    let routing = dispatcher.dispatch_key(&registry, &KeyEvent::plain(KeyCode::Escape));
    assert_eq!(routing, Routing::Handled);
    assert!(registry.top_modal().is_none());
}

#[test]
fn mouse_click_on_overlapping_windows_hits_topmost() {
    let registry = WindowRegistry::new();
    let back = registry.create("back", Rect::new(0, 0, 20, 20));
    let front = registry.create("front", Rect::new(5, 5, 10, 10));

    let dispatcher = EventDispatcher::new(Duration::from_millis(500));
    let event = MouseEvent { kind: MouseEventKind::Pressed(MouseButton::Button1), x: 7, y: 7, modifiers: Modifiers::NONE };
    let routing = dispatcher.dispatch_mouse(&registry, &event);
    assert_eq!(routing, Routing::Deliver(front.id()));
    let _ = back;

    let pos = Position::new(7, 7);
    let classified = dispatcher.classify_click(front.id(), pos, MouseButton::Button1, std::time::Instant::now());
    assert_eq!(classified, MouseEventKind::Clicked(MouseButton::Button1));
}

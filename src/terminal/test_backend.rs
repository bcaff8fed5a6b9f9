//! An in-memory [`super::Terminal`] for tests: events come from a queue you
//! push to, frames land in a `String` you can inspect.

use std::collections::VecDeque;
use std::time::Duration;

use crate::color::ColorSupport;
use crate::error::Result;
use crate::event::Event;
use crate::geometry::Size;

use super::Terminal as TerminalTrait;

/// A scripted terminal for driving the scheduler in tests.
pub struct TestBackend {
    size: Size,
    color_support: ColorSupport,
    pending_events: VecDeque<Event>,
    written: String,
    flushes: usize,
    entered: bool,
}

impl TestBackend {
    /// Create a backend of the given size with no queued events.
    pub fn new(size: Size) -> Self {
        Self {
            size,
            color_support: ColorSupport::TrueColor,
            pending_events: VecDeque::new(),
            written: String::new(),
            flushes: 0,
            entered: false,
        }
    }

    /// Queue an event to be returned by the next [`TestBackend::poll_event`].
    pub fn push_event(&mut self, event: Event) {
        self.pending_events.push_back(event);
    }

    /// Everything written via [`TestBackend::write_frame`] so far.
    pub fn written(&self) -> &str {
        &self.written
    }

    /// How many times [`TestBackend::flush`] was called.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Whether [`TestBackend::enter`] has been called without a matching
    /// [`TestBackend::leave`].
    pub fn is_entered(&self) -> bool {
        self.entered
    }

    /// Simulate a resize: subsequent [`TestBackend::size`] calls reflect it.
    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }
}

impl TerminalTrait for TestBackend {
    fn size(&self) -> Result<Size> {
        Ok(self.size)
    }

    fn color_support(&self) -> ColorSupport {
        self.color_support
    }

    fn enter(&mut self) -> Result<()> {
        self.entered = true;
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        self.entered = false;
        Ok(())
    }

    fn write_frame(&mut self, frame: &str) -> Result<()> {
        self.written.push_str(frame);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }

    fn poll_event(&mut self, _timeout: Duration) -> Result<Option<Event>> {
        Ok(self.pending_events.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{KeyCode, KeyEvent};

    #[test]
    fn queued_events_drain_in_order() {
        let mut backend = TestBackend::new(Size::new(80, 24));
        backend.push_event(Event::Key(KeyEvent::plain(KeyCode::Tab)));
        backend.push_event(Event::Key(KeyEvent::plain(KeyCode::Escape)));
        assert_eq!(backend.poll_event(Duration::ZERO).unwrap(), Some(Event::Key(KeyEvent::plain(KeyCode::Tab))));
        assert_eq!(backend.poll_event(Duration::ZERO).unwrap(), Some(Event::Key(KeyEvent::plain(KeyCode::Escape))));
        assert_eq!(backend.poll_event(Duration::ZERO).unwrap(), None);
    }

    #[test]
    fn write_frame_accumulates() {
        let mut backend = TestBackend::new(Size::new(80, 24));
        backend.write_frame("a").unwrap();
        backend.write_frame("b").unwrap();
        assert_eq!(backend.written(), "ab");
    }

    #[test]
    fn enter_leave_toggles_state() {
        let mut backend = TestBackend::new(Size::new(80, 24));
        backend.enter().unwrap();
        assert!(backend.is_entered());
        backend.leave().unwrap();
        assert!(!backend.is_entered());
    }

    #[test]
    fn resize_reflected_in_size() {
        let mut backend = TestBackend::new(Size::new(80, 24));
        backend.set_size(Size::new(100, 40));
        assert_eq!(backend.size().unwrap(), Size::new(100, 40));
    }
}

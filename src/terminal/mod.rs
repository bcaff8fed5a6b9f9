//! The driver boundary: a minimal trait the scheduler (C11) consumes to
//! read input and write frames, without depending on a concrete terminal
//! library. Capability detection, multiplexer quirks, and the rest of a
//! full terminal abstraction layer are a consumer's problem, not this
//! crate's — see the design notes on the driver boundary.

pub mod crossterm_backend;
pub mod test_backend;

use std::time::Duration;

use crate::color::ColorSupport;
use crate::error::Result;
use crate::event::Event;
use crate::geometry::Size;

/// What a terminal driver must provide for the scheduler to run against it.
pub trait Terminal {
    /// Current terminal dimensions.
    fn size(&self) -> Result<Size>;

    /// The color fidelity this terminal supports.
    fn color_support(&self) -> ColorSupport;

    /// Enter raw mode / the alternate screen, as appropriate.
    fn enter(&mut self) -> Result<()>;

    /// Leave raw mode / the alternate screen, restoring the prior state.
    fn leave(&mut self) -> Result<()>;

    /// Write a fully-formed escape-sequence frame, without flushing.
    fn write_frame(&mut self, frame: &str) -> Result<()>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<()>;

    /// Poll for the next input event, waiting up to `timeout`. Returns
    /// `None` on timeout with nothing available.
    fn poll_event(&mut self, timeout: Duration) -> Result<Option<Event>>;
}

pub use crossterm_backend::CrosstermBackend;
pub use test_backend::TestBackend;

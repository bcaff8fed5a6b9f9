//! A [`super::Terminal`] implementation backed by `crossterm`.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::terminal;

use crate::color::ColorSupport;
use crate::error::{Result, WmError};
use crate::event::Event;
use crate::geometry::Size;

use super::Terminal as TerminalTrait;

/// Drives a real terminal via `crossterm`.
pub struct CrosstermBackend {
    out: io::Stdout,
    raw_mode_entered: bool,
}

impl CrosstermBackend {
    /// Create a backend writing to stdout. Does not enter raw mode or the
    /// alternate screen until [`CrosstermBackend::enter`] is called.
    pub fn new() -> Self {
        Self { out: io::stdout(), raw_mode_entered: false }
    }

    fn color_support_from_env() -> ColorSupport {
        if std::env::var_os("NO_COLOR").is_some() {
            return ColorSupport::NoColor;
        }
        match std::env::var("COLORTERM").as_deref() {
            Ok("truecolor") | Ok("24bit") => ColorSupport::TrueColor,
            _ => match std::env::var("TERM").as_deref() {
                Ok(term) if term.contains("256color") => ColorSupport::Extended256,
                _ => ColorSupport::Basic16,
            },
        }
    }
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalTrait for CrosstermBackend {
    fn size(&self) -> Result<Size> {
        let (width, height) = terminal::size().map_err(|e| WmError::DriverIoFault(e.to_string()))?;
        Ok(Size::new(width, height))
    }

    fn color_support(&self) -> ColorSupport {
        Self::color_support_from_env()
    }

    fn enter(&mut self) -> Result<()> {
        terminal::enable_raw_mode().map_err(|e| WmError::DriverIoFault(e.to_string()))?;
        crossterm::execute!(
            self.out,
            terminal::EnterAlternateScreen,
            crossterm::event::EnableMouseCapture,
            crossterm::cursor::Hide,
        )
        .map_err(|e| WmError::DriverIoFault(e.to_string()))?;
        self.raw_mode_entered = true;
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        if !self.raw_mode_entered {
            return Ok(());
        }
        crossterm::execute!(
            self.out,
            crossterm::cursor::Show,
            crossterm::event::DisableMouseCapture,
            terminal::LeaveAlternateScreen,
        )
        .map_err(|e| WmError::DriverIoFault(e.to_string()))?;
        terminal::disable_raw_mode().map_err(|e| WmError::DriverIoFault(e.to_string()))?;
        self.raw_mode_entered = false;
        Ok(())
    }

    fn write_frame(&mut self, frame: &str) -> Result<()> {
        self.out.write_all(frame.as_bytes()).map_err(WmError::Io)
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush().map_err(WmError::Io)
    }

    fn poll_event(&mut self, timeout: Duration) -> Result<Option<Event>> {
        if !crossterm::event::poll(timeout).map_err(|e| WmError::DriverIoFault(e.to_string()))? {
            return Ok(None);
        }
        let ct_event = crossterm::event::read().map_err(|e| WmError::DriverIoFault(e.to_string()))?;
        Ok(Some(ct_event.into()))
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

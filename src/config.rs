//! Dependency-injected runtime configuration.
//!
//! Collects the tunable defaults referenced throughout the design (the
//! scheduler's frame interval, a window's grace period, the dispatcher's
//! double-click window, the buffer's diff mode) into one record so they are
//! declared once and passed into [`crate::scheduler::Scheduler`] at
//! construction rather than scattered as magic numbers.

use std::time::Duration;

use crate::buffer::FlushMode;

/// Runtime-tunable defaults for one window-manager instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WmConfig {
    /// How long the scheduler sleeps between loop iterations.
    pub frame_interval: Duration,
    /// Default grace period before a closing window with a hung background
    /// task becomes an error boundary.
    pub grace_period: Duration,
    /// Maximum interval between two clicks at the same point for them to
    /// resolve to the same click target (double/triple-click detection).
    pub double_click_window: Duration,
    /// Default double-buffer flush mode.
    pub buffer_mode: FlushMode,
    /// Whether to wrap each flush in synchronized-output escape sequences.
    pub synchronized_output: bool,
}

impl Default for WmConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(10),
            grace_period: Duration::from_secs(3),
            double_click_window: Duration::from_millis(500),
            buffer_mode: FlushMode::Cell,
            synchronized_output: true,
        }
    }
}

//! Crate-wide error taxonomy.
//!
//! Variants map onto the error table in the design's concurrency/error
//! section: [`WmError::InvalidBounds`] and [`WmError::CloseVetoed`] are
//! returned to callers as hard failures; render faults and modal-blocked
//! input are logged and folded into state rather than surfaced as errors
//! (see [`crate::render`] and [`crate::window`]).

use std::io;

/// Error type for console window manager operations.
#[derive(Debug, thiserror::Error)]
pub enum WmError {
    /// I/O error from the terminal driver.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A grid or buffer coordinate was out of range.
    #[error("out of range: {0}")]
    InvalidBounds(String),

    /// A control's render call faulted; the compositor substitutes a
    /// diagnostic row and continues. Logged, not normally returned.
    #[error("render fault in window {window_id}: {message}")]
    RenderFault {
        /// The window whose control faulted.
        window_id: u64,
        /// Diagnostic message.
        message: String,
    },

    /// `TryClose` was vetoed by the window's `OnClosing` handler.
    #[error("close vetoed for window {0}")]
    CloseVetoed(u64),

    /// A window's background task ignored cancellation past its grace
    /// period; the window has been transformed into an error boundary.
    #[error("background task for window {0} did not honor cancellation")]
    HungBackgroundTask(u64),

    /// The terminal driver failed to write output.
    #[error("driver I/O fault: {0}")]
    DriverIoFault(String),

    /// Input targeted a window that is blocked by a modal descendant.
    /// Not surfaced to callers; used internally to redirect + flash.
    #[error("window {0} is blocked by a modal descendant")]
    ModalBlocked(u64),
}

/// Result type alias for window-manager operations.
pub type Result<T> = std::result::Result<T, WmError>;

//! An in-process console window manager: a text-mode, multi-window
//! compositor for terminal applications.
//!
//! A running system owns one [`window::WindowRegistry`] (window identity,
//! Z-order, the modal stack), drives its [`scheduler::Scheduler`] in a
//! cooperative loop against a [`terminal::Terminal`], and on every dirty
//! frame:
//!
//! 1. [`render`] measures, arranges, and paints each visible window's
//!    controls into its own grid (C4/C5/C6).
//! 2. [`compositor`] works out what part of each window is actually
//!    visible under higher windows (C7) and blits those regions onto the
//!    shared [`buffer::ConsoleBuffer`] (C8).
//! 3. The buffer diffs front against back and emits only the ANSI needed
//!    to bring the real terminal up to date (C2).
//!
//! Input flows the other way: [`terminal::Terminal::poll_event`] hands the
//! scheduler an [`event::Event`], [`dispatch::EventDispatcher`] decides
//! which window it belongs to (C10), and the window forwards it to
//! whichever [`control::Control`] has focus.

pub mod ansi;
pub mod buffer;
pub mod cell;
pub mod color;
pub mod compositor;
pub mod config;
pub mod control;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod geometry;
pub mod grid;
pub mod layout;
pub mod render;
pub mod scheduler;
pub mod style;
pub mod terminal;
pub mod theme;
pub mod window;

pub use buffer::{ConsoleBuffer, FlushMode};
pub use cell::Cell;
pub use color::{Color, ColorSupport, NamedColor};
pub use compositor::Compositor;
pub use config::WmConfig;
pub use control::{Control, EventOutcome};
pub use dispatch::{EventDispatcher, Routing, SystemKeyOutcome};
pub use error::{Result, WmError};
pub use event::{Event, KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
pub use geometry::{Position, Rect, Size};
pub use grid::Grid;
pub use render::WindowRenderer;
pub use scheduler::{BackgroundTask, Scheduler, ShutdownRequest};
pub use style::Style;
pub use theme::Theme;
pub use window::{WindowId, WindowRegistry};

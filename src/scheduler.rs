//! C11 — the cooperative scheduler: one loop polling input, dispatching it,
//! repainting on demand, handling resizes, and giving closing windows'
//! background tasks a grace period before declaring them hung.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::config::WmConfig;
use crate::error::{Result, WmError};
use crate::event::Event;
use crate::geometry::Size;
use crate::terminal::Terminal;
use crate::window::WindowId;

/// A handle to a window's background task: a cancellation flag the task is
/// expected to observe, and the thread's join handle.
pub struct BackgroundTask {
    cancel: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl BackgroundTask {
    /// Spawn `f` on its own thread, handing it a cancellation flag to poll.
    pub fn spawn<F>(f: F) -> Self
    where
        F: FnOnce(Arc<AtomicBool>) + Send + 'static,
    {
        let cancel = Arc::new(AtomicBool::new(false));
        let cancel_for_thread = cancel.clone();
        let join = std::thread::spawn(move || f(cancel_for_thread));
        Self { cancel, join: Some(join) }
    }

    /// Signal the task to stop.
    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    /// True once the thread has actually finished.
    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Block until the thread finishes (only safe to call once finished, or
    /// from a context willing to wait).
    pub fn join(&mut self) {
        if let Some(handle) = self.join.take() {
            let _ = handle.join();
        }
    }
}

struct ClosingWindow {
    window_id: WindowId,
    task: BackgroundTask,
    requested_at: Instant,
}

/// Outcome of one [`Scheduler::tick_background_tasks`] call.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Windows whose background task finished and may now be fully closed.
    pub closed: Vec<WindowId>,
    /// Windows whose background task outlived its grace period. The caller
    /// is expected to call [`crate::window::WindowRegistry::transform_to_error_boundary`]
    /// for each of these instead of removing the window.
    pub hung: Vec<WindowId>,
}

/// A request to end the run loop, carrying the process exit code the
/// caller should use (e.g. from `Ctrl+Q`, see
/// [`crate::dispatch::SystemKeyOutcome::Shutdown`]).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShutdownRequest {
    /// The exit code the embedding application should return.
    pub code: i32,
}

/// Drives the input/render loop and tracks windows in the process of
/// closing down their background work.
pub struct Scheduler {
    config: WmConfig,
    closing: Mutex<Vec<ClosingWindow>>,
    shutdown: Mutex<Option<ShutdownRequest>>,
}

impl Scheduler {
    /// Create a scheduler with the given configuration.
    pub fn new(config: WmConfig) -> Self {
        Self { config, closing: Mutex::new(Vec::new()), shutdown: Mutex::new(None) }
    }

    /// The scheduler's configuration.
    pub fn config(&self) -> WmConfig {
        self.config
    }

    /// Request that the run loop stop at the next opportunity and return
    /// `code` as the exit status. Idempotent: the first call wins.
    pub fn request_shutdown(&self, code: i32) {
        let mut guard = self.shutdown.lock().unwrap_or_else(|p| p.into_inner());
        if guard.is_none() {
            *guard = Some(ShutdownRequest { code });
        }
    }

    /// Begin closing a window: cancel its background task and start the
    /// grace period clock. Call [`Scheduler::tick_background_tasks`] each
    /// loop iteration afterward to find out when it's safe to finish.
    pub fn begin_close(&self, window_id: WindowId, task: BackgroundTask) {
        task.request_cancel();
        self.closing
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(ClosingWindow { window_id, task, requested_at: Instant::now() });
    }

    /// Check every window currently closing: a task that finished is ready
    /// to be dropped from the window set; a task still running past the
    /// configured grace period is reported as hung so the caller can turn
    /// that window into an error boundary instead of removing it.
    pub fn tick_background_tasks(&self, now: Instant) -> TickReport {
        let mut guard = self.closing.lock().unwrap_or_else(|p| p.into_inner());
        let mut report = TickReport::default();
        guard.retain_mut(|entry| {
            if entry.task.is_finished() {
                entry.task.join();
                tracing::debug!(window = entry.window_id.raw(), "background task closed");
                report.closed.push(entry.window_id);
                false
            } else if now.duration_since(entry.requested_at) >= self.config.grace_period {
                let err = WmError::HungBackgroundTask(entry.window_id.raw());
                tracing::warn!(window = entry.window_id.raw(), error = %err, "background task hung past grace period");
                report.hung.push(entry.window_id);
                false
            } else {
                true
            }
        });
        report
    }

    /// Run the cooperative loop against `terminal` until `should_stop`
    /// returns true or [`Scheduler::request_shutdown`] is called. Each
    /// iteration: poll for one input event (bounded by the configured frame
    /// interval), hand it to `on_event`, tick background tasks and hand any
    /// report to `on_tick`, and — if `on_event`/`on_tick` requested it —
    /// paint a frame via `render`. Returns the [`ShutdownRequest`] that
    /// ended the loop (a default, zero-code request if `should_stop` is
    /// what ended it rather than an explicit shutdown).
    pub fn run(
        &self,
        terminal: &mut dyn Terminal,
        mut on_event: impl FnMut(Event) -> bool,
        mut on_tick: impl FnMut(&TickReport),
        mut render: impl FnMut(&mut dyn Terminal) -> Result<()>,
        mut should_stop: impl FnMut() -> bool,
    ) -> Result<ShutdownRequest> {
        terminal.enter()?;
        let run_result = self.run_loop(terminal, &mut on_event, &mut on_tick, &mut render, &mut should_stop);
        terminal.leave()?;
        run_result
    }

    fn run_loop(
        &self,
        terminal: &mut dyn Terminal,
        on_event: &mut impl FnMut(Event) -> bool,
        on_tick: &mut impl FnMut(&TickReport),
        render: &mut impl FnMut(&mut dyn Terminal) -> Result<()>,
        should_stop: &mut impl FnMut() -> bool,
    ) -> Result<ShutdownRequest> {
        let mut last_size: Option<Size> = None;
        while !should_stop() {
            let mut dirty = false;

            if let Some(event) = terminal.poll_event(self.config.frame_interval)? {
                if let Event::Resize(w, h) = event {
                    if last_size != Some(Size::new(w, h)) {
                        tracing::debug!(width = w, height = h, "terminal resized");
                        last_size = Some(Size::new(w, h));
                        dirty = true;
                    }
                }
                dirty |= on_event(event);
            }

            let report = self.tick_background_tasks(Instant::now());
            if !report.closed.is_empty() || !report.hung.is_empty() {
                on_tick(&report);
                dirty = true;
            }

            if dirty {
                tracing::trace!("frame boundary: painting");
                render(terminal)?;
            }

            if let Some(request) = *self.shutdown.lock().unwrap_or_else(|p| p.into_inner()) {
                return Ok(request);
            }
        }
        Ok(ShutdownRequest::default())
    }
}

/// Wrap a compositor's flushed frame in synchronized-output escapes if the
/// config requests them, so terminals that support it never show a
/// half-painted frame.
pub fn wrap_synchronized(frame: &str, synchronized_output: bool) -> String {
    if !synchronized_output || frame.is_empty() {
        return frame.to_string();
    }
    format!("\x1b[?2026h{frame}\x1b[?2026l")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{KeyCode, KeyEvent};
    use crate::terminal::TestBackend;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn begin_close_then_finished_task_reports_closed() {
        let scheduler = Scheduler::new(WmConfig::default());
        let task = BackgroundTask::spawn(|_cancel| {});
        let id = WindowId::default();
        scheduler.begin_close(id, task);
        std::thread::sleep(Duration::from_millis(20));
        let report = scheduler.tick_background_tasks(Instant::now());
        assert_eq!(report.closed, vec![id]);
        assert!(report.hung.is_empty());
    }

    #[test]
    fn task_outliving_grace_period_is_reported_hung() {
        let config = WmConfig { grace_period: Duration::from_millis(10), ..WmConfig::default() };
        let scheduler = Scheduler::new(config);
        let running = Arc::new(AtomicBool::new(true));
        let running_for_thread = running.clone();
        let task = BackgroundTask::spawn(move |_cancel| {
            while running_for_thread.load(Ordering::Acquire) {
                std::thread::sleep(Duration::from_millis(1));
            }
        });
        let id = WindowId::default();
        scheduler.begin_close(id, task);
        std::thread::sleep(Duration::from_millis(30));
        let report = scheduler.tick_background_tasks(Instant::now());
        assert_eq!(report.hung, vec![id]);
        running.store(false, Ordering::Release);
    }

    #[test]
    fn task_still_within_grace_period_is_neither_closed_nor_hung() {
        let config = WmConfig { grace_period: Duration::from_secs(5), ..WmConfig::default() };
        let scheduler = Scheduler::new(config);
        let running = Arc::new(AtomicBool::new(true));
        let running_for_thread = running.clone();
        let task = BackgroundTask::spawn(move |_cancel| {
            while running_for_thread.load(Ordering::Acquire) {
                std::thread::sleep(Duration::from_millis(1));
            }
        });
        let id = WindowId::default();
        scheduler.begin_close(id, task);
        let report = scheduler.tick_background_tasks(Instant::now());
        assert!(report.closed.is_empty());
        assert!(report.hung.is_empty());
        running.store(false, Ordering::Release);
    }

    #[test]
    fn wrap_synchronized_brackets_nonempty_frame() {
        let out = wrap_synchronized("hello", true);
        assert!(out.starts_with("\x1b[?2026h"));
        assert!(out.ends_with("\x1b[?2026l"));
    }

    #[test]
    fn wrap_synchronized_noop_when_disabled() {
        assert_eq!(wrap_synchronized("hello", false), "hello");
    }

    #[test]
    fn run_loop_stops_on_should_stop() {
        let scheduler = Scheduler::new(WmConfig { frame_interval: Duration::from_millis(1), ..WmConfig::default() });
        let mut backend = TestBackend::new(Size::new(80, 24));
        backend.push_event(Event::Key(KeyEvent::plain(KeyCode::Escape)));
        let iterations = AtomicUsize::new(0);
        scheduler
            .run(
                &mut backend,
                |_event| true,
                |_report| {},
                |_terminal| Ok(()),
                || iterations.fetch_add(1, Ordering::Relaxed) >= 1,
            )
            .unwrap();
        assert!(!backend.is_entered());
    }

    #[test]
    fn request_shutdown_stops_the_loop_with_the_requested_code() {
        let scheduler = Scheduler::new(WmConfig { frame_interval: Duration::from_millis(1), ..WmConfig::default() });
        let mut backend = TestBackend::new(Size::new(80, 24));
        backend.push_event(Event::Key(KeyEvent::plain(KeyCode::Char('q'))));
        let result = scheduler
            .run(
                &mut backend,
                |event| {
                    if matches!(event, Event::Key(k) if k.code == KeyCode::Char('q')) {
                        scheduler.request_shutdown(7);
                    }
                    true
                },
                |_report| {},
                |_terminal| Ok(()),
                || false,
            )
            .unwrap();
        assert_eq!(result, ShutdownRequest { code: 7 });
    }

    #[test]
    fn hung_task_constructs_the_error_variant() {
        let err = WmError::HungBackgroundTask(WindowId::default().raw());
        assert!(err.to_string().contains("did not honor cancellation"));
    }

    #[test]
    fn resize_event_marks_frame_dirty_and_renders() {
        let scheduler = Scheduler::new(WmConfig { frame_interval: Duration::from_millis(1), ..WmConfig::default() });
        let mut backend = TestBackend::new(Size::new(80, 24));
        backend.push_event(Event::Resize(100, 40));
        let rendered = AtomicUsize::new(0);
        let mut calls = 0;
        scheduler
            .run(
                &mut backend,
                |_event| false,
                |_report| {},
                |_terminal| {
                    rendered.fetch_add(1, Ordering::Relaxed);
                    Ok(())
                },
                || {
                    calls += 1;
                    calls > 1
                },
            )
            .unwrap();
        assert_eq!(rendered.load(Ordering::Relaxed), 1);
    }
}

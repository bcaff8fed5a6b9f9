//! C9 — window registry: identity, Z-order, the modal stack, and
//! per-window focus state.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use crate::error::{Result, WmError};
use crate::geometry::Rect;

/// Stable identity of a window, assigned once at creation and never reused.
/// The default value, `WindowId(0)`, is reserved to mean "no window" and is
/// never handed out by [`WindowIdAllocator`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowId(u64);

impl WindowId {
    /// The raw numeric value, for logging and diagnostics.
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Hands out monotonically increasing [`WindowId`]s.
pub struct WindowIdAllocator(AtomicU64);

impl WindowIdAllocator {
    /// A fresh allocator starting at 1 (0 is reserved for "no window").
    pub const fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    /// Allocate the next id.
    pub fn next(&self) -> WindowId {
        WindowId(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for WindowIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Keyboard focus within a single window: which control id currently has
/// it, independent of whether the window itself is the focused one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FocusState {
    /// Control id with focus, if any.
    pub focused_control: Option<u64>,
    /// Control id that held focus when `Escape` last cleared it, so the
    /// next Tab restores focus there instead of starting the cycle over.
    pub escaped_from: Option<u64>,
}

/// The mutable state of one window, guarded by its own lock so windows on
/// separate background threads don't contend with each other.
pub struct WindowInner {
    /// Title shown in the chrome.
    pub title: String,
    /// Bounds in screen coordinates.
    pub bounds: Rect,
    /// Bounds as of the last compositor frame, used to compute the region
    /// exposed by a move or resize.
    pub previous_bounds: Rect,
    /// Whether the window accepts focus and paints above the desktop.
    pub visible: bool,
    /// Whether this window is currently minimized (hidden but retained).
    pub minimized: bool,
    /// Whether this window is modal: while shown, ancestors below it in the
    /// same modal chain cannot receive input.
    pub modal: bool,
    /// The window that owns this one as a modal child, if any.
    pub modal_parent: Option<WindowId>,
    /// Per-window keyboard focus.
    pub focus: FocusState,
    /// Total scrollable content height, used by scroll-into-view.
    pub content_height: u16,
    /// Current vertical scroll offset.
    pub scroll_y: u16,
    /// Whether this is the active window (the one keyboard input routes to
    /// by default). At most one window in a registry is active at a time.
    pub is_active: bool,
    /// Whether the user can drag this window to a new position.
    pub movable: bool,
    /// Whether the user can resize this window.
    pub resizable: bool,
    /// Whether this window can be closed at all.
    pub closable: bool,
    /// Whether this window always paints above every non-always-on-top
    /// window regardless of activation order (set on error boundaries).
    pub always_on_top: bool,
    /// Set by [`WindowRegistry::set_close_veto`] to reject the next
    /// [`WindowRegistry::try_close`] regardless of `closable`.
    pub close_veto: bool,
    /// Pending border-flash request, consumed by the next render pass.
    pub flashing: bool,
}

impl WindowInner {
    fn new(title: impl Into<String>, bounds: Rect) -> Self {
        Self {
            title: title.into(),
            bounds,
            previous_bounds: bounds,
            visible: true,
            minimized: false,
            modal: false,
            modal_parent: None,
            focus: FocusState::default(),
            content_height: 0,
            scroll_y: 0,
            is_active: false,
            movable: true,
            resizable: true,
            closable: true,
            always_on_top: false,
            close_veto: false,
            flashing: false,
        }
    }
}

/// A window's identity plus its Z-index and lock-guarded mutable state.
pub struct Window {
    id: WindowId,
    z: AtomicI64,
    inner: Mutex<WindowInner>,
}

impl Window {
    /// The window's id.
    pub fn id(&self) -> WindowId {
        self.id
    }

    /// Current Z-index. Higher paints on top.
    pub fn z(&self) -> i64 {
        self.z.load(Ordering::Acquire)
    }

    /// Lock the mutable state for reading or writing.
    pub fn lock(&self) -> std::sync::MutexGuard<'_, WindowInner> {
        self.inner.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    /// Move or resize the window, recording the prior bounds so the
    /// compositor can expose whatever was behind it (C8 step 4).
    pub fn set_bounds(&self, new_bounds: Rect) {
        let mut inner = self.lock();
        inner.previous_bounds = inner.bounds;
        inner.bounds = new_bounds;
    }
}

/// The registry of all live windows plus global Z-ordering and the modal
/// stack. One instance per running system.
pub struct WindowRegistry {
    ids: WindowIdAllocator,
    windows: RwLock<BTreeMap<WindowId, std::sync::Arc<Window>>>,
    top_z: AtomicI64,
    bottom_z: AtomicI64,
    modal_stack: Mutex<Vec<WindowId>>,
}

impl WindowRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            ids: WindowIdAllocator::new(),
            windows: RwLock::new(BTreeMap::new()),
            top_z: AtomicI64::new(0),
            bottom_z: AtomicI64::new(0),
            modal_stack: Mutex::new(Vec::new()),
        }
    }

    /// Create and register a new window at the given bounds, assigning it
    /// the topmost Z-index and making it the active window.
    pub fn create(&self, title: impl Into<String>, bounds: Rect) -> std::sync::Arc<Window> {
        let id = self.ids.next();
        let z = self.top_z.fetch_add(1, Ordering::AcqRel) + 1;
        let window = std::sync::Arc::new(Window { id, z: AtomicI64::new(z), inner: Mutex::new(WindowInner::new(title, bounds)) });
        self.windows.write().unwrap_or_else(|p| p.into_inner()).insert(id, window.clone());
        self.set_active(id);
        window
    }

    /// Look up a window by id.
    pub fn get(&self, id: WindowId) -> Option<std::sync::Arc<Window>> {
        self.windows.read().unwrap_or_else(|p| p.into_inner()).get(&id).cloned()
    }

    /// The `index`-th window by creation order (0-based), used by
    /// fixed-position activation shortcuts (e.g. Alt+1..9).
    pub fn nth(&self, index: usize) -> Option<WindowId> {
        self.windows.read().unwrap_or_else(|p| p.into_inner()).keys().nth(index).copied()
    }

    /// Remove a window from the registry unconditionally. Does not check
    /// closability or veto state; callers wanting the two-phase lifecycle
    /// should use [`WindowRegistry::close`] instead.
    pub fn remove(&self, id: WindowId) {
        self.windows.write().unwrap_or_else(|p| p.into_inner()).remove(&id);
        self.modal_stack.lock().unwrap_or_else(|p| p.into_inner()).retain(|w| *w != id);
    }

    /// Phase one of closing a window: fails with [`WmError::CloseVetoed`]
    /// if the window isn't closable or currently has a veto in effect
    /// (see [`WindowRegistry::set_close_veto`]). Does not remove anything.
    pub fn try_close(&self, id: WindowId) -> Result<()> {
        let window = self.get(id).ok_or_else(|| WmError::InvalidBounds(format!("no such window {}", id.raw())))?;
        let inner = window.lock();
        if !inner.closable || inner.close_veto {
            return Err(WmError::CloseVetoed(id.raw()));
        }
        Ok(())
    }

    /// Set or clear a pending close veto (the window's `OnClosing` handler
    /// rejecting the next close attempt, e.g. for unsaved changes).
    pub fn set_close_veto(&self, id: WindowId, veto: bool) {
        if let Some(window) = self.get(id) {
            window.lock().close_veto = veto;
        }
    }

    /// Phase two: run [`WindowRegistry::try_close`] and, if it succeeds,
    /// remove the window.
    pub fn close(&self, id: WindowId) -> Result<()> {
        self.try_close(id)?;
        self.remove(id);
        Ok(())
    }

    /// Turn a window whose background task ignored cancellation past its
    /// grace period into a persistent error boundary: always on top,
    /// movable so its message can be read, but no longer closable or
    /// resizable.
    pub fn transform_to_error_boundary(&self, id: WindowId) {
        if let Some(window) = self.get(id) {
            let mut inner = window.lock();
            inner.title = "\u{26a0} HUNG THREAD ERROR".to_string();
            inner.always_on_top = true;
            inner.movable = true;
            inner.resizable = false;
            inner.closable = false;
        }
        self.bring_to_front(id);
    }

    /// All windows in ascending Z-order (bottom to top), for compositing.
    pub fn by_z_order(&self) -> Vec<std::sync::Arc<Window>> {
        let mut windows: Vec<_> = self.windows.read().unwrap_or_else(|p| p.into_inner()).values().cloned().collect();
        windows.sort_by_key(|w| w.z());
        windows
    }

    /// Raise `id` to the top of the Z-order. No-op if already on top.
    pub fn bring_to_front(&self, id: WindowId) {
        if let Some(window) = self.get(id) {
            let z = self.top_z.fetch_add(1, Ordering::AcqRel) + 1;
            window.z.store(z, Ordering::Release);
        }
    }

    /// Lower `id` to the bottom of the Z-order. No-op if already at the
    /// bottom.
    pub fn send_to_back(&self, id: WindowId) {
        if let Some(window) = self.get(id) {
            let z = self.bottom_z.fetch_sub(1, Ordering::AcqRel) - 1;
            window.z.store(z, Ordering::Release);
        }
    }

    /// The currently active window, if any (the one `is_active` is set on).
    pub fn active_window(&self) -> Option<WindowId> {
        self.windows
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .values()
            .find(|w| w.lock().is_active)
            .map(|w| w.id())
    }

    /// Resolve the window that should actually receive activation when
    /// `id` is requested: if `id` is blocked by a modal descendant, the
    /// topmost modal is activated instead and flashed to draw attention to
    /// it (see [`WindowRegistry::request_flash`]).
    pub fn effective_activation_target(&self, id: WindowId) -> WindowId {
        if self.is_blocked(id) {
            if let Some(modal) = self.top_modal() {
                self.request_flash(modal);
                return modal;
            }
        }
        id
    }

    /// Make `id` (or its blocking modal, if blocked) the active window:
    /// clears `is_active` on every other window, sets it here, and raises
    /// the target to the top of the Z-order.
    pub fn set_active(&self, id: WindowId) {
        let target = self.effective_activation_target(id);
        for window in self.by_z_order() {
            window.lock().is_active = window.id() == target;
        }
        self.bring_to_front(target);
    }

    /// Move activation to the next (`forward`) or previous window in
    /// Z-order, wrapping around. No-op if there are no windows.
    pub fn cycle_active(&self, forward: bool) {
        let order = self.by_z_order();
        if order.is_empty() {
            return;
        }
        let current = self.active_window();
        let current_idx = current.and_then(|id| order.iter().position(|w| w.id() == id));
        let next_idx = match current_idx {
            Some(i) if forward => (i + 1) % order.len(),
            Some(i) => (i + order.len() - 1) % order.len(),
            None if forward => order.len() - 1,
            None => 0,
        };
        self.set_active(order[next_idx].id());
    }

    /// Request that `id`'s border flash on the next render (e.g. to call
    /// attention to a window blocking activation of one of its ancestors).
    pub fn request_flash(&self, id: WindowId) {
        if let Some(window) = self.get(id) {
            window.lock().flashing = true;
        }
    }

    /// Consume and return the pending flash flag for `id`, if any.
    pub fn take_flash(&self, id: WindowId) -> bool {
        self.get(id).map(|w| std::mem::take(&mut w.lock().flashing)).unwrap_or(false)
    }

    /// Push a new modal window, recording its parent.
    pub fn push_modal(&self, modal: WindowId, parent: WindowId) -> Result<()> {
        if let Some(window) = self.get(modal) {
            let mut guard = window.lock();
            guard.modal = true;
            guard.modal_parent = Some(parent);
        } else {
            return Err(WmError::InvalidBounds(format!("no such window {}", modal.raw())));
        }
        self.modal_stack.lock().unwrap_or_else(|p| p.into_inner()).push(modal);
        self.bring_to_front(modal);
        Ok(())
    }

    /// Pop the topmost modal, if `id` matches it. Returns an error if `id`
    /// is not the topmost modal (callers must close modals in LIFO order).
    pub fn pop_modal(&self, id: WindowId) -> Result<()> {
        let mut stack = self.modal_stack.lock().unwrap_or_else(|p| p.into_inner());
        match stack.last() {
            Some(top) if *top == id => {
                stack.pop();
                Ok(())
            }
            _ => Err(WmError::ModalBlocked(id.raw())),
        }
    }

    /// Whether `id` is currently blocked from receiving input by a modal
    /// descendant above it in the modal chain.
    pub fn is_blocked(&self, id: WindowId) -> bool {
        let stack = self.modal_stack.lock().unwrap_or_else(|p| p.into_inner());
        match stack.last() {
            Some(top) if *top != id => !self.is_ancestor_or_self(id, *top),
            _ => false,
        }
    }

    fn is_ancestor_or_self(&self, id: WindowId, of: WindowId) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            if cur == of {
                return true;
            }
            current = self.get(cur).and_then(|w| w.lock().modal_parent);
        }
        false
    }

    /// The id of the currently active modal, if any.
    pub fn top_modal(&self) -> Option<WindowId> {
        self.modal_stack.lock().unwrap_or_else(|p| p.into_inner()).last().copied()
    }
}

impl Default for WindowRegistry {
    fn default() -> Self {
        Self::new()
    }
}

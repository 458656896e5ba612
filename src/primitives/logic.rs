// ============================================================================
// spark-logic - Logic Holder
// An observable unit of mutable application state
// ============================================================================
//
// A Logic<S> owns a state value, a version counter and an ordered listener
// set. Observers never write the state: every change goes through the
// mutation helper (see mutation.rs), which applies the change and then emits
// exactly once.
//
// Emitting means:
// 1. Bump the version by one
// 2. Run pre-notify hooks
// 3. Call every listener in registration order, synchronously
// 4. Run post-notify hooks
//
// Once disposed, a holder never notifies again and drops its listeners.
// Disposal is one-way and idempotent.
// ============================================================================

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::core::types::{AnyLogic, ListenerId, LogicKey, LogicState};
use crate::reactivity::hooks::{HookFn, HookId, HookStage, NotifyHooks};
use crate::reactivity::listeners::ListenerSet;

// =============================================================================
// OPTIONS
// =============================================================================

/// Construction options for a [`Logic`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicOptions {
    /// Label carried into log events. Defaults to the state key.
    pub label: Option<&'static str>,
}

impl LogicOptions {
    /// Options with a diagnostic label
    pub fn labeled(label: &'static str) -> Self {
        Self { label: Some(label) }
    }
}

// =============================================================================
// LOGIC INNER
// =============================================================================

struct LogicInner<S> {
    state: RefCell<S>,

    /// Incremented by exactly one per successful emit
    version: Cell<u64>,

    /// Monotonic false -> true
    disposed: Cell<bool>,

    listeners: ListenerSet<dyn Fn()>,

    hooks: NotifyHooks,

    label: Option<&'static str>,
}

// =============================================================================
// LOGIC<S> - The public holder handle
// =============================================================================

/// An observable holder for a state value of type `S`.
///
/// Cloning a `Logic` creates a new handle to the **same** holder: both
/// handles see the same state, version and listeners.
///
/// # Example
///
/// ```
/// use spark_logic::{Logic, logic_state};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// struct Counter {
///     value: i32,
/// }
/// logic_state!(Counter => "counter");
///
/// let counter = Logic::new(Counter { value: 0 });
/// let seen = Rc::new(Cell::new(0));
///
/// let seen_clone = seen.clone();
/// counter.subscribe(move || seen_clone.set(seen_clone.get() + 1));
///
/// counter.mutate(|c| c.value += 1);
///
/// assert_eq!(counter.read(|c| c.value), 1);
/// assert_eq!(counter.version(), 1);
/// assert_eq!(seen.get(), 1);
/// ```
///
/// # Failure Modes
///
/// - **Re-entrant access from a sync mutation block**: the block holds the
///   state mutably, so reading the same holder from inside it panics
///   (RefCell borrow rules). Listeners run after the block returns and may
///   read freely.
/// - **Async blocks**: state written before a suspension point is visible
///   to readers until the block completes. That partial state is expected
///   in the single-threaded model.
pub struct Logic<S> {
    inner: Rc<LogicInner<S>>,
}

// Manual Clone: shares the same Rc.
impl<S> Clone for Logic<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

// Accessors that don't need the state key live here, usable from Drop impls.
impl<S> Logic<S> {
    /// Current version. Never decreases; dispose does not reset it.
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Whether `dispose` has been called.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Whether two handles point at the same holder.
    pub fn ptr_eq(&self, other: &Logic<S>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Remove a listener. Unknown ids are ignored.
    ///
    /// Returns true if a listener was removed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.listeners.remove(id)
    }

    /// Remove a notify hook. Unknown ids are ignored.
    pub fn remove_hook(&self, hook: HookId) -> bool {
        self.inner.hooks.remove(hook)
    }
}

impl<S: LogicState> Logic<S> {
    /// Create a holder with version 0 and no listeners.
    pub fn new(state: S) -> Self {
        Self::with_options(state, LogicOptions::default())
    }

    /// Create a holder with explicit options.
    pub fn with_options(state: S, options: LogicOptions) -> Self {
        Self {
            inner: Rc::new(LogicInner {
                state: RefCell::new(state),
                version: Cell::new(0),
                disposed: Cell::new(false),
                listeners: ListenerSet::new(),
                hooks: NotifyHooks::new(),
                label: options.label,
            }),
        }
    }

    /// Key of the held state type.
    pub fn key(&self) -> LogicKey {
        S::KEY
    }

    /// Diagnostic label (the configured label, or the key).
    pub fn label(&self) -> &'static str {
        self.inner.label.unwrap_or(S::KEY.as_str())
    }

    /// Access the current state by reference.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    /// Get a clone of the current state.
    pub fn get(&self) -> S
    where
        S: Clone,
    {
        self.inner.state.borrow().clone()
    }

    // =========================================================================
    // LISTENERS
    // =========================================================================

    /// Register a listener, called after every emit.
    ///
    /// On a disposed holder the returned id is never registered.
    pub fn subscribe(&self, listener: impl Fn() + 'static) -> ListenerId {
        if self.is_disposed() {
            return self.inner.listeners.reserve_id();
        }
        self.inner.listeners.add(Rc::new(listener))
    }

    /// Register a hook that runs after the version bump, before listeners.
    ///
    /// On a disposed holder the returned id is never registered.
    pub fn on_before_notify(&self, hook: impl Fn(u64) + 'static) -> HookId {
        self.add_hook(HookStage::BeforeNotify, Rc::new(hook))
    }

    /// Register a hook that runs after all listeners.
    ///
    /// On a disposed holder the returned id is never registered.
    pub fn on_after_notify(&self, hook: impl Fn(u64) + 'static) -> HookId {
        self.add_hook(HookStage::AfterNotify, Rc::new(hook))
    }

    fn add_hook(&self, stage: HookStage, hook: Rc<HookFn>) -> HookId {
        if self.is_disposed() {
            return self.inner.hooks.reserve(stage);
        }
        self.inner.hooks.add(stage, hook)
    }

    // =========================================================================
    // EMIT / DISPOSE
    // =========================================================================

    /// Bump the version and notify every listener.
    ///
    /// No-op on a disposed holder. If a listener disposes the holder, the
    /// remaining listeners and post-notify hooks are skipped.
    pub fn emit(&self) {
        let inner = &*self.inner;
        if inner.disposed.get() {
            tracing::trace!(message = "logic.emit.suppressed", logic = self.label());
            return;
        }

        let version = inner.version.get() + 1;
        inner.version.set(version);

        let live = || !inner.disposed.get();
        inner.hooks.run(HookStage::BeforeNotify, version, live);
        let notified = inner.listeners.notify(live, |listener| listener());
        inner.hooks.run(HookStage::AfterNotify, version, live);

        tracing::trace!(
            message = "logic.emit",
            logic = self.label(),
            version,
            notified
        );
    }

    /// Dispose the holder: drop all listeners and hooks, stop notifying.
    ///
    /// Idempotent. In-flight async mutations keep running, but their
    /// completion no longer emits.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        let listeners = self.inner.listeners.len();
        self.inner.listeners.clear();
        self.inner.hooks.clear();
        tracing::debug!(
            message = "logic.dispose",
            logic = self.label(),
            version = self.version(),
            listeners
        );
    }

    // =========================================================================
    // INTERNAL STATE ACCESS (mutation helper only)
    // =========================================================================

    /// Write the state without emitting.
    pub(crate) fn write_silently<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.inner.state.borrow_mut())
    }
}

impl<S: LogicState> AnyLogic for Logic<S> {
    fn key(&self) -> LogicKey {
        S::KEY
    }

    fn version(&self) -> u64 {
        Logic::version(self)
    }

    fn is_disposed(&self) -> bool {
        Logic::is_disposed(self)
    }

    fn dispose(&self) {
        Logic::dispose(self)
    }

    fn listener_count(&self) -> usize {
        Logic::listener_count(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<S: LogicState + fmt::Debug> fmt::Debug for Logic<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Logic");
        out.field("key", &S::KEY);
        // A sync mutation block may hold the state mutably
        match self.inner.state.try_borrow() {
            Ok(state) => out.field("state", &*state),
            Err(_) => out.field("state", &"<borrowed>"),
        };
        out.field("version", &self.version())
            .field("disposed", &self.is_disposed())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

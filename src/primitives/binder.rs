// ============================================================================
// spark-logic - Reactive Binder
// A UI element bound to one holder from the nearest scope
// ============================================================================
//
// Lifecycle:
//
//   Unattached --resolve_dependencies--> Attached --teardown--> Detached
//                                         |    ^
//                                         +----+ re-resolve (holder swap)
//
// On every notification from the attached holder:
// 1. The side-effect callback runs, unconditionally
// 2. The predicate (if any) inspects the holder's current state
// 3. If it passes, the binder is marked dirty and the host is asked to
//    rebuild; the next `build()` renders from the holder's live state
//
// The holder's listener keeps only a Weak back-reference, so a binder that
// is dropped without teardown still detaches (see Drop for BinderInner).
// ============================================================================

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::core::error::LookupError;
use crate::core::types::{ListenerId, LogicState};
use crate::primitives::logic::Logic;
use crate::reactivity::resolver::{ScopeResolver, resolve};

// =============================================================================
// TYPE ALIASES
// =============================================================================

/// Produces content from the context and holder
pub type RenderFn<S, C, V> = Box<dyn Fn(&C, &Logic<S>) -> V>;

/// Side effect run on every notification
pub type ListenFn<S, C> = Box<dyn Fn(&C, &Logic<S>)>;

/// Rebuild predicate over the holder's current state
pub type BuildWhenFn<S> = Box<dyn Fn(&S) -> bool>;

/// Host callback asking for the binder to be rebuilt
pub type RebuildHook = Rc<dyn Fn()>;

// =============================================================================
// STATE
// =============================================================================

/// Where a binder is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinderState {
    /// Created, never resolved
    Unattached,
    /// Subscribed to a holder
    Attached,
    /// Torn down; terminal
    Detached,
}

enum Binding<S, C> {
    Unattached,
    Attached {
        logic: Logic<S>,
        listener: ListenerId,
        context: C,
    },
    Detached,
}

impl<S, C> Binding<S, C> {
    fn state(&self) -> BinderState {
        match self {
            Binding::Unattached => BinderState::Unattached,
            Binding::Attached { .. } => BinderState::Attached,
            Binding::Detached => BinderState::Detached,
        }
    }
}

// =============================================================================
// BINDER INNER
// =============================================================================

struct BinderInner<S, C, V> {
    render: RenderFn<S, C, V>,
    listen: Option<ListenFn<S, C>>,
    build_when: Option<BuildWhenFn<S>>,
    on_rebuild: Option<RebuildHook>,

    binding: RefCell<Binding<S, C>>,

    /// Content must be re-rendered on next build
    dirty: Cell<bool>,

    /// Last rendered content
    content: RefCell<Option<V>>,

    /// Holder version at the last render
    last_seen_version: Cell<Option<u64>>,

    renders: Cell<u64>,
    notifications: Cell<u64>,
}

impl<S: LogicState, C: Clone + 'static, V: 'static> BinderInner<S, C, V> {
    /// Holder and context, cloned out so no borrow is held across callbacks
    fn attached(&self) -> Option<(Logic<S>, C)> {
        match &*self.binding.borrow() {
            Binding::Attached { logic, context, .. } => Some((logic.clone(), context.clone())),
            _ => None,
        }
    }

    fn is_attached_to(&self, target: &Logic<S>) -> bool {
        matches!(&*self.binding.borrow(), Binding::Attached { logic, .. } if logic.ptr_eq(target))
    }

    fn on_notify(&self) {
        let Some((logic, context)) = self.attached() else {
            return;
        };
        self.notifications.set(self.notifications.get() + 1);

        if let Some(listen) = &self.listen {
            listen(&context, &logic);
            // The side effect may have torn us down or swapped holders
            if !self.is_attached_to(&logic) {
                return;
            }
        }

        let rebuild = self
            .build_when
            .as_ref()
            .is_none_or(|predicate| logic.read(|state| predicate(state)));

        if rebuild {
            self.dirty.set(true);
            if let Some(hook) = &self.on_rebuild {
                hook();
            }
        } else {
            tracing::trace!(
                message = "binder.rebuild.skipped",
                logic = logic.label(),
                version = logic.version()
            );
        }
    }

    fn detach(&self) {
        let previous = self.binding.replace(Binding::Detached);
        match previous {
            Binding::Attached {
                logic, listener, ..
            } => {
                logic.unsubscribe(listener);
                tracing::debug!(message = "binder.detach", logic = logic.label());
            }
            Binding::Unattached => {
                tracing::debug!(
                    message = "binder.detach",
                    logic = S::KEY.as_str(),
                    attached = false
                );
            }
            Binding::Detached => {}
        }
    }
}

impl<S, C, V> Drop for BinderInner<S, C, V> {
    fn drop(&mut self) {
        if let Binding::Attached {
            logic, listener, ..
        } = std::mem::replace(self.binding.get_mut(), Binding::Detached)
        {
            logic.unsubscribe(listener);
        }
    }
}

// =============================================================================
// BINDER (Public handle)
// =============================================================================

/// Renders content from one holder and re-renders when it notifies.
///
/// `S` is the state type, `C` the context (a tree position or anything
/// implementing [`ScopeResolver`]), `V` the opaque content produced by the
/// render function.
///
/// The rebuild predicate sees only the holder's **current** state. Compare
/// against earlier values by keeping them in the state itself.
///
/// # Example
///
/// ```
/// use spark_logic::{Binder, Logic, LogicScope, logic_state};
///
/// struct Counter(i32);
/// logic_state!(Counter => "counter");
///
/// let counter = Logic::new(Counter(0));
/// let scope = LogicScope::builder().provide(&counter).build().unwrap();
///
/// let binder = Binder::builder(|_cx: &LogicScope, logic: &Logic<Counter>| {
///     logic.read(|c| format!("Count: {}", c.0))
/// })
/// .build();
///
/// binder.resolve_dependencies(scope).unwrap();
/// assert_eq!(binder.build().as_deref(), Some("Count: 0"));
///
/// counter.mutate(|c| c.0 += 1);
/// assert_eq!(binder.build().as_deref(), Some("Count: 1"));
/// ```
pub struct Binder<S, C, V> {
    inner: Rc<BinderInner<S, C, V>>,
}

// Manual Clone: shares the same binder.
impl<S, C, V> Clone for Binder<S, C, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S, C, V> Binder<S, C, V>
where
    S: LogicState,
    C: ScopeResolver + Clone + 'static,
    V: 'static,
{
    /// Start configuring a binder around a render function.
    pub fn builder(render: impl Fn(&C, &Logic<S>) -> V + 'static) -> BinderBuilder<S, C, V> {
        BinderBuilder {
            render: Box::new(render),
            listen: None,
            build_when: None,
            on_rebuild: None,
        }
    }

    /// A binder with only a render function.
    pub fn new(render: impl Fn(&C, &Logic<S>) -> V + 'static) -> Self {
        Self::builder(render).build()
    }

    /// Resolve the holder from `cx` and attach to it.
    ///
    /// - Unattached: subscribe to the resolved holder
    /// - Attached to the same holder: just adopt the new context
    /// - Attached to a different holder: unsubscribe the old one and
    ///   subscribe the new one in one step, then mark dirty
    /// - Detached: ignored
    ///
    /// On lookup failure the binder keeps its current binding.
    pub fn resolve_dependencies(&self, cx: C) -> Result<(), LookupError> {
        if self.state() == BinderState::Detached {
            tracing::debug!(
                message = "binder.resolve.after_teardown",
                logic = S::KEY.as_str()
            );
            return Ok(());
        }

        let logic = resolve::<S>(&cx)?;

        let mut binding = self.inner.binding.borrow_mut();
        if let Binding::Attached {
            logic: current,
            context,
            ..
        } = &mut *binding
        {
            if current.ptr_eq(&logic) {
                *context = cx;
                return Ok(());
            }
        }

        let swapped = match std::mem::replace(&mut *binding, Binding::Detached) {
            Binding::Attached {
                logic: old,
                listener,
                ..
            } => {
                old.unsubscribe(listener);
                true
            }
            _ => false,
        };

        let listener = logic.subscribe(self.listener());
        if swapped {
            tracing::debug!(
                message = "binder.swap",
                logic = logic.label(),
                version = logic.version()
            );
        } else {
            tracing::debug!(
                message = "binder.attach",
                logic = logic.label(),
                version = logic.version()
            );
        }
        *binding = Binding::Attached {
            logic,
            listener,
            context: cx,
        };
        drop(binding);

        self.inner.dirty.set(true);
        Ok(())
    }

    /// Current content, rendering first if needed.
    ///
    /// Renders on the first build after attaching, after a notification the
    /// predicate let through, after a holder swap, or after
    /// [`mark_needs_build`](Self::mark_needs_build). Otherwise returns the
    /// cached content. `None` unless attached.
    pub fn build(&self) -> Option<V>
    where
        V: Clone,
    {
        let (logic, context) = self.inner.attached()?;

        let cached = self.inner.content.borrow().clone();
        if let (false, Some(content)) = (self.inner.dirty.get(), cached) {
            return Some(content);
        }

        self.inner.dirty.set(false);
        let content = (self.inner.render)(&context, &logic);
        self.inner.renders.set(self.inner.renders.get() + 1);
        self.inner.last_seen_version.set(Some(logic.version()));
        *self.inner.content.borrow_mut() = Some(content.clone());
        Some(content)
    }

    /// Force a render on the next build (the host is rebuilding for its
    /// own reasons).
    pub fn mark_needs_build(&self) {
        self.inner.dirty.set(true);
    }

    /// Whether the next build will render.
    pub fn needs_build(&self) -> bool {
        self.state() == BinderState::Attached
            && (self.inner.dirty.get() || self.inner.content.borrow().is_none())
    }

    /// Unsubscribe and enter the terminal state. Safe to call repeatedly
    /// or before attaching.
    pub fn teardown(&self) {
        self.inner.detach();
    }

    pub fn state(&self) -> BinderState {
        self.inner.binding.borrow().state()
    }

    /// The attached holder.
    pub fn holder(&self) -> Option<Logic<S>> {
        self.inner.attached().map(|(logic, _)| logic)
    }

    /// Number of times the render function ran.
    pub fn render_count(&self) -> u64 {
        self.inner.renders.get()
    }

    /// Number of notifications received while attached.
    pub fn notification_count(&self) -> u64 {
        self.inner.notifications.get()
    }

    /// Holder version at the last render.
    pub fn last_seen_version(&self) -> Option<u64> {
        self.inner.last_seen_version.get()
    }

    fn listener(&self) -> impl Fn() + 'static {
        let weak: Weak<BinderInner<S, C, V>> = Rc::downgrade(&self.inner);
        move || {
            if let Some(inner) = weak.upgrade() {
                inner.on_notify();
            }
        }
    }
}

impl<S, C, V> fmt::Debug for Binder<S, C, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("state", &self.inner.binding.borrow().state())
            .field("dirty", &self.inner.dirty.get())
            .field("renders", &self.inner.renders.get())
            .field("notifications", &self.inner.notifications.get())
            .finish()
    }
}

// =============================================================================
// BINDER BUILDER
// =============================================================================

/// Configures a [`Binder`].
pub struct BinderBuilder<S, C, V> {
    render: RenderFn<S, C, V>,
    listen: Option<ListenFn<S, C>>,
    build_when: Option<BuildWhenFn<S>>,
    on_rebuild: Option<RebuildHook>,
}

impl<S, C, V> BinderBuilder<S, C, V>
where
    S: LogicState,
    C: ScopeResolver + Clone + 'static,
    V: 'static,
{
    /// Side effect run on every notification, before the predicate.
    pub fn listen(mut self, listen: impl Fn(&C, &Logic<S>) + 'static) -> Self {
        self.listen = Some(Box::new(listen));
        self
    }

    /// Only rebuild when `predicate` holds for the current state.
    pub fn build_when(mut self, predicate: impl Fn(&S) -> bool + 'static) -> Self {
        self.build_when = Some(Box::new(predicate));
        self
    }

    /// Called whenever the binder becomes dirty from a notification.
    pub fn on_rebuild_requested(mut self, hook: impl Fn() + 'static) -> Self {
        self.on_rebuild = Some(Rc::new(hook));
        self
    }

    pub fn build(self) -> Binder<S, C, V> {
        Binder {
            inner: Rc::new(BinderInner {
                render: self.render,
                listen: self.listen,
                build_when: self.build_when,
                on_rebuild: self.on_rebuild,
                binding: RefCell::new(Binding::Unattached),
                dirty: Cell::new(false),
                content: RefCell::new(None),
                last_seen_version: Cell::new(None),
                renders: Cell::new(0),
                notifications: Cell::new(0),
            }),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

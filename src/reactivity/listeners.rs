// ============================================================================
// spark-logic - Listener Set
// Ordered observer registry with snapshot notification
// ============================================================================
//
// Listeners are free to subscribe, unsubscribe or dispose the holder while a
// notification cycle is running. To keep the RefCell happy we use the
// "collect-then-call" pattern:
// 1. Clone the entries into a temporary Vec (releases the borrow)
// 2. Call each one, re-checking membership right before the call
//
// Ids come from one process-wide counter, so an id handed out by one set is
// never registered in another.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::types::ListenerId;

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

fn next_id() -> ListenerId {
    ListenerId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

// =============================================================================
// LISTENER SET
// =============================================================================

/// Registration-ordered set of callbacks.
///
/// `F` is the callback type, usually `dyn Fn()` for holder listeners or
/// `dyn Fn(u64)` for notify hooks.
pub struct ListenerSet<F: ?Sized> {
    /// Sorted by id: ids only grow and are always appended
    entries: RefCell<Vec<(ListenerId, Rc<F>)>>,

    /// Bumped on every removal, so a cycle with no removals skips re-checks
    removals: Cell<u64>,
}

impl<F: ?Sized> Default for ListenerSet<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> ListenerSet<F> {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            removals: Cell::new(0),
        }
    }

    /// Append a callback, returning its id
    pub fn add(&self, callback: Rc<F>) -> ListenerId {
        let id = next_id();
        self.entries.borrow_mut().push((id, callback));
        id
    }

    /// Allocate an id without registering anything.
    ///
    /// Used when a subscription request must be accepted but ignored.
    pub fn reserve_id(&self) -> ListenerId {
        next_id()
    }

    /// Remove a callback. Returns false if the id was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let Ok(index) = entries.binary_search_by_key(&id, |(entry_id, _)| *entry_id) else {
            return false;
        };
        let removed = entries.remove(index);
        // The callback may own the last handle to something that unsubscribes
        // from this set when dropped
        drop(entries);
        self.removals.set(self.removals.get() + 1);
        drop(removed);
        true
    }

    /// Whether the id is currently registered
    pub fn contains(&self, id: ListenerId) -> bool {
        self.entries
            .borrow()
            .binary_search_by_key(&id, |(entry_id, _)| *entry_id)
            .is_ok()
    }

    /// Number of registered callbacks
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether no callbacks are registered
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Drop every callback
    pub fn clear(&self) {
        // Take first so callback destructors never run under the borrow
        let drained = std::mem::take(&mut *self.entries.borrow_mut());
        self.removals.set(self.removals.get() + 1);
        drop(drained);
    }

    /// Call every live callback in registration order.
    ///
    /// The list is snapshotted up front. Before each call the entry is
    /// re-checked: callbacks removed mid-cycle are skipped, and the cycle
    /// stops as soon as `proceed` returns false. Callbacks added mid-cycle
    /// wait for the next cycle.
    ///
    /// Returns the number of callbacks invoked.
    pub fn notify(&self, mut proceed: impl FnMut() -> bool, mut call: impl FnMut(&F)) -> usize {
        let snapshot: Vec<(ListenerId, Rc<F>)> = self
            .entries
            .borrow()
            .iter()
            .map(|(id, callback)| (*id, Rc::clone(callback)))
            .collect();

        let removals = self.removals.get();
        let mut invoked = 0;
        for (id, callback) in snapshot {
            if !proceed() {
                break;
            }
            if self.removals.get() != removals && !self.contains(id) {
                continue;
            }
            call(&callback);
            invoked += 1;
        }
        invoked
    }
}

// =============================================================================
// TESTS
// =============================================================================

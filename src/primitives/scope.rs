// ============================================================================
// spark-logic - Logic Scope
//
// Bind a set of holders into a subtree, one holder per key.
// ============================================================================
//
// A LogicScope is built once from an ordered list of holders and never
// changes afterwards. It records:
// - key -> holder, for lookup by descendants
// - key -> version, a snapshot taken at construction
//
// The version snapshot is what lets a host decide whether descendants need
// to be revisited when a scope is replaced by a new instance: if the set
// of keys and every recorded version match, nothing observable changed.
//
// Holders are owned explicitly. `dispose_holders()` disposes them in
// reverse construction order, like teardown cleanups run LIFO.
// ============================================================================

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::core::error::{LookupError, ScopeError};
use crate::core::types::{AnyLogic, LogicKey, LogicState};
use crate::primitives::logic::Logic;

// =============================================================================
// SCOPE INNER
// =============================================================================

struct ScopeInner {
    /// Holders in construction order
    holders: Vec<Rc<dyn AnyLogic>>,

    /// Key -> position in `holders`
    index: HashMap<LogicKey, usize>,

    /// Key -> version observed at construction
    versions: HashMap<LogicKey, u64>,

    /// Whether `dispose_holders` already ran
    disposed: Cell<bool>,
}

// =============================================================================
// LOGIC SCOPE (Public handle)
// =============================================================================

/// An immutable set of holders, one per [`LogicKey`].
///
/// Cloning shares the same scope instance.
///
/// # Example
///
/// ```
/// use spark_logic::{Logic, LogicScope, logic_state};
///
/// struct Counter(i32);
/// struct Session(String);
/// logic_state!(Counter => "counter");
/// logic_state!(Session => "session");
///
/// let counter = Logic::new(Counter(0));
/// let session = Logic::new(Session("guest".into()));
///
/// let scope = LogicScope::builder()
///     .provide(&counter)
///     .provide(&session)
///     .build()
///     .unwrap();
///
/// let found = scope.get::<Counter>().unwrap();
/// assert!(found.ptr_eq(&counter));
/// ```
#[derive(Clone)]
pub struct LogicScope {
    inner: Rc<ScopeInner>,
}

impl LogicScope {
    /// Start building a scope.
    pub fn builder() -> ScopeBuilder {
        ScopeBuilder::default()
    }

    /// Build a scope from type-erased holders.
    ///
    /// Fails on the first key that appears twice.
    pub fn new(holders: Vec<Rc<dyn AnyLogic>>) -> Result<Self, ScopeError> {
        let mut index = HashMap::with_capacity(holders.len());
        let mut versions = HashMap::with_capacity(holders.len());

        for (position, holder) in holders.iter().enumerate() {
            let key = holder.key();
            if index.insert(key, position).is_some() {
                tracing::warn!(message = "scope.duplicate", key = key.as_str());
                return Err(ScopeError::DuplicateRegistration { key });
            }
            versions.insert(key, holder.version());
        }

        Ok(Self {
            inner: Rc::new(ScopeInner {
                holders,
                index,
                versions,
                disposed: Cell::new(false),
            }),
        })
    }

    /// Resolve the holder registered for `S`.
    pub fn get<S: LogicState>(&self) -> Result<Logic<S>, LookupError> {
        self.inner
            .index
            .get(&S::KEY)
            .and_then(|&position| {
                self.inner.holders[position]
                    .as_any()
                    .downcast_ref::<Logic<S>>()
                    .cloned()
            })
            .ok_or(LookupError::NotRegistered { key: S::KEY })
    }

    /// Whether a holder for `S` is registered.
    pub fn contains<S: LogicState>(&self) -> bool {
        self.get::<S>().is_ok()
    }

    /// Whether any holder is registered under `key`.
    pub fn contains_key(&self, key: LogicKey) -> bool {
        self.inner.index.contains_key(&key)
    }

    /// Registered keys, in construction order.
    pub fn keys(&self) -> impl Iterator<Item = LogicKey> + '_ {
        self.inner.holders.iter().map(|holder| holder.key())
    }

    /// Number of registered holders.
    pub fn len(&self) -> usize {
        self.inner.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.holders.is_empty()
    }

    /// Version of `key` recorded when this scope was built.
    pub fn recorded_version(&self, key: LogicKey) -> Option<u64> {
        self.inner.versions.get(&key).copied()
    }

    /// Whether descendants must be revisited when `old` is replaced by `self`.
    ///
    /// True if the number of keys differs, or any key's recorded version
    /// differs (a key missing from `old` counts as a difference).
    pub fn should_notify(&self, old: &LogicScope) -> bool {
        if self.inner.versions.len() != old.inner.versions.len() {
            return true;
        }
        self.inner
            .versions
            .iter()
            .any(|(key, version)| old.inner.versions.get(key) != Some(version))
    }

    /// A new scope instance over the same holders, with a fresh version
    /// snapshot.
    pub fn refreshed(&self) -> LogicScope {
        let versions = self
            .inner
            .holders
            .iter()
            .map(|holder| (holder.key(), holder.version()))
            .collect();

        Self {
            inner: Rc::new(ScopeInner {
                holders: self.inner.holders.clone(),
                index: self.inner.index.clone(),
                versions,
                disposed: Cell::new(false),
            }),
        }
    }

    /// Dispose every holder, last registered first.
    ///
    /// Idempotent for this scope instance.
    pub fn dispose_holders(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        for holder in self.inner.holders.iter().rev() {
            holder.dispose();
        }
        tracing::debug!(message = "scope.dispose", holders = self.len());
    }

    /// Whether `dispose_holders` has run on this instance.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Whether two handles point at the same scope instance.
    pub fn ptr_eq(&self, other: &LogicScope) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for LogicScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for key in self.keys() {
            map.entry(&key.as_str(), &self.recorded_version(key));
        }
        map.finish()
    }
}

// =============================================================================
// SCOPE BUILDER
// =============================================================================

/// Collects holders for a [`LogicScope`], preserving order.
#[derive(Default)]
pub struct ScopeBuilder {
    holders: Vec<Rc<dyn AnyLogic>>,
}

impl ScopeBuilder {
    /// Add a typed holder.
    pub fn provide<S: LogicState>(mut self, logic: &Logic<S>) -> Self {
        self.holders.push(Rc::new(logic.clone()));
        self
    }

    /// Add a type-erased holder.
    pub fn provide_any(mut self, logic: Rc<dyn AnyLogic>) -> Self {
        self.holders.push(logic);
        self
    }

    /// Build the scope, failing on duplicate keys.
    pub fn build(self) -> Result<LogicScope, ScopeError> {
        LogicScope::new(self.holders)
    }
}

// =============================================================================
// TESTS
// =============================================================================

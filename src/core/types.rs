// ============================================================================
// spark-logic - Type Definitions
// Stable keys, listener ids and the type-erased holder interface
// ============================================================================
//
// A scope stores holders of many different state types side by side. Scope
// operations (lookup by key, version snapshots, disposal) don't need to know
// the state type, only resolving a typed handle does. So the scope keeps
// `Rc<dyn AnyLogic>` and downcasts on the way out.
// ============================================================================

use std::any::Any;
use std::fmt;

// =============================================================================
// LOGIC KEY
// =============================================================================

/// Stable identity of a logic kind.
///
/// Every state type declares one through [`LogicState::KEY`]. Two holders
/// with the same key cannot live in one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogicKey(&'static str);

impl LogicKey {
    /// Create a key from a static name.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The name this key was declared with.
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for LogicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

// =============================================================================
// LOGIC STATE
// =============================================================================

/// A state type that can be held by a [`Logic`](crate::Logic).
///
/// Implement it by hand or with the [`logic_state!`](crate::logic_state) macro.
///
/// ```
/// use spark_logic::{LogicKey, LogicState};
///
/// struct Counter {
///     value: i32,
/// }
///
/// impl LogicState for Counter {
///     const KEY: LogicKey = LogicKey::new("counter");
/// }
///
/// assert_eq!(Counter::KEY.as_str(), "counter");
/// ```
pub trait LogicState: 'static {
    /// Identity used for scope registration and lookup.
    const KEY: LogicKey;
}

// =============================================================================
// LISTENER ID
// =============================================================================

/// Handle returned by `subscribe`, used to unsubscribe later.
///
/// Ids are unique across every holder in the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

impl ListenerId {
    /// Raw numeric value (allocation sequence number).
    pub fn raw(&self) -> u64 {
        self.0
    }
}

// =============================================================================
// TYPE-ERASED HOLDER
// =============================================================================

/// Type-erased holder interface for scope operations.
///
/// Implemented by every `Logic<S>`. Enables storing holders of different
/// state types in the same scope.
pub trait AnyLogic: Any {
    /// Key of the held state type
    fn key(&self) -> LogicKey;

    /// Current version counter
    fn version(&self) -> u64;

    /// Whether `dispose` has been called
    fn is_disposed(&self) -> bool;

    /// Dispose the holder (idempotent)
    fn dispose(&self);

    /// Number of registered listeners
    fn listener_count(&self) -> usize;

    /// Downcast support
    fn as_any(&self) -> &dyn Any;
}

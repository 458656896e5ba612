// ============================================================================
// spark-logic - Scope Resolution
// The injected "find my nearest scope" capability
// ============================================================================
//
// Consumers never reach for ambient state to find their scope. Whatever
// position they live at in the host's tree is passed in explicitly as a
// ScopeResolver. Resolution is single-scope: the nearest scope either has
// the requested key or the lookup fails. There is no fallback to scopes
// further up the tree.
// ============================================================================

use std::rc::Rc;

use crate::core::error::LookupError;
use crate::core::types::LogicState;
use crate::primitives::logic::Logic;
use crate::primitives::scope::LogicScope;

/// Something that knows the nearest enclosing [`LogicScope`].
pub trait ScopeResolver {
    /// The nearest enclosing scope, if any.
    fn nearest_scope(&self) -> Option<LogicScope>;
}

impl ScopeResolver for LogicScope {
    fn nearest_scope(&self) -> Option<LogicScope> {
        Some(self.clone())
    }
}

impl ScopeResolver for Option<LogicScope> {
    fn nearest_scope(&self) -> Option<LogicScope> {
        self.clone()
    }
}

impl<R: ScopeResolver + ?Sized> ScopeResolver for &R {
    fn nearest_scope(&self) -> Option<LogicScope> {
        (**self).nearest_scope()
    }
}

impl<R: ScopeResolver + ?Sized> ScopeResolver for Rc<R> {
    fn nearest_scope(&self) -> Option<LogicScope> {
        (**self).nearest_scope()
    }
}

/// Resolve the holder for `S` from the nearest scope.
///
/// # Errors
///
/// [`LookupError::NoScope`] if nothing encloses `cx`,
/// [`LookupError::NotRegistered`] if the nearest scope lacks `S`.
///
/// # Example
///
/// ```
/// use spark_logic::{Logic, LogicScope, LookupError, logic_state, resolve};
///
/// struct Counter(i32);
/// logic_state!(Counter => "counter");
///
/// let counter = Logic::new(Counter(0));
/// let scope = LogicScope::builder().provide(&counter).build().unwrap();
///
/// assert!(resolve::<Counter>(&scope).unwrap().ptr_eq(&counter));
/// assert_eq!(resolve::<Counter>(&None::<LogicScope>).err(), Some(LookupError::NoScope));
/// ```
pub fn resolve<S: LogicState>(cx: &dyn ScopeResolver) -> Result<Logic<S>, LookupError> {
    let result = cx
        .nearest_scope()
        .ok_or(LookupError::NoScope)
        .and_then(|scope| scope.get::<S>());

    if let Err(error) = &result {
        tracing::debug!(message = "scope.lookup.failed", key = S::KEY.as_str(), %error);
    }
    result
}

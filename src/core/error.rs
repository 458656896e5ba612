// ============================================================================
// spark-logic - Errors
// Programmer errors raised by scope construction and lookup
// ============================================================================
//
// Post-dispose operations are deliberately absent here: emitting, mutating
// or subscribing on a disposed holder is a silent no-op, never an error.
// Mutation-block errors are the caller's own type and pass through unchanged.
// ============================================================================

use super::types::LogicKey;

/// Failure while building a [`LogicScope`](crate::LogicScope).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    /// Two holders declared the same key
    #[error("logic `{key}` is registered more than once in the same scope")]
    DuplicateRegistration { key: LogicKey },
}

/// Failure while resolving a holder from the nearest scope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// No scope encloses the lookup position
    #[error("no logic scope encloses this position")]
    NoScope,

    /// The nearest scope has no holder for the requested key
    #[error("logic `{key}` is not registered in the nearest scope")]
    NotRegistered { key: LogicKey },
}

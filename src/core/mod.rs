// ============================================================================
// spark-logic - Core Module
// Keys, ids, the type-erased holder trait and error types
// ============================================================================

pub mod error;
pub mod types;

// Re-export commonly used items
pub use error::{LookupError, ScopeError};
pub use types::{AnyLogic, ListenerId, LogicKey, LogicState};

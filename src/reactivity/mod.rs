// ============================================================================
// spark-logic - Reactivity Module
// Listener bookkeeping, notify hooks, and scope resolution
// ============================================================================

pub mod hooks;
pub mod listeners;
pub mod resolver;
pub mod tree;

// Re-export notification plumbing
pub use hooks::{HookFn, HookId, HookStage, NotifyHooks};
pub use listeners::ListenerSet;

// Re-export resolution
pub use resolver::{resolve, ScopeResolver};
pub use tree::{NodeId, ScopeTree, TreePosition};

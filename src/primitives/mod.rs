// ============================================================================
// spark-logic - Primitives Module
// Holder, mutation helper, scope and binder
// ============================================================================

pub mod binder;
pub mod logic;
pub mod mutation;
pub mod scope;

// Re-export for convenience
pub use binder::{
    Binder, BinderBuilder, BinderState, BuildWhenFn, ListenFn, RebuildHook, RenderFn,
};
pub use logic::{Logic, LogicOptions};
pub use mutation::{Applied, Mutation, MutationFuture, PendingMutation, Writer};
pub use scope::{LogicScope, ScopeBuilder};

// ============================================================================
// spark-logic - Scoped Reactive State Holders for Rust
// ============================================================================
//
// Three pieces:
// - Logic<S>: an observable holder with a version counter and listeners
// - LogicScope: an immutable set of holders provided to a subtree
// - Binder: a UI element bound to one holder from its nearest scope
//
// Everything is single-threaded (Rc/RefCell). Notifications are synchronous
// and delivered in registration order.
// ============================================================================

#[macro_use]
mod macros;

pub mod core;
pub mod primitives;
pub mod reactivity;

// Re-export core items at crate root for ergonomic access
pub use core::error::{LookupError, ScopeError};
pub use core::types::{AnyLogic, ListenerId, LogicKey, LogicState};

// Re-export primitives at crate root
pub use primitives::binder::{
    Binder, BinderBuilder, BinderState, BuildWhenFn, ListenFn, RebuildHook, RenderFn,
};
pub use primitives::logic::{Logic, LogicOptions};
pub use primitives::mutation::{Applied, Mutation, MutationFuture, PendingMutation, Writer};
pub use primitives::scope::{LogicScope, ScopeBuilder};

// Re-export reactivity plumbing
pub use reactivity::hooks::{HookFn, HookId, HookStage, NotifyHooks};
pub use reactivity::listeners::ListenerSet;
pub use reactivity::resolver::{ScopeResolver, resolve};
pub use reactivity::tree::{NodeId, ScopeTree, TreePosition};

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    struct Counter {
        value: i32,
    }
    logic_state!(Counter => "counter");

    #[derive(Debug, Clone, PartialEq)]
    struct Todos {
        items: Vec<String>,
    }
    logic_state!(Todos);

    // =========================================================================
    // Holder
    // =========================================================================

    #[test]
    fn holder_versions_and_notifies_once_per_mutation() {
        let counter = Logic::new(Counter { value: 0 });
        let seen = Rc::new(RefCell::new(Vec::new()));

        counter.subscribe(cloned!(counter, seen => move || {
            seen.borrow_mut().push((counter.version(), counter.read(|c| c.value)));
        }));

        counter.mutate(|c| c.value += 1);
        counter.mutate(|c| c.value += 1);

        assert_eq!(*seen.borrow(), vec![(1, 1), (2, 2)]);
    }

    #[test]
    fn macro_derives_key_from_type_name() {
        assert_eq!(Todos::KEY.as_str(), "Todos");
        assert_eq!(Counter::KEY.as_str(), "counter");
    }

    // =========================================================================
    // Scope + Binder
    // =========================================================================

    #[test]
    fn binders_resolve_distinct_holders_from_one_scope() {
        let counter = Logic::new(Counter { value: 0 });
        let todos = Logic::new(Todos { items: Vec::new() });
        let scope = LogicScope::builder()
            .provide(&counter)
            .provide(&todos)
            .build()
            .unwrap();

        let count_view =
            Binder::builder(|_: &LogicScope, l: &Logic<Counter>| l.read(|c| c.value)).build();
        let todo_view =
            Binder::builder(|_: &LogicScope, l: &Logic<Todos>| l.read(|t| t.items.len())).build();

        count_view.resolve_dependencies(scope.clone()).unwrap();
        todo_view.resolve_dependencies(scope.clone()).unwrap();

        assert_eq!(count_view.build(), Some(0));
        assert_eq!(todo_view.build(), Some(0));

        todos.mutate(|t| t.items.push("write docs".into()));

        assert!(!count_view.needs_build());
        assert!(todo_view.needs_build());
        assert_eq!(todo_view.build(), Some(1));
        assert_eq!(count_view.render_count(), 1);
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let a = Logic::new(Counter { value: 0 });
        let b = Logic::new(Counter { value: 1 });

        let err = LogicScope::builder()
            .provide(&a)
            .provide(&b)
            .build()
            .unwrap_err();
        assert_eq!(err, ScopeError::DuplicateRegistration { key: Counter::KEY });
    }

    #[test]
    fn disposing_the_scope_silences_every_holder() {
        let counter = Logic::new(Counter { value: 0 });
        let scope = LogicScope::builder().provide(&counter).build().unwrap();
        let calls = Rc::new(Cell::new(0));

        counter.subscribe(cloned!(calls => move || calls.set(calls.get() + 1)));
        scope.dispose_holders();

        assert_eq!(counter.mutate(|c| c.value = 9), None);
        assert_eq!(calls.get(), 0);
        assert_eq!(counter.read(|c| c.value), 0);
        assert!(scope.is_disposed());
    }

    #[test]
    fn tree_position_drives_a_binder() {
        let tree = ScopeTree::new();
        let page = tree.add_child(tree.root());
        let label = tree.add_child(page);

        let counter = Logic::new(Counter { value: 3 });
        let scope = LogicScope::builder().provide(&counter).build().unwrap();
        tree.provide(page, scope);

        let binder = Binder::builder(|_: &TreePosition, l: &Logic<Counter>| {
            l.read(|c| format!("{}", c.value))
        })
        .build();

        binder.resolve_dependencies(tree.position(label)).unwrap();
        assert_eq!(binder.build().as_deref(), Some("3"));
        assert_eq!(binder.state(), BinderState::Attached);
    }
}

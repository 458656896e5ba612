// ============================================================================
// spark-logic - Scope Tree
// A minimal host tree: nodes, parent links, and scopes registered at nodes
// ============================================================================
//
// Hosts with their own widget tree implement ScopeResolver directly. For
// everything else (tools, headless apps, tests) ScopeTree plays the host:
//
// - `provide(node, scope)` registers a scope and answers the host question
//   "must descendants be revisited?" using LogicScope::should_notify
// - `position(node)` hands out a TreePosition, the explicit context passed
//   to binders and to `resolve`
//
// Nodes are append-only and always point at an older parent, so walking up
// terminates.
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::primitives::scope::LogicScope;
use crate::reactivity::resolver::ScopeResolver;

/// Index of a node in a [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

struct Node {
    parent: Option<NodeId>,
    scope: Option<LogicScope>,
}

/// Shared, append-only tree of scope positions.
///
/// Cloning shares the same tree.
///
/// # Example
///
/// ```
/// use spark_logic::{Logic, LogicScope, ScopeTree, logic_state, resolve};
///
/// struct Counter(i32);
/// logic_state!(Counter => "counter");
///
/// let tree = ScopeTree::new();
/// let page = tree.add_child(tree.root());
/// let button = tree.add_child(page);
///
/// let counter = Logic::new(Counter(0));
/// tree.provide(page, LogicScope::builder().provide(&counter).build().unwrap());
///
/// let found = resolve::<Counter>(&tree.position(button)).unwrap();
/// assert!(found.ptr_eq(&counter));
/// ```
#[derive(Clone)]
pub struct ScopeTree {
    nodes: Rc<RefCell<Vec<Node>>>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    /// Create a tree with a single root node.
    pub fn new() -> Self {
        Self {
            nodes: Rc::new(RefCell::new(vec![Node {
                parent: None,
                scope: None,
            }])),
        }
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append a child under `parent`.
    ///
    /// An unknown parent yields a detached node with no ancestors.
    pub fn add_child(&self, parent: NodeId) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let parent = (parent.0 < nodes.len()).then_some(parent);
        nodes.push(Node {
            parent,
            scope: None,
        });
        NodeId(nodes.len() - 1)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    /// Always false: the root exists from construction.
    pub fn is_empty(&self) -> bool {
        self.nodes.borrow().is_empty()
    }

    /// Parent of `node`.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.borrow().get(node.0).and_then(|n| n.parent)
    }

    /// Register `scope` at `node`, replacing any previous one.
    ///
    /// Returns whether descendants must be revisited: always on first
    /// registration, otherwise the new scope's `should_notify` against the
    /// old one. Unknown nodes are ignored and return false.
    pub fn provide(&self, node: NodeId, scope: LogicScope) -> bool {
        let previous = {
            let mut nodes = self.nodes.borrow_mut();
            let Some(slot) = nodes.get_mut(node.0) else {
                tracing::debug!(message = "tree.provide.unknown_node", node = node.0);
                return false;
            };
            slot.scope.replace(scope.clone())
        };

        let notify = previous.is_none_or(|old| scope.should_notify(&old));
        tracing::trace!(message = "tree.provide", node = node.0, notify);
        notify
    }

    /// Remove the scope registered at `node`.
    pub fn remove_scope(&self, node: NodeId) -> Option<LogicScope> {
        self.nodes
            .borrow_mut()
            .get_mut(node.0)
            .and_then(|slot| slot.scope.take())
    }

    /// Scope registered exactly at `node`.
    pub fn scope_at(&self, node: NodeId) -> Option<LogicScope> {
        self.nodes
            .borrow()
            .get(node.0)
            .and_then(|slot| slot.scope.clone())
    }

    /// Nearest scope at or above `node`.
    pub fn nearest_scope_from(&self, node: NodeId) -> Option<LogicScope> {
        let nodes = self.nodes.borrow();
        let mut current = Some(node);
        while let Some(id) = current {
            let slot = nodes.get(id.0)?;
            if let Some(scope) = &slot.scope {
                return Some(scope.clone());
            }
            current = slot.parent;
        }
        None
    }

    /// A resolver bound to `node`.
    pub fn position(&self, node: NodeId) -> TreePosition {
        TreePosition {
            tree: self.clone(),
            node,
        }
    }
}

impl fmt::Debug for ScopeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes = self.nodes.borrow();
        let scoped = nodes.iter().filter(|n| n.scope.is_some()).count();
        f.debug_struct("ScopeTree")
            .field("nodes", &nodes.len())
            .field("scopes", &scoped)
            .finish()
    }
}

// =============================================================================
// TREE POSITION
// =============================================================================

/// A node of a [`ScopeTree`], usable wherever a [`ScopeResolver`] is needed.
#[derive(Clone)]
pub struct TreePosition {
    tree: ScopeTree,
    node: NodeId,
}

impl TreePosition {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn tree(&self) -> &ScopeTree {
        &self.tree
    }
}

impl ScopeResolver for TreePosition {
    fn nearest_scope(&self) -> Option<LogicScope> {
        self.tree.nearest_scope_from(self.node)
    }
}

impl fmt::Debug for TreePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TreePosition").field(&self.node.0).finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::LookupError;
    use crate::core::types::{LogicKey, LogicState};
    use crate::primitives::logic::Logic;
    use crate::reactivity::resolver::resolve;

    struct Counter;
    impl LogicState for Counter {
        const KEY: LogicKey = LogicKey::new("counter");
    }

    struct Theme;
    impl LogicState for Theme {
        const KEY: LogicKey = LogicKey::new("theme");
    }

    fn scope_with_counter(counter: &Logic<Counter>) -> LogicScope {
        LogicScope::builder().provide(counter).build().unwrap()
    }

    #[test]
    fn root_has_no_scope() {
        let tree = ScopeTree::new();

        assert_eq!(tree.len(), 1);
        assert!(!tree.is_empty());
        assert_eq!(tree.parent(tree.root()), None);
        assert_eq!(
            resolve::<Counter>(&tree.position(tree.root())).err(),
            Some(LookupError::NoScope)
        );
    }

    #[test]
    fn nearest_scope_wins() {
        let tree = ScopeTree::new();
        let outer = tree.add_child(tree.root());
        let inner = tree.add_child(outer);
        let leaf = tree.add_child(inner);

        let outer_counter = Logic::new(Counter);
        let inner_counter = Logic::new(Counter);
        tree.provide(outer, scope_with_counter(&outer_counter));
        tree.provide(inner, scope_with_counter(&inner_counter));

        let found = resolve::<Counter>(&tree.position(leaf)).unwrap();
        assert!(found.ptr_eq(&inner_counter));

        let found = resolve::<Counter>(&tree.position(outer)).unwrap();
        assert!(found.ptr_eq(&outer_counter));
    }

    #[test]
    fn lookup_does_not_chain_past_nearest_scope() {
        let tree = ScopeTree::new();
        let outer = tree.add_child(tree.root());
        let inner = tree.add_child(outer);

        let counter = Logic::new(Counter);
        let theme = Logic::new(Theme);
        tree.provide(outer, scope_with_counter(&counter));
        let themed = LogicScope::builder().provide(&theme).build().unwrap();
        tree.provide(inner, themed);

        assert_eq!(
            resolve::<Counter>(&tree.position(inner)).err(),
            Some(LookupError::NotRegistered { key: Counter::KEY })
        );
    }

    #[test]
    fn provide_reports_whether_descendants_change() {
        let tree = ScopeTree::new();
        let node = tree.add_child(tree.root());
        let counter = Logic::new(Counter);

        let first = scope_with_counter(&counter);
        assert!(tree.provide(node, first.clone()), "first registration");

        assert!(!tree.provide(node, first.refreshed()), "nothing changed");

        counter.emit();
        assert!(tree.provide(node, first.refreshed()), "version moved");
    }

    #[test]
    fn remove_scope_clears_the_node() {
        let tree = ScopeTree::new();
        let node = tree.add_child(tree.root());
        let counter = Logic::new(Counter);
        tree.provide(node, scope_with_counter(&counter));

        assert!(tree.scope_at(node).is_some());
        assert!(tree.remove_scope(node).is_some());
        assert!(tree.scope_at(node).is_none());
        assert!(tree.nearest_scope_from(node).is_none());
    }

    #[test]
    fn unknown_nodes_are_harmless() {
        let tree = ScopeTree::new();
        let other = ScopeTree::new();
        let far = other.add_child(other.add_child(other.root()));

        let counter = Logic::new(Counter);
        assert!(!tree.provide(far, scope_with_counter(&counter)));
        assert!(tree.nearest_scope_from(far).is_none());

        let orphan = tree.add_child(far);
        assert_eq!(tree.parent(orphan), None);
    }
}

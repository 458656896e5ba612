// ============================================================================
// spark-logic - Notify Hooks
// Optional callbacks that run around each emit
// ============================================================================

use std::rc::Rc;

use crate::core::types::ListenerId;
use crate::reactivity::listeners::ListenerSet;

/// Which side of the listener pass a hook runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookStage {
    /// After the version bump, before any listener runs
    BeforeNotify,
    /// After every listener has run
    AfterNotify,
}

/// Handle for a registered hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId {
    pub stage: HookStage,
    pub id: ListenerId,
}

/// Hook callback, receives the version being notified.
pub type HookFn = dyn Fn(u64);

/// Pre/post notify hook lists.
#[derive(Default)]
pub struct NotifyHooks {
    before: ListenerSet<HookFn>,
    after: ListenerSet<HookFn>,
}

impl NotifyHooks {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self, stage: HookStage) -> &ListenerSet<HookFn> {
        match stage {
            HookStage::BeforeNotify => &self.before,
            HookStage::AfterNotify => &self.after,
        }
    }

    pub fn add(&self, stage: HookStage, hook: Rc<HookFn>) -> HookId {
        HookId {
            stage,
            id: self.set(stage).add(hook),
        }
    }

    /// An id for `stage` that is never registered.
    pub fn reserve(&self, stage: HookStage) -> HookId {
        HookId {
            stage,
            id: self.set(stage).reserve_id(),
        }
    }

    pub fn remove(&self, hook: HookId) -> bool {
        self.set(hook.stage).remove(hook.id)
    }

    pub fn len(&self) -> usize {
        self.before.len() + self.after.len()
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }

    pub fn clear(&self) {
        self.before.clear();
        self.after.clear();
    }

    /// Run the hooks of one stage for `version`.
    pub fn run(&self, stage: HookStage, version: u64, proceed: impl FnMut() -> bool) -> usize {
        self.set(stage).notify(proceed, |hook| hook(version))
    }
}

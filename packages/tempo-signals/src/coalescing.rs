use crate::scope::Scope;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{trace, warn};

thread_local! {
    static CURRENT: CoalescingManager = CoalescingManager::new();
}

/// Per-scope reference counts of outstanding triggers.
///
/// A consumer increments before deferring work and decrements inside that
/// work right before deciding whether to perform its side effect. The
/// decrement that brings the count to zero is the one whose effect runs;
/// every earlier one in the same burst sees the scope still coalescing.
///
/// Clones share the same counts.
#[derive(Clone, Default)]
pub struct CoalescingManager {
    counts: Rc<RefCell<FxHashMap<Scope, usize>>>,
}

impl CoalescingManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The manager shared by everything on this thread.
    pub fn current() -> Self {
        CURRENT.with(|manager| manager.clone())
    }

    /// Bumps the count for `scope` and returns the new count.
    pub fn increment(&self, scope: &Scope) -> usize {
        let mut counts = self.counts.borrow_mut();
        let count = counts.entry(scope.clone()).or_insert(0);
        *count += 1;
        trace!(?scope, count = *count, "coalescing increment");
        *count
    }

    pub fn add(&self, scope: &Scope) -> usize {
        self.increment(scope)
    }

    /// Drops the count for `scope` and returns what remains. The entry is
    /// removed when it reaches zero. Decrementing a scope that is not
    /// coalescing leaves it at zero.
    pub fn decrement(&self, scope: &Scope) -> usize {
        let mut counts = self.counts.borrow_mut();
        let Some(count) = counts.get_mut(scope) else {
            warn!(?scope, "decrement on a scope that is not coalescing");
            return 0;
        };
        *count -= 1;
        let remaining = *count;
        if remaining == 0 {
            counts.remove(scope);
        }
        trace!(?scope, count = remaining, "coalescing decrement");
        remaining
    }

    pub fn remove(&self, scope: &Scope) -> usize {
        self.decrement(scope)
    }

    pub fn is_coalescing(&self, scope: &Scope) -> bool {
        self.count(scope) > 0
    }

    pub fn count(&self, scope: &Scope) -> usize {
        self.counts.borrow().get(scope).copied().unwrap_or(0)
    }

    /// Number of scopes with a non-zero count.
    pub fn active_scopes(&self) -> usize {
        self.counts.borrow().len()
    }

    pub fn scoped(&self, scope: Scope) -> ScopedCoalescing {
        ScopedCoalescing {
            manager: self.clone(),
            scope,
        }
    }
}

impl std::fmt::Debug for CoalescingManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoalescingManager")
            .field("active_scopes", &self.active_scopes())
            .finish()
    }
}

/// A [`CoalescingManager`] bound to one scope.
#[derive(Clone, Debug)]
pub struct ScopedCoalescing {
    manager: CoalescingManager,
    scope: Scope,
}

impl ScopedCoalescing {
    pub fn add(&self) -> usize {
        self.manager.increment(&self.scope)
    }

    pub fn remove(&self) -> usize {
        self.manager.decrement(&self.scope)
    }

    pub fn is_coalescing(&self) -> bool {
        self.manager.is_coalescing(&self.scope)
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}

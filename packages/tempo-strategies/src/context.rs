use std::rc::Rc;
use tempo_scheduler::{Host, Scheduler};
use tempo_signals::{CoalescingManager, Scope};

/// Marker stored in the root-wide coalescing scope.
#[derive(Debug)]
pub struct RootContext;

/// Everything the built-in strategies schedule and coalesce against.
#[derive(Clone, Debug)]
pub struct StrategyContext {
    scheduler: Scheduler,
    coalescing: CoalescingManager,
    root_scope: Scope,
}

impl StrategyContext {
    /// Uses the thread's shared [`CoalescingManager`].
    pub fn new(scheduler: Scheduler) -> Self {
        Self::with_coalescing(scheduler, CoalescingManager::current())
    }

    pub fn with_coalescing(scheduler: Scheduler, coalescing: CoalescingManager) -> Self {
        Self {
            scheduler,
            coalescing,
            root_scope: Scope::new(RootContext),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn host(&self) -> &Rc<dyn Host> {
        self.scheduler.host()
    }

    pub fn coalescing(&self) -> &CoalescingManager {
        &self.coalescing
    }

    /// Scope shared by every strategy that coalesces tree-wide.
    pub fn root_scope(&self) -> &Scope {
        &self.root_scope
    }
}

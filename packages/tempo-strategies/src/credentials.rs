use crate::handle::RenderHandle;
use std::fmt;
use std::rc::Rc;
use tempo_signals::{Operator, Scope};

/// Render work already bound to a handle and scope.
pub type Work = Rc<dyn Fn()>;

/// The side effect of a strategy.
pub type RenderWork = Rc<dyn Fn(&dyn RenderHandle, &Scope)>;

/// Wraps a trigger source with a strategy's scheduling discipline.
pub type Behavior<T> = Rc<dyn Fn(Work, Scope) -> Operator<T>>;

/// A named render strategy: what rendering means (`work`) and when it
/// happens relative to trigger signals (`behavior`).
///
/// `work` is never scheduled or coalesced by itself; `behavior` decides
/// when to call it. Clones share the same functions, so two clones are
/// [`ptr_eq`](Self::ptr_eq).
pub struct StrategyCredentials<T> {
    name: String,
    work: RenderWork,
    behavior: Behavior<T>,
}

impl<T> Clone for StrategyCredentials<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            work: self.work.clone(),
            behavior: self.behavior.clone(),
        }
    }
}

impl<T: 'static> StrategyCredentials<T> {
    pub fn new(
        name: impl Into<String>,
        work: impl Fn(&dyn RenderHandle, &Scope) + 'static,
        behavior: impl Fn(Work, Scope) -> Operator<T> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            work: Rc::new(work),
            behavior: Rc::new(behavior),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn work(&self, handle: &dyn RenderHandle, scope: &Scope) {
        (self.work)(handle, scope)
    }

    pub fn behavior(&self, work: Work, scope: Scope) -> Operator<T> {
        (self.behavior)(work, scope)
    }

    /// Binds `work` to `handle` and `scope` and returns the resulting
    /// behavior.
    pub fn bind(&self, handle: Rc<dyn RenderHandle>, scope: Scope) -> Operator<T> {
        let render = self.work.clone();
        let bound_scope = scope.clone();
        let work: Work = Rc::new(move || render(&*handle, &bound_scope));
        self.behavior(work, scope)
    }

    pub fn ptr_eq(&self, other: &StrategyCredentials<T>) -> bool {
        self.name == other.name && Rc::ptr_eq(&self.behavior, &other.behavior)
    }
}

impl<T> fmt::Debug for StrategyCredentials<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyCredentials")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

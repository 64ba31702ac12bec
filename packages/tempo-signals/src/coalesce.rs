use crate::coalescing::CoalescingManager;
use crate::error::SignalError;
use crate::operators::Operator;
use crate::scope::Scope;
use crate::source::{FnObserver, Observer, Source, Subscriber};
use crate::subscription::Subscription;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Collapses bursts of values into one emission per window.
///
/// The first value after a quiet period opens a window: the scope's count
/// is incremented and `duration_selector` is subscribed once. Later values
/// only replace the stored latest value. When the selector fires or
/// completes (or the source completes) the window closes: the count is decremented and the
/// latest value is emitted only if the scope is no longer coalescing, so
/// among subscriptions sharing a scope only the last window to close
/// emits.
///
/// Without an explicit `scope` every subscription coalesces on its own.
/// Errors pass through without flushing.
pub fn coalesce_with<T: 'static, D: 'static>(
    duration_selector: Source<D>,
    scope: Option<Scope>,
    manager: CoalescingManager,
) -> Operator<T> {
    Rc::new(move |source: Source<T>| {
        let selector = duration_selector.clone();
        let scope = scope.clone();
        let manager = manager.clone();
        Source::new(move |downstream: Subscriber<T>| {
            let window = Rc::new(Window {
                open: Cell::new(false),
                generation: Cell::new(0),
                latest: RefCell::new(None),
                action: RefCell::new(None),
                scope: scope.clone().unwrap_or_else(Scope::anonymous),
                manager: manager.clone(),
                downstream: downstream.clone(),
            });
            {
                let window = window.clone();
                downstream.add_teardown(move || window.abandon());
            }
            let upstream = source.subscribe(CoalesceObserver {
                window,
                selector: selector.clone(),
            });
            downstream.add(upstream);
        })
    })
}

struct Window<T> {
    open: Cell<bool>,
    generation: Cell<u64>,
    latest: RefCell<Option<T>>,
    action: RefCell<Option<Subscription>>,
    scope: Scope,
    manager: CoalescingManager,
    downstream: Subscriber<T>,
}

impl<T> Window<T> {
    fn close(&self) -> bool {
        if !self.open.replace(false) {
            return false;
        }
        let action = self.action.borrow_mut().take();
        if let Some(action) = action {
            action.unsubscribe();
        }
        true
    }

    /// Decrement first, then emit only if this was the last pending trigger.
    fn flush(&self) {
        if !self.close() {
            return;
        }
        self.manager.decrement(&self.scope);
        let latest = self.latest.borrow_mut().take();
        if !self.manager.is_coalescing(&self.scope) {
            if let Some(value) = latest {
                self.downstream.next(value);
            }
        }
    }

    /// Teardown with an open window: keep the count balanced, emit nothing.
    fn abandon(&self) {
        if !self.close() {
            return;
        }
        self.latest.borrow_mut().take();
        self.manager.decrement(&self.scope);
    }
}

struct CoalesceObserver<T, D> {
    window: Rc<Window<T>>,
    selector: Source<D>,
}

impl<T: 'static, D: 'static> Observer<T> for CoalesceObserver<T, D> {
    fn next(&self, value: T) {
        let window = &self.window;
        *window.latest.borrow_mut() = Some(value);
        if window.open.get() {
            return;
        }

        window.open.set(true);
        let generation = window.generation.get() + 1;
        window.generation.set(generation);
        window.manager.increment(&window.scope);

        let on_fire: Weak<Window<T>> = Rc::downgrade(window);
        let on_error = on_fire.clone();
        let on_complete = on_fire.clone();
        let action = self.selector.subscribe(
            FnObserver::new(move |_: D| {
                if let Some(window) = on_fire.upgrade() {
                    window.flush();
                }
            })
            .on_error(move |error| {
                if let Some(window) = on_error.upgrade() {
                    window.downstream.error(error);
                }
            })
            // A selector that ends without firing still closes the window.
            .on_complete(move || {
                if let Some(window) = on_complete.upgrade() {
                    window.flush();
                }
            }),
        );

        // The selector may already have fired while subscribing.
        if window.open.get() && window.generation.get() == generation {
            *window.action.borrow_mut() = Some(action);
        } else {
            action.unsubscribe();
        }
    }

    fn error(&self, error: SignalError) {
        self.window.downstream.error(error);
    }

    fn complete(&self) {
        self.window.flush();
        self.window.downstream.complete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Subject;

    #[test]
    fn window_opens_once_per_burst() {
        let manager = CoalescingManager::new();
        let scope = Scope::anonymous();
        let source = Subject::<i32>::new();
        let selector = Subject::<()>::new();

        let op = coalesce_with(selector.source(), Some(scope.clone()), manager.clone());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let _sub = source
            .source()
            .pipe(&op)
            .subscribe_fn(move |v| s.borrow_mut().push(v));

        source.next(1);
        source.next(2);
        assert_eq!(selector.observer_count(), 1);
        assert_eq!(manager.count(&scope), 1);

        selector.next(());
        assert_eq!(*seen.borrow(), vec![2]);
        assert_eq!(selector.observer_count(), 0);
        assert!(!manager.is_coalescing(&scope));
    }

    #[test]
    fn synchronous_selector_emits_immediately() {
        let manager = CoalescingManager::new();
        let op = coalesce_with(Source::of(()), None, manager.clone());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let source = Subject::<i32>::new();
        let _sub = source
            .source()
            .pipe(&op)
            .subscribe_fn(move |v| s.borrow_mut().push(v));

        source.next(7);
        source.next(8);
        assert_eq!(*seen.borrow(), vec![7, 8]);
        assert_eq!(manager.active_scopes(), 0);
    }
}

use crate::handle::RenderHandle;
use crate::registry::StrategyRegistry;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tempo_signals::{FnObserver, Scope, Source, Subject, Subscription};
use tracing::debug;

/// Routes values through a live-selectable render strategy.
///
/// Each strategy used so far gets its own lane: an input subject piped
/// through that strategy's behavior. A value enters the lane of the
/// strategy active when it arrives, so switching strategies only affects
/// later values while work already pending in the old lane still
/// finishes there. Rendered values from every lane are re-emitted on
/// [`rendered`](Self::rendered).
pub struct RenderAware<T> {
    inner: Rc<Inner<T>>,
}

struct Inner<T> {
    registry: Rc<StrategyRegistry<T>>,
    handle: Rc<dyn RenderHandle>,
    scope: Scope,
    active: RefCell<String>,
    lanes: RefCell<FxHashMap<String, Lane<T>>>,
    rendered: Subject<T>,
    subscription: Subscription,
}

struct Lane<T> {
    input: Subject<T>,
    output: Subscription,
}

impl<T> Clone for RenderAware<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + 'static> RenderAware<T> {
    /// Starts on the registry's primary strategy.
    pub fn new(
        registry: Rc<StrategyRegistry<T>>,
        handle: Rc<dyn RenderHandle>,
        scope: Scope,
    ) -> Self {
        let active = registry.primary().name().to_string();
        Self {
            inner: Rc::new(Inner {
                registry,
                handle,
                scope,
                active: RefCell::new(active),
                lanes: RefCell::new(FxHashMap::default()),
                rendered: Subject::new(),
                subscription: Subscription::new(),
            }),
        }
    }

    /// Selects the strategy for values arriving from now on. Unknown names
    /// select the primary strategy.
    pub fn set_strategy(&self, name: &str) {
        self.inner.set_strategy(name)
    }

    /// Follows a changing strategy name.
    pub fn subscribe_strategy(&self, names: Source<String>) -> Subscription {
        let weak = Rc::downgrade(&self.inner);
        let subscription = names.subscribe_fn(move |name: String| {
            if let Some(inner) = weak.upgrade() {
                inner.set_strategy(&name);
            }
        });
        self.inner
            .subscription
            .add_subscription(subscription.clone());
        subscription
    }

    /// Feeds `values` through the active strategy. Completion flushes every
    /// lane; an error is forwarded to [`rendered`](Self::rendered).
    pub fn subscribe(&self, values: Source<T>) -> Subscription {
        let on_next: Weak<Inner<T>> = Rc::downgrade(&self.inner);
        let on_error = on_next.clone();
        let on_complete = on_next.clone();

        let subscription = values.subscribe(
            FnObserver::new(move |value: T| {
                if let Some(inner) = on_next.upgrade() {
                    inner.lane_input().next(value);
                }
            })
            .on_error(move |error| {
                if let Some(inner) = on_error.upgrade() {
                    inner.close_lanes();
                    inner.rendered.error(error);
                }
            })
            .on_complete(move || {
                if let Some(inner) = on_complete.upgrade() {
                    inner.complete_lanes();
                }
            }),
        );
        self.inner
            .subscription
            .add_subscription(subscription.clone());
        subscription
    }

    /// Values after their render work ran.
    pub fn rendered(&self) -> Source<T> {
        self.inner.rendered.source()
    }

    pub fn active_strategy(&self) -> String {
        self.inner.active.borrow().clone()
    }

    pub fn lane_count(&self) -> usize {
        self.inner.lanes.borrow().len()
    }

    /// Stops every input and cancels pending render work.
    pub fn unsubscribe(&self) {
        self.inner.subscription.unsubscribe();
        self.inner.close_lanes();
    }
}

impl<T: Clone + 'static> Inner<T> {
    fn set_strategy(&self, name: &str) {
        let resolved = self.registry.get(name).name().to_string();
        let previous = self.active.replace(resolved.clone());
        if previous != resolved {
            debug!(from = %previous, to = %resolved, "render strategy switched");
        }
    }

    fn lane_input(&self) -> Subject<T> {
        let name = self.active.borrow().clone();
        let existing = self.lanes.borrow().get(&name).map(|lane| lane.input.clone());
        if let Some(input) = existing {
            return input;
        }

        let behavior = self
            .registry
            .get(&name)
            .bind(self.handle.clone(), self.scope.clone());
        let input = Subject::new();
        let (rendered, failed) = (self.rendered.clone(), self.rendered.clone());
        let output = input.source().pipe(&behavior).subscribe(
            FnObserver::new(move |value: T| rendered.next(value))
                .on_error(move |error| failed.error(error)),
        );
        debug!(strategy = %name, "opening render lane");
        self.lanes.borrow_mut().insert(
            name,
            Lane {
                input: input.clone(),
                output,
            },
        );
        input
    }

    fn take_lanes(&self) -> Vec<Lane<T>> {
        self.lanes
            .borrow_mut()
            .drain()
            .map(|(_, lane)| lane)
            .collect()
    }

    /// Lets pending work finish, flushing coalesced values.
    fn complete_lanes(&self) {
        for lane in self.take_lanes() {
            lane.input.complete();
        }
    }

    fn close_lanes(&self) {
        for lane in self.take_lanes() {
            lane.output.unsubscribe();
        }
    }
}

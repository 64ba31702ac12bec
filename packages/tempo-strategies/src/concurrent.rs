//! Strategies that route render work through the priority scheduler.

use crate::context::StrategyContext;
use crate::credentials::{StrategyCredentials, Work};
use crate::handle::RenderHandle;
use crate::ticks::scheduler_tick;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tempo_scheduler::Priority;
use tempo_signals::{FnObserver, Operator, Scope, Source, Subscriber};

/// Names and priorities of the concurrent strategies. `noPriority` runs at
/// the scheduler's fallback level.
pub const CONCURRENT_STRATEGIES: [(&str, u8); 6] = [
    ("noPriority", 0),
    ("immediate", 1),
    ("userBlocking", 2),
    ("normal", 3),
    ("low", 4),
    ("idle", 5),
];

pub fn concurrent<T: Clone + 'static>(
    ctx: &StrategyContext,
    name: &str,
    priority: Priority,
) -> StrategyCredentials<T> {
    let ctx = ctx.clone();
    StrategyCredentials::new(
        name,
        |handle: &dyn RenderHandle, _| handle.detect_changes(),
        move |work, scope| schedule_on_queue(&ctx, work, priority, scope),
    )
}

/// Every concurrent strategy, keyed by name.
pub fn concurrent_strategies<T: Clone + 'static>(
    ctx: &StrategyContext,
) -> Vec<StrategyCredentials<T>> {
    CONCURRENT_STRATEGIES
        .iter()
        .map(|&(name, level)| concurrent(ctx, name, Priority::from_level(level)))
        .collect()
}

/// At most one scheduled render per scope.
///
/// A trigger arriving while the scope is coalescing is absorbed; the
/// pending task renders and then emits the latest value seen. A newer
/// trigger on the same subscription replaces a pending task, including one
/// raised synchronously by `work` itself: that render emits nothing and the
/// follow-up render emits the latest value.
fn schedule_on_queue<T: Clone + 'static>(
    ctx: &StrategyContext,
    work: Work,
    priority: Priority,
    scope: Scope,
) -> Operator<T> {
    let ctx = ctx.clone();
    Rc::new(move |source: Source<T>| {
        let (ctx, work, scope) = (ctx.clone(), work.clone(), scope.clone());
        Source::new(move |downstream: Subscriber<T>| {
            let latest: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));

            let record = latest.clone();
            let (gate, gate_scope) = (ctx.coalescing().clone(), scope.clone());
            let (ctx, work, scope) = (ctx.clone(), work.clone(), scope.clone());
            let pipeline = source
                .tap(move |value| *record.borrow_mut() = Some(value.clone()))
                .filter(move |_| !gate.is_coalescing(&gate_scope))
                .switch_map(move |_| {
                    scheduled_render(&ctx, work.clone(), priority, scope.clone(), latest.clone())
                });

            downstream.add(pipeline.subscribe(downstream.clone()));
        })
    })
}

fn scheduled_render<T: Clone + 'static>(
    ctx: &StrategyContext,
    work: Work,
    priority: Priority,
    scope: Scope,
    latest: Rc<RefCell<Option<T>>>,
) -> Source<T> {
    let scheduler = ctx.scheduler().clone();
    let manager = ctx.coalescing().clone();
    Source::new(move |subscriber: Subscriber<T>| {
        manager.increment(&scope);
        let settled = Rc::new(Cell::new(false));

        let fire = {
            let (manager, scope, work) = (manager.clone(), scope.clone(), work.clone());
            let (settled, latest, subscriber) =
                (settled.clone(), latest.clone(), subscriber.clone());
            move |_: ()| {
                settled.set(true);
                manager.decrement(&scope);
                work();
                let value = latest.borrow().clone();
                if let Some(value) = value {
                    subscriber.next(value);
                }
                subscriber.complete();
            }
        };
        let tick = scheduler_tick(scheduler.clone(), priority).subscribe(FnObserver::new(fire));

        let (manager, scope) = (manager.clone(), scope.clone());
        subscriber.add_teardown(move || {
            if !settled.get() {
                manager.decrement(&scope);
            }
        });
        subscriber.add(tick);
    })
}

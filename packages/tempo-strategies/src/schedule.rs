use crate::context::StrategyContext;
use crate::ticks::microtask;
use std::cell::RefCell;
use tempo_scheduler::Priority;
use tempo_signals::{Scope, Source, Subscriber, coalesce_with};
use tracing::trace;

/// Schedules `work` at `priority` at most once per host turn for `scope`.
///
/// The first request opens a coalescing window on `scope` that closes at
/// the end of the current turn; later requests in the same turn are
/// absorbed and return `false`.
pub fn coalesce_and_schedule(
    ctx: &StrategyContext,
    priority: Priority,
    scope: &Scope,
    work: impl FnOnce() + 'static,
) -> bool {
    let manager = ctx.coalescing().clone();
    if manager.is_coalescing(scope) {
        trace!(?scope, "request absorbed by pending window");
        return false;
    }

    let window = coalesce_with(microtask(ctx.host().clone()), Some(scope.clone()), manager);
    let request = Source::new(|subscriber: Subscriber<()>| subscriber.next(()));
    let scheduler = ctx.scheduler().clone();
    let work = RefCell::new(Some(work));
    request.pipe(&window).subscribe_fn(move |()| {
        if let Some(work) = work.borrow_mut().take() {
            scheduler.schedule(priority, work);
        }
    });
    true
}

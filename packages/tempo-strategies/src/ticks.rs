//! One-shot sources that fire on a host or scheduler event.

use std::rc::Rc;
use tempo_scheduler::{Host, Priority, Scheduler};
use tempo_signals::{Source, Subscriber};

/// Fires once before the next paint, then completes.
pub fn animation_frame(host: Rc<dyn Host>) -> Source<()> {
    Source::new(move |subscriber: Subscriber<()>| {
        let fire = subscriber.clone();
        let id = host.request_animation_frame(Box::new(move || {
            fire.next(());
            fire.complete();
        }));
        let host = host.clone();
        subscriber.add_teardown(move || host.cancel_animation_frame(id));
    })
}

/// Fires once at the end of the current host turn, then completes.
pub fn microtask(host: Rc<dyn Host>) -> Source<()> {
    Source::new(move |subscriber: Subscriber<()>| {
        let fire = subscriber.clone();
        host.queue_microtask(Box::new(move || {
            fire.next(());
            fire.complete();
        }));
    })
}

/// Fires once when the scheduler runs a task at `priority`, then
/// completes. Unsubscribing before that cancels the task.
pub fn scheduler_tick(scheduler: Scheduler, priority: Priority) -> Source<()> {
    Source::new(move |subscriber: Subscriber<()>| {
        let fire = subscriber.clone();
        let task = scheduler.schedule(priority, move || {
            fire.next(());
            fire.complete();
        });
        let scheduler = scheduler.clone();
        subscriber.add_teardown(move || {
            if task.has_callback() {
                scheduler.cancel_callback(&task);
            }
        });
    })
}

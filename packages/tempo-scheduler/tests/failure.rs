mod common;

use common::{entries, harness, log};
use std::panic::{AssertUnwindSafe, catch_unwind};
use tempo_scheduler::{Priority, SchedulerState};

#[test]
fn test_panicking_task_does_not_wedge_the_scheduler() {
    let h = harness();
    let log = log();

    h.scheduler.schedule(Priority::UserBlocking, || panic!("task failed"));
    {
        let log = log.clone();
        h.scheduler
            .schedule(Priority::Normal, move || log.borrow_mut().push("survivor".into()));
    }

    let outcome = catch_unwind(AssertUnwindSafe(|| h.host.tick()));
    assert!(outcome.is_err());

    // Bookkeeping was restored while unwinding and the loop re-armed itself.
    assert_eq!(h.scheduler.current_priority_level(), Priority::Normal);
    assert_ne!(h.scheduler.state(), SchedulerState::Running);
    assert_eq!(h.host.pending_messages(), 1);

    h.host.run_until_idle();
    assert_eq!(entries(&log), vec!["survivor"]);
    assert_eq!(h.scheduler.pending_tasks(), 0);
    assert_eq!(h.scheduler.state(), SchedulerState::Idle);
}

#[test]
fn test_run_with_priority_restores_level_on_panic() {
    let h = harness();

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        h.scheduler
            .run_with_priority(Priority::Immediate, || panic!("handler failed"))
    }));

    assert!(outcome.is_err());
    assert_eq!(h.scheduler.current_priority_level(), Priority::Normal);
}

#[test]
fn test_scheduling_after_a_panic_still_arms_the_host() {
    let h = harness();
    h.scheduler.schedule(Priority::Normal, || panic!("boom"));
    let _ = catch_unwind(AssertUnwindSafe(|| h.host.tick()));

    // The re-armed turn finds only the discarded task and goes idle.
    h.host.run_until_idle();
    assert_eq!(h.scheduler.state(), SchedulerState::Idle);

    let log = log();
    let l = log.clone();
    h.scheduler
        .schedule(Priority::Low, move || l.borrow_mut().push("ran".into()));
    assert_eq!(h.scheduler.state(), SchedulerState::Armed);
    h.host.run_until_idle();
    assert_eq!(entries(&log), vec!["ran"]);
}

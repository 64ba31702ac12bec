mod common;

use common::{entries, harness, log};
use tempo_scheduler::{Continuation, Priority, ScheduleOptions};

#[test]
fn test_execution_order_follows_priority() {
    let h = harness();
    let log = log();

    for (priority, name) in [
        (Priority::Low, "low"),
        (Priority::Idle, "idle"),
        (Priority::Normal, "normal"),
        (Priority::Immediate, "immediate"),
        (Priority::UserBlocking, "user-blocking"),
    ] {
        let log = log.clone();
        h.scheduler
            .schedule(priority, move || log.borrow_mut().push(name.to_string()));
    }

    h.host.run_until_idle();

    assert_eq!(
        entries(&log),
        vec!["immediate", "user-blocking", "normal", "low", "idle"]
    );
}

#[test]
fn test_equal_priority_runs_in_insertion_order() {
    let h = harness();
    let log = log();

    for i in 0..10 {
        let log = log.clone();
        h.scheduler
            .schedule(Priority::Normal, move || log.borrow_mut().push(i.to_string()));
    }

    h.host.run_until_idle();

    let expected: Vec<String> = (0..10).map(|i| i.to_string()).collect();
    assert_eq!(entries(&log), expected);
}

#[test]
fn test_expiration_time_beats_nominal_priority() {
    let h = harness();
    let log = log();

    // Normal at t=0 expires at 5000, UserBlocking at t=4900 expires at 5150.
    {
        let log = log.clone();
        h.scheduler
            .schedule(Priority::Normal, move || log.borrow_mut().push("normal".into()));
    }
    h.clock.advance(4900.0);
    {
        let log = log.clone();
        h.scheduler.schedule(Priority::UserBlocking, move || {
            log.borrow_mut().push("user-blocking".into())
        });
    }

    h.host.run_until_idle();
    assert_eq!(entries(&log), vec!["normal", "user-blocking"]);
}

#[test]
fn test_urgent_task_scheduled_mid_loop_runs_next_without_preemption() {
    let h = harness();
    let log = log();

    {
        let log = log.clone();
        let scheduler = h.scheduler.clone();
        h.scheduler.schedule(Priority::Normal, move || {
            log.borrow_mut().push("first:start".into());
            let inner_log = log.clone();
            scheduler.schedule(Priority::Immediate, move || {
                inner_log.borrow_mut().push("urgent".into())
            });
            log.borrow_mut().push("first:end".into());
        });
    }
    {
        let log = log.clone();
        h.scheduler
            .schedule(Priority::Normal, move || log.borrow_mut().push("second".into()));
    }

    h.host.run_until_idle();
    assert_eq!(
        entries(&log),
        vec!["first:start", "first:end", "urgent", "second"]
    );
}

#[test]
fn test_priority_timeout_mapping() {
    let h = harness();
    h.clock.set(1000.0);

    let user_blocking = h.scheduler.schedule(Priority::UserBlocking, || {});
    assert_eq!(user_blocking.start_time(), 1000.0);
    assert_eq!(user_blocking.expiration_time(), 1250.0);
    assert_eq!(user_blocking.sort_index(), 1250.0);

    let idle = h.scheduler.schedule(Priority::Idle, || {});
    assert_eq!(idle.expiration_time(), 1000.0 + 1_073_741_823.0);

    let immediate = h.scheduler.schedule(Priority::Immediate, || {});
    assert_eq!(immediate.expiration_time(), 999.0);

    let low = h.scheduler.schedule_callback(
        Priority::Low,
        |_| Continuation::Done,
        ScheduleOptions::delayed(20.0),
    );
    assert_eq!(low.start_time(), 1020.0);
    assert_eq!(low.expiration_time(), 11020.0);
    assert_eq!(low.sort_index(), 1020.0);
}

#[test]
fn test_task_ids_increase_monotonically() {
    let h = harness();
    let a = h.scheduler.schedule(Priority::Normal, || {});
    let b = h.scheduler.schedule(Priority::Low, || {});
    let c = h.scheduler.schedule_callback(
        Priority::Normal,
        |_| Continuation::Done,
        ScheduleOptions::delayed(5.0),
    );
    assert!(a.id() < b.id());
    assert!(b.id() < c.id());
}

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use tempo_scheduler::{LocalHost, Scheduler, SchedulerConfig, VirtualClock};

pub struct Harness {
    pub clock: VirtualClock,
    pub host: Rc<LocalHost>,
    pub scheduler: Scheduler,
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn harness() -> Harness {
    harness_with(SchedulerConfig::default())
}

pub fn harness_with(config: SchedulerConfig) -> Harness {
    init_tracing();
    let clock = VirtualClock::new();
    let host = Rc::new(LocalHost::new(Rc::new(clock.clone())));
    let scheduler = Scheduler::with_config(host.clone(), config);
    Harness {
        clock,
        host,
        scheduler,
    }
}

pub type Log = Rc<RefCell<Vec<String>>>;

pub fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tempo_scheduler::{LocalHost, Scheduler, VirtualClock};
use tempo_signals::CoalescingManager;
use tempo_strategies::{RenderHandle, StrategyContext, StrategyRegistry};

pub struct Harness {
    pub clock: VirtualClock,
    pub host: Rc<LocalHost>,
    pub scheduler: Scheduler,
    pub coalescing: CoalescingManager,
    pub ctx: StrategyContext,
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn harness() -> Harness {
    init_tracing();
    let clock = VirtualClock::new();
    let host = Rc::new(LocalHost::new(Rc::new(clock.clone())));
    let scheduler = Scheduler::new(host.clone());
    let coalescing = CoalescingManager::new();
    let ctx = StrategyContext::with_coalescing(scheduler.clone(), coalescing.clone());
    Harness {
        clock,
        host,
        scheduler,
        coalescing,
        ctx,
    }
}

pub fn registry<T: Clone + 'static>(h: &Harness) -> Rc<StrategyRegistry<T>> {
    Rc::new(StrategyRegistry::new(&h.ctx).expect("built-in primary exists"))
}

/// Counts every call a strategy makes on its view.
#[derive(Default)]
pub struct CountingHandle {
    pub detected: Cell<usize>,
    pub checked: Cell<usize>,
    pub dirtied: Cell<usize>,
    pub journal: Option<Rc<RefCell<Vec<String>>>>,
    pub label: &'static str,
}

impl CountingHandle {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn journaled(label: &'static str, journal: Rc<RefCell<Vec<String>>>) -> Rc<Self> {
        Rc::new(Self {
            journal: Some(journal),
            label,
            ..Self::default()
        })
    }

    fn note(&self, what: &str) {
        if let Some(journal) = &self.journal {
            journal.borrow_mut().push(format!("{}:{what}", self.label));
        }
    }
}

impl RenderHandle for CountingHandle {
    fn detect_changes(&self) {
        self.detected.set(self.detected.get() + 1);
        self.note("detect");
    }

    fn mark_for_check(&self) {
        self.checked.set(self.checked.get() + 1);
        self.note("check");
    }

    fn mark_dirty(&self) {
        self.dirtied.set(self.dirtied.get() + 1);
        self.note("dirty");
    }
}

pub fn collect<T: Clone + 'static>(
    source: &tempo_signals::Source<T>,
) -> Rc<RefCell<Vec<T>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    source.subscribe_fn(move |v| s.borrow_mut().push(v));
    seen
}

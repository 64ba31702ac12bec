mod common;

use common::{collect, harness, registry};
use std::cell::Cell;
use std::rc::Rc;
use tempo_scheduler::VirtualClock;
use tempo_signals::{Scope, Subject};
use tempo_strategies::{RenderAware, RenderHandle};

/// A view whose render takes `cost_ms` of virtual time.
struct SlowView {
    clock: VirtualClock,
    cost_ms: f64,
    renders: Cell<usize>,
}

impl RenderHandle for SlowView {
    fn detect_changes(&self) {
        self.renders.set(self.renders.get() + 1);
        self.clock.advance(self.cost_ms);
    }

    fn mark_for_check(&self) {}
}

#[test]
fn test_store_updates_render_once_per_view_across_slices() {
    let h = harness();
    let registry = registry::<u32>(&h);
    let store = Subject::<u32>::new();

    let views: Vec<Rc<SlowView>> = (0..10)
        .map(|_| {
            Rc::new(SlowView {
                clock: h.clock.clone(),
                cost_ms: 5.0,
                renders: Cell::new(0),
            })
        })
        .collect();
    let outputs: Vec<_> = views
        .iter()
        .map(|view| {
            let aware = RenderAware::new(registry.clone(), view.clone(), Scope::anonymous());
            aware.subscribe(store.source());
            let rendered = collect(&aware.rendered());
            (aware, rendered)
        })
        .collect();

    for value in 1..=5 {
        store.next(value);
    }
    assert_eq!(h.scheduler.pending_tasks(), 10);

    // 16ms slices fit four 5ms renders before the loop yields.
    assert!(h.host.tick());
    let rendered_after_first_turn: usize = views.iter().map(|v| v.renders.get()).sum();
    assert_eq!(rendered_after_first_turn, 4);
    assert_eq!(h.host.pending_messages(), 1);

    h.host.run_until_idle();
    for view in &views {
        assert_eq!(view.renders.get(), 1);
    }
    for (_, rendered) in &outputs {
        assert_eq!(*rendered.borrow(), vec![5]);
    }
    assert_eq!(h.coalescing.active_scopes(), 0);
}

#[test]
fn test_views_sharing_a_scope_render_once() {
    let h = harness();
    let registry = registry::<u32>(&h);
    let store = Subject::<u32>::new();
    let shared = Scope::new("parent");

    let view = Rc::new(SlowView {
        clock: h.clock.clone(),
        cost_ms: 1.0,
        renders: Cell::new(0),
    });
    let children: Vec<_> = (0..3)
        .map(|_| {
            let aware = RenderAware::new(registry.clone(), view.clone(), shared.clone());
            aware.set_strategy("userBlocking");
            aware.subscribe(store.source());
            aware
        })
        .collect();

    store.next(1);
    store.next(2);
    h.host.run_until_idle();

    assert_eq!(view.renders.get(), 1);
    assert_eq!(children.len(), 3);
    assert!(!h.coalescing.is_coalescing(&shared));
}

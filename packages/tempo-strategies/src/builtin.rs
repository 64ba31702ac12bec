//! Strategies that render on the next frame, synchronously, or never.

use crate::context::StrategyContext;
use crate::credentials::StrategyCredentials;
use crate::handle::RenderHandle;
use crate::ticks::animation_frame;
use std::rc::Rc;
use tempo_signals::{Operator, Source, coalesce_with};

/// Coalesces per scope and renders the handle's own view on the next
/// animation frame.
pub fn local<T: 'static>(ctx: &StrategyContext) -> StrategyCredentials<T> {
    let ctx = ctx.clone();
    StrategyCredentials::new(
        "local",
        |handle: &dyn RenderHandle, _| handle.detect_changes(),
        move |work, scope| {
            let coalesce = coalesce_with(
                animation_frame(ctx.host().clone()),
                Some(scope),
                ctx.coalescing().clone(),
            );
            let op: Operator<T> = Rc::new(move |source: Source<T>| {
                let work = work.clone();
                source.pipe(&coalesce).tap(move |_| work())
            });
            op
        },
    )
}

/// Coalesces tree-wide and marks the whole tree dirty on the next
/// animation frame.
pub fn global<T: 'static>(ctx: &StrategyContext) -> StrategyCredentials<T> {
    let ctx = ctx.clone();
    StrategyCredentials::new(
        "global",
        |handle: &dyn RenderHandle, _| handle.mark_dirty(),
        move |work, _scope| {
            let coalesce = coalesce_with(
                animation_frame(ctx.host().clone()),
                Some(ctx.root_scope().clone()),
                ctx.coalescing().clone(),
            );
            let op: Operator<T> = Rc::new(move |source: Source<T>| {
                let work = work.clone();
                source.pipe(&coalesce).tap(move |_| work())
            });
            op
        },
    )
}

/// Marks the view for check on every trigger, leaving the actual render to
/// the owner's own pass.
pub fn native<T: 'static>() -> StrategyCredentials<T> {
    StrategyCredentials::new(
        "native",
        |handle: &dyn RenderHandle, _| handle.mark_for_check(),
        |work, _scope| {
            let op: Operator<T> = Rc::new(move |source: Source<T>| {
                let work = work.clone();
                source.tap(move |_| work())
            });
            op
        },
    )
}

/// Passes triggers through untouched and never renders.
pub fn noop<T: 'static>() -> StrategyCredentials<T> {
    StrategyCredentials::new(
        "noop",
        |_: &dyn RenderHandle, _| {},
        |_work, _scope| {
            let op: Operator<T> = Rc::new(|source: Source<T>| source);
            op
        },
    )
}

use crate::error::SignalError;
use crate::source::{Observer, Source, Subscriber};
use crate::subscription::Subscription;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// A behavior: a transformation over a source of the same item type.
pub type Operator<T> = Rc<dyn Fn(Source<T>) -> Source<T>>;

type OnNext<T, U> = Rc<dyn Fn(&Subscriber<U>, T)>;

/// Forwards terminal events downstream and hands values to `on_next`.
struct Forward<T, U> {
    downstream: Subscriber<U>,
    on_next: OnNext<T, U>,
}

impl<T, U> Observer<T> for Forward<T, U> {
    fn next(&self, value: T) {
        (self.on_next)(&self.downstream, value)
    }

    fn error(&self, error: SignalError) {
        self.downstream.error(error)
    }

    fn complete(&self) {
        self.downstream.complete()
    }
}

fn lift<T: 'static, U: 'static>(source: &Source<T>, on_next: OnNext<T, U>) -> Source<U> {
    let source = source.clone();
    Source::new(move |downstream: Subscriber<U>| {
        let upstream = source.subscribe(Forward {
            downstream: downstream.clone(),
            on_next: on_next.clone(),
        });
        downstream.add(upstream);
    })
}

impl<T: 'static> Source<T> {
    pub fn map<U: 'static>(&self, f: impl Fn(T) -> U + 'static) -> Source<U> {
        lift(self, Rc::new(move |downstream: &Subscriber<U>, value: T| {
            downstream.next(f(value))
        }))
    }

    pub fn filter(&self, predicate: impl Fn(&T) -> bool + 'static) -> Source<T> {
        lift(self, Rc::new(move |downstream: &Subscriber<T>, value: T| {
            if predicate(&value) {
                downstream.next(value)
            }
        }))
    }

    /// Runs `f` for its side effect on every value, passing values through.
    pub fn tap(&self, f: impl Fn(&T) + 'static) -> Source<T> {
        lift(self, Rc::new(move |downstream: &Subscriber<T>, value: T| {
            f(&value);
            downstream.next(value)
        }))
    }

    /// Maps each value to an inner source, keeping only the latest inner
    /// subscription alive. Completes once the outer source and the active
    /// inner source have both completed.
    pub fn switch_map<U: 'static>(
        &self,
        project: impl Fn(T) -> Source<U> + 'static,
    ) -> Source<U> {
        let source = self.clone();
        let project: Rc<dyn Fn(T) -> Source<U>> = Rc::new(project);
        Source::new(move |downstream: Subscriber<U>| {
            let state = Rc::new(SwitchState {
                inner: RefCell::new(None),
                outer_done: Cell::new(false),
            });
            {
                let state = state.clone();
                downstream.add_teardown(move || {
                    let inner = state.inner.borrow_mut().take();
                    if let Some(inner) = inner {
                        inner.unsubscribe();
                    }
                });
            }
            let outer = source.subscribe(SwitchOuter {
                downstream: downstream.clone(),
                state,
                project: project.clone(),
            });
            downstream.add(outer);
        })
    }
}

struct SwitchState {
    inner: RefCell<Option<Subscription>>,
    outer_done: Cell<bool>,
}

struct SwitchOuter<T, U> {
    downstream: Subscriber<U>,
    state: Rc<SwitchState>,
    project: Rc<dyn Fn(T) -> Source<U>>,
}

impl<T, U: 'static> Observer<T> for SwitchOuter<T, U> {
    fn next(&self, value: T) {
        let previous = self.state.inner.borrow_mut().take();
        if let Some(previous) = previous {
            previous.unsubscribe();
        }
        if self.downstream.is_closed() {
            return;
        }

        let inner = (self.project)(value).subscribe(SwitchInner {
            downstream: self.downstream.clone(),
            state: self.state.clone(),
        });
        // An inner source that finished synchronously leaves nothing to track.
        if !inner.is_closed() {
            *self.state.inner.borrow_mut() = Some(inner);
        }
    }

    fn error(&self, error: SignalError) {
        self.downstream.error(error)
    }

    fn complete(&self) {
        self.state.outer_done.set(true);
        if self.state.inner.borrow().is_none() {
            self.downstream.complete();
        }
    }
}

struct SwitchInner<U> {
    downstream: Subscriber<U>,
    state: Rc<SwitchState>,
}

impl<U> Observer<U> for SwitchInner<U> {
    fn next(&self, value: U) {
        self.downstream.next(value)
    }

    fn error(&self, error: SignalError) {
        self.downstream.error(error)
    }

    fn complete(&self) {
        self.state.inner.borrow_mut().take();
        if self.state.outer_done.get() {
            self.downstream.complete();
        }
    }
}

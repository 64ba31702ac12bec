use crate::error::SignalError;
use crate::source::{Source, Subscriber};
use slab::Slab;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

#[derive(Clone)]
enum Terminal {
    Error(SignalError),
    Complete,
}

/// A hot multicast source. Values pushed with [`next`](Self::next) reach
/// every subscriber present at that moment; late subscribers to a
/// terminated subject receive the terminal event only.
pub struct Subject<T> {
    inner: Rc<SubjectInner<T>>,
}

struct SubjectInner<T> {
    observers: RefCell<Slab<Subscriber<T>>>,
    terminal: RefCell<Option<Terminal>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Subject<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SubjectInner {
                observers: RefCell::new(Slab::new()),
                terminal: RefCell::new(None),
            }),
        }
    }

    pub fn source(&self) -> Source<T> {
        let weak = Rc::downgrade(&self.inner);
        Source::new(move |subscriber: Subscriber<T>| {
            let Some(inner) = weak.upgrade() else {
                subscriber.complete();
                return;
            };
            let terminal = inner.terminal.borrow().clone();
            match terminal {
                Some(Terminal::Error(error)) => subscriber.error(error),
                Some(Terminal::Complete) => subscriber.complete(),
                None => {
                    let key = inner.observers.borrow_mut().insert(subscriber.clone());
                    let weak: Weak<SubjectInner<T>> = Rc::downgrade(&inner);
                    subscriber.add_teardown(move || {
                        if let Some(inner) = weak.upgrade() {
                            let mut observers = inner.observers.borrow_mut();
                            if observers.contains(key) {
                                observers.remove(key);
                            }
                        }
                    });
                }
            }
        })
    }

    pub fn next(&self, value: T) {
        // Ignoring the result: pushing into a finished subject is a no-op.
        let _ = self.try_next(value);
    }

    pub fn try_next(&self, value: T) -> Result<(), SignalError> {
        if self.is_stopped() {
            return Err(SignalError::Closed);
        }
        for subscriber in self.snapshot() {
            subscriber.next(value.clone());
        }
        Ok(())
    }

    pub fn error(&self, error: SignalError) {
        if self.is_stopped() {
            return;
        }
        *self.inner.terminal.borrow_mut() = Some(Terminal::Error(error.clone()));
        for subscriber in self.drain() {
            subscriber.error(error.clone());
        }
    }

    pub fn complete(&self) {
        if self.is_stopped() {
            return;
        }
        *self.inner.terminal.borrow_mut() = Some(Terminal::Complete);
        for subscriber in self.drain() {
            subscriber.complete();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.terminal.borrow().is_some()
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    fn snapshot(&self) -> Vec<Subscriber<T>> {
        self.inner
            .observers
            .borrow()
            .iter()
            .map(|(_, subscriber)| subscriber.clone())
            .collect()
    }

    fn drain(&self) -> Vec<Subscriber<T>> {
        let observers = std::mem::take(&mut *self.inner.observers.borrow_mut());
        observers.into_iter().map(|(_, subscriber)| subscriber).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FnObserver;
    use std::cell::Cell;

    #[test]
    fn multicasts_to_current_subscribers() {
        let subject = Subject::<i32>::new();
        let a = Rc::new(Cell::new(0));
        let b = Rc::new(Cell::new(0));

        let a2 = a.clone();
        subject.source().subscribe_fn(move |v: i32| a2.set(a2.get() + v));
        subject.next(1);
        let b2 = b.clone();
        subject.source().subscribe_fn(move |v: i32| b2.set(b2.get() + v));
        subject.next(10);

        assert_eq!(a.get(), 11);
        assert_eq!(b.get(), 10);
    }

    #[test]
    fn late_subscribers_see_the_terminal_event() {
        let subject = Subject::<i32>::new();
        subject.complete();
        assert_eq!(subject.try_next(1), Err(SignalError::Closed));

        let done = Rc::new(Cell::new(false));
        let d = done.clone();
        subject
            .source()
            .subscribe(FnObserver::new(|_| {}).on_complete(move || d.set(true)));
        assert!(done.get());
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn subscriber_unsubscribing_during_emission() {
        let subject = Subject::<()>::new();
        let holder: Rc<RefCell<Option<crate::Subscription>>> = Rc::new(RefCell::new(None));
        let count = Rc::new(Cell::new(0));

        let (h, c) = (holder.clone(), count.clone());
        let sub = subject.source().subscribe_fn(move |_: ()| {
            c.set(c.get() + 1);
            if let Some(sub) = h.borrow().as_ref() {
                sub.unsubscribe();
            }
        });
        *holder.borrow_mut() = Some(sub);

        subject.next(());
        subject.next(());
        assert_eq!(count.get(), 1);
        assert_eq!(subject.observer_count(), 0);
    }
}

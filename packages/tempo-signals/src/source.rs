use crate::error::SignalError;
use crate::subscription::Subscription;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Receiver of a source's events.
pub trait Observer<T> {
    fn next(&self, value: T);

    fn error(&self, _error: SignalError) {}

    fn complete(&self) {}
}

/// An [`Observer`] assembled from closures.
pub struct FnObserver<T> {
    on_next: Box<dyn Fn(T)>,
    on_error: Option<Box<dyn Fn(SignalError)>>,
    on_complete: Option<Box<dyn Fn()>>,
}

impl<T> FnObserver<T> {
    pub fn new(on_next: impl Fn(T) + 'static) -> Self {
        Self {
            on_next: Box::new(on_next),
            on_error: None,
            on_complete: None,
        }
    }

    pub fn on_error(mut self, f: impl Fn(SignalError) + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl Fn() + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }
}

impl<T> Observer<T> for FnObserver<T> {
    fn next(&self, value: T) {
        (self.on_next)(value)
    }

    fn error(&self, error: SignalError) {
        if let Some(f) = &self.on_error {
            f(error)
        }
    }

    fn complete(&self) {
        if let Some(f) = &self.on_complete {
            f()
        }
    }
}

/// The producer side of one subscription.
///
/// A subscriber stops delivering after its first terminal event (error or
/// complete) or once its subscription is closed. Terminal events tear the
/// subscription down after the destination has seen them.
pub struct Subscriber<T> {
    inner: Rc<SubscriberInner<T>>,
}

struct SubscriberInner<T> {
    destination: Rc<dyn Observer<T>>,
    stopped: Cell<bool>,
    subscription: Subscription,
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Subscriber<T> {
    pub fn new(destination: Rc<dyn Observer<T>>) -> Self {
        Self {
            inner: Rc::new(SubscriberInner {
                destination,
                stopped: Cell::new(false),
                subscription: Subscription::new(),
            }),
        }
    }

    pub fn next(&self, value: T) {
        if !self.is_closed() {
            self.inner.destination.next(value);
        }
    }

    pub fn error(&self, error: SignalError) {
        if self.is_closed() {
            return;
        }
        self.inner.stopped.set(true);
        self.inner.destination.error(error);
        self.inner.subscription.unsubscribe();
    }

    pub fn complete(&self) {
        if self.is_closed() {
            return;
        }
        self.inner.stopped.set(true);
        self.inner.destination.complete();
        self.inner.subscription.unsubscribe();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.stopped.get() || self.inner.subscription.is_closed()
    }

    /// Registers cleanup to run when this subscription ends.
    pub fn add_teardown(&self, teardown: impl FnOnce() + 'static) {
        self.inner.subscription.add(teardown);
    }

    pub fn add(&self, child: Subscription) {
        self.inner.subscription.add_subscription(child);
    }

    pub fn subscription(&self) -> Subscription {
        self.inner.subscription.clone()
    }
}

impl<T> Observer<T> for Subscriber<T> {
    fn next(&self, value: T) {
        Subscriber::next(self, value)
    }

    fn error(&self, error: SignalError) {
        Subscriber::error(self, error)
    }

    fn complete(&self) {
        Subscriber::complete(self)
    }
}

/// A cold push-based stream of values. Each call to
/// [`subscribe`](Self::subscribe) runs the producer function anew.
pub struct Source<T> {
    producer: Rc<dyn Fn(Subscriber<T>)>,
}

impl<T> Clone for Source<T> {
    fn clone(&self) -> Self {
        Self {
            producer: self.producer.clone(),
        }
    }
}

impl<T> fmt::Debug for Source<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source").finish_non_exhaustive()
    }
}

impl<T: 'static> Source<T> {
    pub fn new(producer: impl Fn(Subscriber<T>) + 'static) -> Self {
        Self {
            producer: Rc::new(producer),
        }
    }

    pub fn subscribe(&self, observer: impl Observer<T> + 'static) -> Subscription {
        self.subscribe_rc(Rc::new(observer))
    }

    pub fn subscribe_rc(&self, observer: Rc<dyn Observer<T>>) -> Subscription {
        let subscriber = Subscriber::new(observer);
        (self.producer)(subscriber.clone());
        subscriber.subscription()
    }

    pub fn subscribe_fn(&self, on_next: impl Fn(T) + 'static) -> Subscription {
        self.subscribe(FnObserver::new(on_next))
    }

    /// Applies a behavior to this source.
    pub fn pipe(&self, operator: &crate::Operator<T>) -> Source<T> {
        operator(self.clone())
    }

    /// Never emits, never completes.
    pub fn never() -> Self {
        Source::new(|_| {})
    }

    /// Completes immediately.
    pub fn empty() -> Self {
        Source::new(|subscriber: Subscriber<T>| subscriber.complete())
    }

    pub fn throw(error: SignalError) -> Self {
        Source::new(move |subscriber: Subscriber<T>| subscriber.error(error.clone()))
    }
}

impl<T: Clone + 'static> Source<T> {
    /// Emits `value` then completes.
    pub fn of(value: T) -> Self {
        Source::new(move |subscriber: Subscriber<T>| {
            subscriber.next(value.clone());
            subscriber.complete();
        })
    }
}

impl<T: Clone + 'static> FromIterator<T> for Source<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let values: Rc<[T]> = iter.into_iter().collect();
        Source::new(move |subscriber: Subscriber<T>| {
            for value in values.iter() {
                if subscriber.is_closed() {
                    return;
                }
                subscriber.next(value.clone());
            }
            subscriber.complete();
        })
    }
}

use smallvec::SmallVec;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

type Teardown = Box<dyn FnOnce()>;

/// Handle to an active subscription. Clones refer to the same subscription.
///
/// Teardowns run once, in the order they were added, on the first call to
/// [`unsubscribe`](Self::unsubscribe). Adding a teardown to a closed
/// subscription runs it immediately.
#[derive(Clone, Default)]
pub struct Subscription {
    inner: Rc<SubscriptionInner>,
}

#[derive(Default)]
struct SubscriptionInner {
    closed: Cell<bool>,
    teardowns: RefCell<SmallVec<[Teardown; 2]>>,
}

impl Subscription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }

    pub fn add<F>(&self, teardown: F)
    where
        F: FnOnce() + 'static,
    {
        if self.is_closed() {
            teardown();
        } else {
            self.inner.teardowns.borrow_mut().push(Box::new(teardown));
        }
    }

    /// Ties `child` to this subscription: unsubscribing `self` unsubscribes it.
    pub fn add_subscription(&self, child: Subscription) {
        if Rc::ptr_eq(&self.inner, &child.inner) || child.is_closed() {
            return;
        }
        self.add(move || child.unsubscribe());
    }

    pub fn unsubscribe(&self) {
        if self.inner.closed.replace(true) {
            return;
        }
        let teardowns = std::mem::take(&mut *self.inner.teardowns.borrow_mut());
        for teardown in teardowns {
            teardown();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .field("teardowns", &self.inner.teardowns.borrow().len())
            .finish()
    }
}

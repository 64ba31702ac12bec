use crate::heap::HeapNode;
use crate::priority::Priority;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// The unit of work run by the scheduler. The flag tells the callback whether
/// its task had already expired when it was invoked.
pub type TaskCallback = Box<dyn FnOnce(bool) -> Continuation>;

/// What a task callback reports back to the work loop.
pub enum Continuation {
    /// The task is finished and leaves the ready queue.
    Done,
    /// The task has more work. The callback is stored and invoked again on a
    /// later loop iteration without the task leaving the ready queue.
    Continue(TaskCallback),
}

impl Continuation {
    pub fn then<F>(callback: F) -> Self
    where
        F: FnOnce(bool) -> Continuation + 'static,
    {
        Continuation::Continue(Box::new(callback))
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Continuation::Done)
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Continuation::Done => f.write_str("Done"),
            Continuation::Continue(_) => f.write_str("Continue(..)"),
        }
    }
}

pub(crate) struct Task {
    id: u64,
    priority: Priority,
    start_time: f64,
    expiration_time: f64,
    sort_index: Cell<f64>,
    callback: RefCell<Option<TaskCallback>>,
    cancelled: Cell<bool>,
}

/// Shared handle to a scheduled task, used for cancellation and inspection.
#[derive(Clone)]
pub struct TaskHandle(Rc<Task>);

impl TaskHandle {
    pub(crate) fn new(
        id: u64,
        priority: Priority,
        start_time: f64,
        callback: TaskCallback,
    ) -> Self {
        let expiration_time = priority.expiration_time(start_time);
        Self(Rc::new(Task {
            id,
            priority,
            start_time,
            expiration_time,
            sort_index: Cell::new(-1.0),
            callback: RefCell::new(Some(callback)),
            cancelled: Cell::new(false),
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn priority(&self) -> Priority {
        self.0.priority
    }

    pub fn start_time(&self) -> f64 {
        self.0.start_time
    }

    pub fn expiration_time(&self) -> f64 {
        self.0.expiration_time
    }

    /// `start_time` while the task is delayed, `expiration_time` once it is
    /// in the ready queue.
    pub fn sort_index(&self) -> f64 {
        self.0.sort_index.get()
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.get()
    }

    /// False once the task was cancelled, finished, or while its callback is
    /// executing.
    pub fn has_callback(&self) -> bool {
        self.0.callback.borrow().is_some()
    }

    pub fn ptr_eq(&self, other: &TaskHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn set_sort_index(&self, sort_index: f64) {
        self.0.sort_index.set(sort_index);
    }

    pub(crate) fn take_callback(&self) -> Option<TaskCallback> {
        self.0.callback.borrow_mut().take()
    }

    pub(crate) fn set_callback(&self, callback: TaskCallback) {
        *self.0.callback.borrow_mut() = Some(callback);
    }

    /// Drops the stored callback. The heap node stays where it is until the
    /// work loop reaches it.
    pub(crate) fn cancel(&self) {
        self.0.cancelled.set(true);
        // Dropping the callback may drop captured state that reschedules;
        // release the borrow first.
        let callback = self.0.callback.borrow_mut().take();
        drop(callback);
    }
}

impl HeapNode for TaskHandle {
    fn sort_index(&self) -> f64 {
        self.0.sort_index.get()
    }

    fn id(&self) -> u64 {
        self.0.id
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.0.id)
            .field("priority", &self.0.priority)
            .field("start_time", &self.0.start_time)
            .field("expiration_time", &self.0.expiration_time)
            .field("sort_index", &self.0.sort_index.get())
            .field("cancelled", &self.0.cancelled.get())
            .finish()
    }
}

use crate::Host;
use crate::config::{MAX_FRAME_RATE, SchedulerConfig, yield_interval_for};
use crate::error::SchedulerError;
use crate::heap::TaskHeap;
use crate::host::TimeoutId;
use crate::priority::Priority;
use crate::task::{Continuation, TaskCallback, TaskHandle};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScheduleOptions {
    /// Milliseconds before the task becomes eligible to run. Zero or negative
    /// values mean "now".
    pub delay: Option<f64>,
}

impl ScheduleOptions {
    pub fn delayed(delay_ms: f64) -> Self {
        Self {
            delay: Some(delay_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Nothing is armed with the host.
    Idle,
    /// A host callback or host timeout has been requested and not yet run.
    Armed,
    /// Inside the work loop.
    Running,
    /// Suspended by `pause_execution`; no host callbacks are armed.
    Paused,
}

/// Cooperative, priority ordered task scheduler.
///
/// Tasks live in two min-heaps: delayed tasks in the timer queue keyed by
/// start time, runnable tasks in the ready queue keyed by expiration time.
/// Work runs in host turns obtained through [`Host::post_message`]; each turn
/// runs tasks until the time slice is used up, then yields back to the host.
///
/// Clones share the same state. Everything is single threaded.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<Inner>,
}

struct Inner {
    this: Weak<Inner>,
    host: Rc<dyn Host>,
    config: SchedulerConfig,

    task_queue: RefCell<TaskHeap<TaskHandle>>,
    timer_queue: RefCell<TaskHeap<TaskHandle>>,
    task_id_counter: Cell<u64>,
    current_priority: Cell<Priority>,
    paused: Cell<bool>,

    // Set while the work loop runs, to prevent re-entrancy.
    is_performing_work: Cell<bool>,
    is_host_callback_scheduled: Cell<bool>,
    host_timeout: Cell<Option<TimeoutId>>,

    // Host turn bookkeeping.
    is_message_loop_running: Cell<bool>,
    has_scheduled_callback: Cell<bool>,
    yield_interval: Cell<f64>,
    slice_start: Cell<f64>,
    deadline: Cell<f64>,
    needs_paint: Cell<bool>,
}

impl Scheduler {
    pub fn new(host: Rc<dyn Host>) -> Self {
        Self::with_config(host, SchedulerConfig::default())
    }

    pub fn with_config(host: Rc<dyn Host>, config: SchedulerConfig) -> Self {
        let yield_interval = config.yield_interval_ms();
        let inner = Rc::new_cyclic(|this| Inner {
            this: this.clone(),
            host,
            config,
            task_queue: RefCell::new(TaskHeap::new()),
            timer_queue: RefCell::new(TaskHeap::new()),
            task_id_counter: Cell::new(1),
            current_priority: Cell::new(Priority::Normal),
            paused: Cell::new(false),
            is_performing_work: Cell::new(false),
            is_host_callback_scheduled: Cell::new(false),
            host_timeout: Cell::new(None),
            is_message_loop_running: Cell::new(false),
            has_scheduled_callback: Cell::new(false),
            yield_interval: Cell::new(yield_interval),
            slice_start: Cell::new(0.0),
            deadline: Cell::new(0.0),
            needs_paint: Cell::new(false),
        });
        Self { inner }
    }

    pub fn now(&self) -> f64 {
        self.inner.host.now()
    }

    pub fn host(&self) -> &Rc<dyn Host> {
        &self.inner.host
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    /// Schedules `callback` at `priority`.
    ///
    /// The callback receives whether its task had already expired and may
    /// return [`Continuation::Continue`] to be invoked again later.
    pub fn schedule_callback<F>(
        &self,
        priority: Priority,
        callback: F,
        options: ScheduleOptions,
    ) -> TaskHandle
    where
        F: FnOnce(bool) -> Continuation + 'static,
    {
        self.inner
            .schedule_callback(priority, Box::new(callback), options)
    }

    /// Schedules a one-shot closure with no continuation.
    pub fn schedule<F>(&self, priority: Priority, work: F) -> TaskHandle
    where
        F: FnOnce() + 'static,
    {
        self.schedule_callback(
            priority,
            move |_| {
                work();
                Continuation::Done
            },
            ScheduleOptions::default(),
        )
    }

    /// Cancels a task. Its callback will never run; the heap node is
    /// discarded when the loop reaches it. Cancelling twice is harmless.
    pub fn cancel_callback(&self, task: &TaskHandle) {
        tracing::debug!(task = task.id(), "cancelling task");
        task.cancel();
    }

    /// Runs `f` with `priority` as the current priority level, restoring the
    /// previous level afterwards even if `f` panics.
    pub fn run_with_priority<R>(&self, priority: Priority, f: impl FnOnce() -> R) -> R {
        let _guard = PriorityGuard::enter(&self.inner, priority);
        f()
    }

    /// Runs `f` at Normal priority, or at the current level if that is
    /// already lower than Normal.
    pub fn next<R>(&self, f: impl FnOnce() -> R) -> R {
        let priority = self.current_priority_level().shifted_to_normal();
        self.run_with_priority(priority, f)
    }

    /// Captures the current priority level; the returned closure runs
    /// `callback` at that level whenever it is invoked.
    pub fn wrap_callback<F, R>(&self, mut callback: F) -> impl FnMut() -> R + use<F, R>
    where
        F: FnMut() -> R + 'static,
    {
        let parent_priority = self.current_priority_level();
        let scheduler = self.clone();
        move || scheduler.run_with_priority(parent_priority, &mut callback)
    }

    pub fn current_priority_level(&self) -> Priority {
        self.inner.current_priority.get()
    }

    /// True once the current time slice is used up.
    pub fn should_yield(&self) -> bool {
        self.inner.should_yield_to_host()
    }

    /// Tells the loop a paint is pending, so it yields at the deadline even
    /// when no input is pending.
    pub fn request_paint(&self) {
        if self.inner.config.enable_input_pending && self.inner.host.is_input_pending().is_some() {
            self.inner.needs_paint.set(true);
        }
    }

    /// Changes the time slice to `floor(1000 / fps)` ms. `0` restores the
    /// configured default. Values outside `0..=125` are logged and ignored.
    pub fn force_frame_rate(&self, fps: i32) -> Result<(), SchedulerError> {
        if !(0..=MAX_FRAME_RATE).contains(&fps) {
            let err = SchedulerError::InvalidFrameRate { fps };
            tracing::error!("{err}");
            return Err(err);
        }
        let interval = if fps > 0 {
            yield_interval_for(fps as u32)
        } else {
            self.inner.config.yield_interval_ms()
        };
        tracing::debug!(fps, interval, "frame rate forced");
        self.inner.yield_interval.set(interval);
        Ok(())
    }

    pub fn yield_interval_ms(&self) -> f64 {
        self.inner.yield_interval.get()
    }

    pub fn pause_execution(&self) {
        tracing::debug!("scheduler paused");
        self.inner.paused.set(true);
    }

    pub fn continue_execution(&self) {
        tracing::debug!("scheduler resumed");
        self.inner.continue_execution();
    }

    pub fn is_paused(&self) -> bool {
        self.inner.paused.get()
    }

    /// The head of the ready queue, possibly a cancelled task not yet
    /// discarded.
    pub fn first_callback_node(&self) -> Option<TaskHandle> {
        self.inner.peek_task()
    }

    pub fn pending_tasks(&self) -> usize {
        self.inner.task_queue.borrow().len()
    }

    pub fn pending_timers(&self) -> usize {
        self.inner.timer_queue.borrow().len()
    }

    pub fn state(&self) -> SchedulerState {
        let inner = &self.inner;
        if inner.is_performing_work.get() {
            SchedulerState::Running
        } else if inner.paused.get() {
            SchedulerState::Paused
        } else if inner.is_host_callback_scheduled.get()
            || inner.is_message_loop_running.get()
            || inner.host_timeout.get().is_some()
        {
            SchedulerState::Armed
        } else {
            SchedulerState::Idle
        }
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("state", &self.state())
            .field("pending_tasks", &self.pending_tasks())
            .field("pending_timers", &self.pending_timers())
            .field("current_priority", &self.current_priority_level())
            .finish()
    }
}

impl Inner {
    fn schedule_callback(
        &self,
        priority: Priority,
        callback: TaskCallback,
        options: ScheduleOptions,
    ) -> TaskHandle {
        let current_time = self.host.now();
        let start_time = match options.delay {
            Some(delay) if delay > 0.0 => current_time + delay,
            _ => current_time,
        };

        let id = self.task_id_counter.get();
        self.task_id_counter.set(id + 1);
        let task = TaskHandle::new(id, priority, start_time, callback);

        if start_time > current_time {
            // Delayed task.
            task.set_sort_index(start_time);
            self.timer_queue.borrow_mut().push(task.clone());
            tracing::debug!(task = id, %priority, start_time, "scheduled delayed task");

            let is_earliest = self.task_queue.borrow().is_empty()
                && self
                    .timer_queue
                    .borrow()
                    .peek()
                    .is_some_and(|first| first.ptr_eq(&task));
            if is_earliest {
                // All tasks are delayed and this one is due first.
                self.request_host_timeout(start_time - current_time);
            }
        } else {
            task.set_sort_index(task.expiration_time());
            self.task_queue.borrow_mut().push(task.clone());
            tracing::debug!(
                task = id,
                %priority,
                expiration_time = task.expiration_time(),
                "scheduled task"
            );

            // If we're already performing work, wait until the next yield.
            if !self.is_host_callback_scheduled.get()
                && !self.is_performing_work.get()
                && !self.paused.get()
            {
                self.is_host_callback_scheduled.set(true);
                self.request_host_callback();
            }
        }

        task
    }

    fn peek_task(&self) -> Option<TaskHandle> {
        self.task_queue.borrow().peek().cloned()
    }

    fn first_timer_start(&self) -> Option<f64> {
        self.timer_queue.borrow().peek().map(|timer| timer.start_time())
    }

    /// Moves every delayed task whose start time has passed into the ready
    /// queue, dropping cancelled ones on the way.
    fn advance_timers(&self, current_time: f64) {
        let mut timers = self.timer_queue.borrow_mut();
        while let Some(timer) = timers.peek() {
            if !timer.has_callback() {
                timers.pop();
            } else if timer.start_time() <= current_time {
                if let Some(timer) = timers.pop() {
                    timer.set_sort_index(timer.expiration_time());
                    tracing::trace!(task = timer.id(), "timer promoted to ready queue");
                    self.task_queue.borrow_mut().push(timer);
                }
            } else {
                return;
            }
        }
    }

    fn handle_timeout(&self, current_time: f64) {
        self.host_timeout.set(None);
        self.advance_timers(current_time);

        if self.is_host_callback_scheduled.get() {
            return;
        }
        if !self.task_queue.borrow().is_empty() {
            if !self.paused.get() {
                self.is_host_callback_scheduled.set(true);
                self.request_host_callback();
            }
        } else if let Some(start_time) = self.first_timer_start() {
            self.request_host_timeout(start_time - current_time);
        }
    }

    fn flush_work(&self, has_time_remaining: bool, initial_time: f64) -> bool {
        // A new host callback is needed the next time work is scheduled.
        self.is_host_callback_scheduled.set(false);
        if let Some(id) = self.host_timeout.take() {
            // The pending timeout is superseded by this turn.
            self.host.clear_timeout(id);
        }

        let _guard = PerformingWork::enter(self);
        self.work_loop(has_time_remaining, initial_time)
    }

    /// Returns whether work remains in the ready queue.
    fn work_loop(&self, has_time_remaining: bool, initial_time: f64) -> bool {
        let mut current_time = initial_time;
        self.advance_timers(current_time);

        while let Some(task) = self.peek_task() {
            if self.paused.get() {
                return true;
            }
            if task.expiration_time() > current_time
                && (!has_time_remaining || self.should_yield_to_host())
            {
                // Not expired, and the slice is over.
                tracing::trace!(task = task.id(), "yielding to host");
                return true;
            }

            let Some(callback) = task.take_callback() else {
                // Cancelled.
                self.task_queue.borrow_mut().pop();
                continue;
            };

            self.current_priority.set(task.priority());
            let did_timeout = task.expiration_time() <= current_time;
            tracing::trace!(task = task.id(), did_timeout, "running task");
            let continuation = callback(did_timeout);
            current_time = self.host.now();

            match continuation {
                Continuation::Continue(next) if !task.is_cancelled() => task.set_callback(next),
                _ => self.pop_if_head(&task),
            }
            self.advance_timers(current_time);
        }

        if let Some(start_time) = self.first_timer_start() {
            self.request_host_timeout(start_time - current_time);
        }
        false
    }

    fn pop_if_head(&self, task: &TaskHandle) {
        let mut queue = self.task_queue.borrow_mut();
        // A callback may have scheduled something more urgent; in that case
        // the finished node is discarded lazily once it surfaces.
        if queue.peek().is_some_and(|head| head.ptr_eq(task)) {
            queue.pop();
        }
    }

    fn should_yield_to_host(&self) -> bool {
        let current_time = self.host.now();
        if current_time < self.deadline.get() {
            return false;
        }
        if self.config.enable_input_pending {
            if let Some(input_pending) = self.host.is_input_pending() {
                if self.needs_paint.get() || input_pending {
                    return true;
                }
                // Nothing pending: keep going until the max slice.
                return current_time >= self.slice_start.get() + self.config.max_yield_interval_ms;
            }
        }
        true
    }

    fn continue_execution(&self) {
        self.paused.set(false);
        if self.is_host_callback_scheduled.get() || self.is_performing_work.get() {
            return;
        }
        let current_time = self.host.now();
        self.advance_timers(current_time);
        if !self.task_queue.borrow().is_empty() {
            self.is_host_callback_scheduled.set(true);
            self.request_host_callback();
        } else if self.host_timeout.get().is_none() {
            if let Some(start_time) = self.first_timer_start() {
                self.request_host_timeout(start_time - current_time);
            }
        }
    }

    /// Host turn entry point.
    fn perform_work_until_deadline(&self) {
        if self.has_scheduled_callback.get() {
            let current_time = self.host.now();
            self.slice_start.set(current_time);
            self.deadline.set(current_time + self.yield_interval.get());

            // If a task panics, `turn` still re-arms the loop while unwinding so
            // the remaining tasks run on the next turn.
            let mut turn = HostTurn {
                inner: self,
                has_more_work: true,
            };
            turn.has_more_work = self.flush_work(true, current_time);
        } else {
            self.is_message_loop_running.set(false);
        }
        // Yielding gives the host a chance to paint.
        self.needs_paint.set(false);
    }

    fn request_host_callback(&self) {
        self.has_scheduled_callback.set(true);
        if !self.is_message_loop_running.get() {
            self.is_message_loop_running.set(true);
            self.post_message();
        }
    }

    fn post_message(&self) {
        let this = self.this.clone();
        self.host.post_message(Box::new(move || {
            if let Some(inner) = this.upgrade() {
                inner.perform_work_until_deadline();
            }
        }));
    }

    fn request_host_timeout(&self, delay_ms: f64) {
        if let Some(id) = self.host_timeout.take() {
            self.host.clear_timeout(id);
        }
        let this = self.this.clone();
        let id = self.host.set_timeout(
            Box::new(move || {
                if let Some(inner) = this.upgrade() {
                    let now = inner.host.now();
                    inner.handle_timeout(now);
                }
            }),
            delay_ms,
        );
        tracing::trace!(delay_ms, "host timeout armed");
        self.host_timeout.set(Some(id));
    }
}

/// Marks the work loop as running and restores the flag and the priority
/// level on exit, including exit by panic.
struct PerformingWork<'a> {
    inner: &'a Inner,
    previous_priority: Priority,
}

impl<'a> PerformingWork<'a> {
    fn enter(inner: &'a Inner) -> Self {
        inner.is_performing_work.set(true);
        Self {
            inner,
            previous_priority: inner.current_priority.get(),
        }
    }
}

impl Drop for PerformingWork<'_> {
    fn drop(&mut self) {
        self.inner.current_priority.set(self.previous_priority);
        self.inner.is_performing_work.set(false);
    }
}

struct PriorityGuard<'a> {
    inner: &'a Inner,
    previous: Priority,
}

impl<'a> PriorityGuard<'a> {
    fn enter(inner: &'a Inner, priority: Priority) -> Self {
        let previous = inner.current_priority.replace(priority);
        Self { inner, previous }
    }
}

impl Drop for PriorityGuard<'_> {
    fn drop(&mut self) {
        self.inner.current_priority.set(self.previous);
    }
}

/// End of a host turn: keep the message loop going while work remains.
struct HostTurn<'a> {
    inner: &'a Inner,
    has_more_work: bool,
}

impl Drop for HostTurn<'_> {
    fn drop(&mut self) {
        if self.has_more_work && !self.inner.paused.get() {
            // Schedule the next turn at the end of this one.
            self.inner.post_message();
        } else {
            self.inner.is_message_loop_running.set(false);
            self.inner.has_scheduled_callback.set(false);
        }
    }
}

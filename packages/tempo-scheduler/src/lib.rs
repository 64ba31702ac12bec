pub mod clock;
pub mod config;
pub mod error;
pub mod heap;
pub mod host;
pub mod priority;
pub mod scheduler;
pub mod task;

/// A callback handed to the host for later execution.
pub type HostCallback = Box<dyn FnOnce()>;

/// The embedding event loop, as seen by the scheduler.
/// Implementations decide how "yield and call me back" is realised: a
/// message-channel style queue, a timer fallback, a platform run loop.
pub trait Host {
    /// Current time in milliseconds (monotonic).
    fn now(&self) -> f64;

    /// Run `callback` as soon as the host is willing to yield to us again.
    fn post_message(&self, callback: HostCallback);

    /// Run `callback` after at least `delay_ms` milliseconds.
    fn set_timeout(&self, callback: HostCallback, delay_ms: f64) -> TimeoutId;

    fn clear_timeout(&self, id: TimeoutId);

    /// Run `callback` at the end of the current host turn.
    fn queue_microtask(&self, callback: HostCallback);

    /// Run `callback` before the next paint.
    fn request_animation_frame(&self, callback: HostCallback) -> FrameId;

    fn cancel_animation_frame(&self, id: FrameId);

    /// Whether user input is waiting to be handled. `None` when the host
    /// cannot tell.
    fn is_input_pending(&self) -> Option<bool> {
        None
    }
}

pub use clock::{Clock, MonotonicClock, SystemClock, VirtualClock};
pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use heap::{HeapNode, TaskHeap};
pub use host::{FrameId, LocalHost, LocalHostConfig, TimeoutId, YieldMode};
pub use priority::Priority;
pub use scheduler::{ScheduleOptions, Scheduler, SchedulerState};
pub use task::{Continuation, TaskCallback, TaskHandle};

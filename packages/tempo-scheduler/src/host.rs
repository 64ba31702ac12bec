use crate::clock::Clock;
use crate::{Host, HostCallback};
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

new_key_type! {
    pub struct TimeoutId;
    pub struct FrameId;
}

/// How `post_message` yields back to the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum YieldMode {
    /// Posted messages run before any timer, with no added latency.
    #[default]
    MessageChannel,
    /// Posted messages become zero-delay timeouts and share the timer queue.
    Timer,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocalHostConfig {
    pub yield_mode: YieldMode,
}

struct Timer {
    due: f64,
    seq: u64,
    callback: HostCallback,
}

struct Frame {
    seq: u64,
    callback: HostCallback,
}

/// A single-threaded event loop that plays the host role for the scheduler.
///
/// Nothing runs until the embedder drives it with [`tick`](Self::tick),
/// [`run_frame`](Self::run_frame) or [`run_until_idle`](Self::run_until_idle).
/// Microtasks are drained after every macrotask and after every frame.
pub struct LocalHost {
    clock: Rc<dyn Clock>,
    config: LocalHostConfig,
    messages: RefCell<VecDeque<HostCallback>>,
    microtasks: RefCell<VecDeque<HostCallback>>,
    timers: RefCell<SlotMap<TimeoutId, Timer>>,
    frames: RefCell<SlotMap<FrameId, Frame>>,
    seq: Cell<u64>,
    frame_count: Cell<u64>,
    input_pending: Cell<Option<bool>>,
}

impl LocalHost {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self::with_config(clock, LocalHostConfig::default())
    }

    pub fn with_config(clock: Rc<dyn Clock>, config: LocalHostConfig) -> Self {
        tracing::debug!(yield_mode = ?config.yield_mode, "creating local host");
        Self {
            clock,
            config,
            messages: RefCell::new(VecDeque::new()),
            microtasks: RefCell::new(VecDeque::new()),
            timers: RefCell::new(SlotMap::with_key()),
            frames: RefCell::new(SlotMap::with_key()),
            seq: Cell::new(0),
            frame_count: Cell::new(0),
            input_pending: Cell::new(None),
        }
    }

    pub fn yield_mode(&self) -> YieldMode {
        self.config.yield_mode
    }

    /// Runs one macrotask: the oldest posted message, or else the earliest
    /// timer that is due. Returns false when there was nothing to run.
    pub fn tick(&self) -> bool {
        let next = self
            .messages
            .borrow_mut()
            .pop_front()
            .or_else(|| self.take_due_timer());
        match next {
            Some(callback) => {
                callback();
                self.drain_microtasks();
                true
            }
            None => false,
        }
    }

    /// Runs every animation frame callback requested before this call, in
    /// request order. Callbacks requested during the frame wait for the next.
    pub fn run_frame(&self) -> usize {
        let mut frames: Vec<Frame> = {
            let mut pending = self.frames.borrow_mut();
            pending.drain().map(|(_, frame)| frame).collect()
        };
        if frames.is_empty() {
            return 0;
        }
        frames.sort_by_key(|frame| frame.seq);
        self.frame_count.set(self.frame_count.get() + 1);
        tracing::trace!(callbacks = frames.len(), "running animation frame");

        let count = frames.len();
        for frame in frames {
            (frame.callback)();
        }
        self.drain_microtasks();
        count
    }

    /// Alternates between draining runnable macrotasks and rendering frames
    /// until neither has work. Timers that are not yet due stay pending.
    ///
    /// A frame callback that always requests another frame keeps this from
    /// returning.
    pub fn run_until_idle(&self) {
        loop {
            while self.tick() {}
            if self.frames.borrow().is_empty() {
                break;
            }
            self.run_frame();
        }
    }

    pub fn drain_microtasks(&self) {
        loop {
            let next = self.microtasks.borrow_mut().pop_front();
            match next {
                Some(callback) => callback(),
                None => break,
            }
        }
    }

    /// True when no message, microtask, frame or timer is pending.
    pub fn is_idle(&self) -> bool {
        self.messages.borrow().is_empty()
            && self.microtasks.borrow().is_empty()
            && self.frames.borrow().is_empty()
            && self.timers.borrow().is_empty()
    }

    pub fn pending_messages(&self) -> usize {
        self.messages.borrow().len()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.borrow().len()
    }

    /// Number of frames rendered so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count.get()
    }

    /// Absolute time at which the earliest timer becomes due.
    pub fn next_timer_due(&self) -> Option<f64> {
        self.timers
            .borrow()
            .values()
            .map(|timer| timer.due)
            .min_by(f64::total_cmp)
    }

    /// Sets the answer of [`Host::is_input_pending`]. `None` means the host
    /// does not support the signal.
    pub fn set_input_pending(&self, pending: Option<bool>) {
        self.input_pending.set(pending);
    }

    fn next_seq(&self) -> u64 {
        let seq = self.seq.get();
        self.seq.set(seq + 1);
        seq
    }

    fn take_due_timer(&self) -> Option<HostCallback> {
        let now = self.clock.now();
        let mut timers = self.timers.borrow_mut();
        let key = timers
            .iter()
            .filter(|(_, timer)| timer.due <= now)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)))
            .map(|(key, _)| key)?;
        timers.remove(key).map(|timer| timer.callback)
    }
}

impl Host for LocalHost {
    fn now(&self) -> f64 {
        self.clock.now()
    }

    fn post_message(&self, callback: HostCallback) {
        match self.config.yield_mode {
            YieldMode::MessageChannel => self.messages.borrow_mut().push_back(callback),
            YieldMode::Timer => {
                self.set_timeout(callback, 0.0);
            }
        }
    }

    fn set_timeout(&self, callback: HostCallback, delay_ms: f64) -> TimeoutId {
        let due = self.clock.now() + delay_ms.max(0.0);
        let seq = self.next_seq();
        self.timers.borrow_mut().insert(Timer { due, seq, callback })
    }

    fn clear_timeout(&self, id: TimeoutId) {
        let removed = self.timers.borrow_mut().remove(id);
        drop(removed);
    }

    fn queue_microtask(&self, callback: HostCallback) {
        self.microtasks.borrow_mut().push_back(callback);
    }

    fn request_animation_frame(&self, callback: HostCallback) -> FrameId {
        let seq = self.next_seq();
        self.frames.borrow_mut().insert(Frame { seq, callback })
    }

    fn cancel_animation_frame(&self, id: FrameId) {
        let removed = self.frames.borrow_mut().remove(id);
        drop(removed);
    }

    fn is_input_pending(&self) -> Option<bool> {
        self.input_pending.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::VirtualClock;
    use std::cell::RefCell;

    fn host(mode: YieldMode) -> (VirtualClock, LocalHost) {
        let clock = VirtualClock::new();
        let host = LocalHost::with_config(
            Rc::new(clock.clone()),
            LocalHostConfig { yield_mode: mode },
        );
        (clock, host)
    }

    #[test]
    fn messages_run_before_due_timers() {
        let (_clock, host) = host(YieldMode::MessageChannel);
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = log.clone();
        host.set_timeout(Box::new(move || l.borrow_mut().push("timer")), 0.0);
        let l = log.clone();
        host.post_message(Box::new(move || l.borrow_mut().push("message")));

        host.run_until_idle();
        assert_eq!(*log.borrow(), vec!["message", "timer"]);
        assert!(host.is_idle());
    }

    #[test]
    fn timer_mode_keeps_posting_order_with_timers() {
        let (_clock, host) = host(YieldMode::Timer);
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = log.clone();
        host.set_timeout(Box::new(move || l.borrow_mut().push("timer")), 0.0);
        let l = log.clone();
        host.post_message(Box::new(move || l.borrow_mut().push("message")));

        assert_eq!(host.pending_messages(), 0);
        host.run_until_idle();
        assert_eq!(*log.borrow(), vec!["timer", "message"]);
    }

    #[test]
    fn timers_wait_for_the_clock() {
        let (clock, host) = host(YieldMode::MessageChannel);
        let fired = Rc::new(Cell::new(false));

        let f = fired.clone();
        host.set_timeout(Box::new(move || f.set(true)), 50.0);
        assert_eq!(host.next_timer_due(), Some(50.0));

        clock.advance(49.0);
        assert!(!host.tick());
        clock.advance(1.0);
        assert!(host.tick());
        assert!(fired.get());
    }

    #[test]
    fn cleared_timers_and_frames_never_run() {
        let (_clock, host) = host(YieldMode::MessageChannel);
        let fired = Rc::new(Cell::new(0));

        let f = fired.clone();
        let timeout = host.set_timeout(Box::new(move || f.set(f.get() + 1)), 0.0);
        let f = fired.clone();
        let frame = host.request_animation_frame(Box::new(move || f.set(f.get() + 1)));
        host.clear_timeout(timeout);
        host.cancel_animation_frame(frame);

        host.run_until_idle();
        assert_eq!(fired.get(), 0);
        assert_eq!(host.frame_count(), 0);
    }

    #[test]
    fn microtasks_drain_after_each_macrotask() {
        let (_clock, host) = host(YieldMode::MessageChannel);
        let host = Rc::new(host);
        let log = Rc::new(RefCell::new(Vec::new()));

        let (h, l) = (host.clone(), log.clone());
        host.post_message(Box::new(move || {
            l.borrow_mut().push("first");
            let l2 = l.clone();
            h.queue_microtask(Box::new(move || l2.borrow_mut().push("micro")));
        }));
        let l = log.clone();
        host.post_message(Box::new(move || l.borrow_mut().push("second")));

        host.run_until_idle();
        assert_eq!(*log.borrow(), vec!["first", "micro", "second"]);
    }

    #[test]
    fn frames_requested_during_a_frame_run_next_frame() {
        let (_clock, host) = host(YieldMode::MessageChannel);
        let host = Rc::new(host);
        let count = Rc::new(Cell::new(0));

        let (h, c) = (host.clone(), count.clone());
        host.request_animation_frame(Box::new(move || {
            c.set(c.get() + 1);
            let c2 = c.clone();
            h.request_animation_frame(Box::new(move || c2.set(c2.get() + 1)));
        }));

        assert_eq!(host.run_frame(), 1);
        assert_eq!(count.get(), 1);
        assert_eq!(host.pending_frames(), 1);
        host.run_until_idle();
        assert_eq!(count.get(), 2);
        assert_eq!(host.frame_count(), 2);
    }
}

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// A source of monotonic time in milliseconds.
pub trait Clock {
    fn now(&self) -> f64;
}

/// High resolution clock measured from its creation.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Wall clock fallback, normalised so that its epoch is the moment it was
/// created. Not monotonic if the system time jumps backwards.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    initial_time: f64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            initial_time: wall_millis(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        wall_millis() - self.initial_time
    }
}

fn wall_millis() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Manually advanced clock for deterministic tests and simulations.
/// Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    time: Rc<Cell<f64>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(time: f64) -> Self {
        Self {
            time: Rc::new(Cell::new(time)),
        }
    }

    pub fn advance(&self, ms: f64) {
        self.time.set(self.time.get() + ms);
    }

    pub fn set(&self, time: f64) {
        self.time.set(time);
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> f64 {
        self.time.get()
    }
}

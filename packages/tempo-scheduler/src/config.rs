use crate::error::SchedulerError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FRAME_RATE: u32 = 60;
pub const MAX_FRAME_RATE: i32 = 125;
pub const DEFAULT_MAX_YIELD_INTERVAL_MS: f64 = 300.0;

/// Tuning knobs of the work loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchedulerConfig {
    /// Target frame rate. The time slice per host turn is `floor(1000 / fps)`.
    pub frame_rate: u32,
    /// Upper bound of a slice when input-pending signalling lets the loop run
    /// past its deadline.
    pub max_yield_interval_ms: f64,
    /// Consult `Host::is_input_pending` when the deadline is reached.
    pub enable_input_pending: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            max_yield_interval_ms: DEFAULT_MAX_YIELD_INTERVAL_MS,
            enable_input_pending: false,
        }
    }
}

impl SchedulerConfig {
    pub fn from_json(json: &str) -> Result<Self, SchedulerError> {
        let config: SchedulerConfig =
            serde_json::from_str(json).map_err(|e| SchedulerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.frame_rate == 0 || self.frame_rate as i64 > MAX_FRAME_RATE as i64 {
            return Err(SchedulerError::InvalidFrameRate {
                fps: self.frame_rate.min(i32::MAX as u32) as i32,
            });
        }
        if !(self.max_yield_interval_ms > 0.0) {
            return Err(SchedulerError::Config(format!(
                "maxYieldIntervalMs must be positive, got {}",
                self.max_yield_interval_ms
            )));
        }
        Ok(())
    }

    /// Length of one time slice in milliseconds.
    pub fn yield_interval_ms(&self) -> f64 {
        yield_interval_for(self.frame_rate)
    }
}

pub(crate) fn yield_interval_for(fps: u32) -> f64 {
    (1000.0 / fps.max(1) as f64).floor()
}

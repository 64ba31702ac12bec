use serde::{Deserialize, Serialize};
use std::fmt;

/// Max 31 bit integer, used as the "never expires" timeout.
pub const MAX_SIGNED_31_BIT_INT: f64 = 1_073_741_823.0;

/// Times out immediately.
pub const IMMEDIATE_PRIORITY_TIMEOUT: f64 = -1.0;
pub const USER_BLOCKING_PRIORITY_TIMEOUT: f64 = 250.0;
pub const NORMAL_PRIORITY_TIMEOUT: f64 = 5000.0;
pub const LOW_PRIORITY_TIMEOUT: f64 = 10000.0;
/// Never times out.
pub const IDLE_PRIORITY_TIMEOUT: f64 = MAX_SIGNED_31_BIT_INT;

/// Urgency class of a task. Variants are declared from most to least urgent,
/// so the derived ordering compares urgency.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Priority {
    Immediate,
    UserBlocking,
    #[default]
    Normal,
    Low,
    Idle,
}

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::Immediate,
        Priority::UserBlocking,
        Priority::Normal,
        Priority::Low,
        Priority::Idle,
    ];

    /// Maps a numeric level (1 = Immediate .. 5 = Idle) to a priority.
    /// Anything else, including the "no priority" level 0, is Normal.
    pub fn from_level(level: u8) -> Self {
        match level {
            1 => Priority::Immediate,
            2 => Priority::UserBlocking,
            3 => Priority::Normal,
            4 => Priority::Low,
            5 => Priority::Idle,
            _ => Priority::Normal,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Priority::Immediate => 1,
            Priority::UserBlocking => 2,
            Priority::Normal => 3,
            Priority::Low => 4,
            Priority::Idle => 5,
        }
    }

    /// Milliseconds added to a task's start time to get its expiration time.
    pub fn timeout_ms(self) -> f64 {
        match self {
            Priority::Immediate => IMMEDIATE_PRIORITY_TIMEOUT,
            Priority::UserBlocking => USER_BLOCKING_PRIORITY_TIMEOUT,
            Priority::Normal => NORMAL_PRIORITY_TIMEOUT,
            Priority::Low => LOW_PRIORITY_TIMEOUT,
            Priority::Idle => IDLE_PRIORITY_TIMEOUT,
        }
    }

    pub fn expiration_time(self, start_time: f64) -> f64 {
        start_time + self.timeout_ms()
    }

    /// Priority used by `Scheduler::next`: anything at or above Normal is
    /// shifted down to Normal, lower levels are kept.
    pub fn shifted_to_normal(self) -> Self {
        match self {
            Priority::Immediate | Priority::UserBlocking | Priority::Normal => Priority::Normal,
            other => other,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Priority::Immediate => "immediate",
            Priority::UserBlocking => "userBlocking",
            Priority::Normal => "normal",
            Priority::Low => "low",
            Priority::Idle => "idle",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_match_table() {
        assert_eq!(Priority::Immediate.timeout_ms(), -1.0);
        assert_eq!(Priority::UserBlocking.timeout_ms(), 250.0);
        assert_eq!(Priority::Normal.timeout_ms(), 5000.0);
        assert_eq!(Priority::Low.timeout_ms(), 10000.0);
        assert_eq!(Priority::Idle.timeout_ms(), 1_073_741_823.0);
    }

    #[test]
    fn unknown_levels_default_to_normal() {
        assert_eq!(Priority::from_level(0), Priority::Normal);
        assert_eq!(Priority::from_level(6), Priority::Normal);
        assert_eq!(Priority::from_level(200), Priority::Normal);
        for priority in Priority::ALL {
            assert_eq!(Priority::from_level(priority.level()), priority);
        }
    }

    #[test]
    fn ordering_follows_urgency() {
        assert!(Priority::Immediate < Priority::UserBlocking);
        assert!(Priority::Low < Priority::Idle);
        assert_eq!(Priority::default(), Priority::Normal);
    }

    #[test]
    fn shift_keeps_low_levels() {
        assert_eq!(Priority::Immediate.shifted_to_normal(), Priority::Normal);
        assert_eq!(Priority::UserBlocking.shifted_to_normal(), Priority::Normal);
        assert_eq!(Priority::Low.shifted_to_normal(), Priority::Low);
        assert_eq!(Priority::Idle.shifted_to_normal(), Priority::Idle);
    }

    #[test]
    fn deserializes_camel_case_names() {
        let p: Priority = serde_json::from_str("\"userBlocking\"").unwrap();
        assert_eq!(p, Priority::UserBlocking);
    }
}

//! Where "now" comes from.

use chrono::{Local, Timelike};

use crate::domain::ClockTime;

/// Source of the current time of day.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> ClockTime;
}

/// The local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> ClockTime {
        let now = Local::now().time();
        ClockTime::from_seconds_wrapping(now.num_seconds_from_midnight() as i64)
    }
}

/// A clock stopped at a given time. Useful in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub ClockTime);

impl TimeSource for FixedClock {
    fn now(&self) -> ClockTime {
        self.0
    }
}

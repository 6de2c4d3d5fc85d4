//! Time-of-day handling for scheduled runs.
//!
//! Runs are timetabled with wall-clock times that carry no date. A run that
//! departs at 23:40 and arrives at 00:25 arrives on the following day, so the
//! engine works on a per-run linear timeline (`ServiceTime`) anchored at
//! midnight of the departure day, and only folds back to `ClockTime` for
//! output.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Add;

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Seconds in one day.
pub const SECS_PER_DAY: i64 = 24 * 60 * 60;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A wall-clock time of day with second resolution.
///
/// # Examples
///
/// ```
/// use rail_scheduler::domain::ClockTime;
///
/// let t = ClockTime::parse("01:30").unwrap();
/// assert_eq!(t.to_string(), "01:30");
///
/// let t = ClockTime::parse("01:30:15").unwrap();
/// assert_eq!(t.to_string(), "01:30:15");
///
/// assert!(ClockTime::parse("24:00").is_err());
/// assert!(ClockTime::parse("1:30").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u32);

impl ClockTime {
    /// Midnight.
    pub const MIDNIGHT: ClockTime = ClockTime(0);

    /// Parse a time from `HH:MM` or `HH:MM:SS`.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let bytes = s.as_bytes();

        if bytes.len() != 5 && bytes.len() != 8 {
            return Err(TimeError::new("expected HH:MM or HH:MM:SS format"));
        }
        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > 23 {
            return Err(TimeError::new("hour must be 0-23"));
        }

        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        let second = if bytes.len() == 8 {
            if bytes[5] != b':' {
                return Err(TimeError::new("expected colon at position 5"));
            }
            let second = parse_two_digits(&bytes[6..8])
                .ok_or_else(|| TimeError::new("invalid second digits"))?;
            if second > 59 {
                return Err(TimeError::new("second must be 0-59"));
            }
            second
        } else {
            0
        };

        Ok(Self(hour * 3600 + minute * 60 + second))
    }

    /// Build a time from seconds since midnight, wrapping into one day.
    pub fn from_seconds_wrapping(secs: i64) -> Self {
        Self(secs.rem_euclid(SECS_PER_DAY) as u32)
    }

    /// Seconds since midnight.
    pub fn seconds_since_midnight(&self) -> u32 {
        self.0
    }

    pub fn hour(&self) -> u32 {
        self.0 / 3600
    }

    pub fn minute(&self) -> u32 {
        (self.0 / 60) % 60
    }

    pub fn second(&self) -> u32 {
        self.0 % 60
    }

    /// Place this time of day on a run timeline, on the departure day.
    pub fn on_first_day(self) -> ServiceTime {
        ServiceTime(self.0 as i64)
    }
}

impl fmt::Debug for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClockTime({})", self)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.second() == 0 {
            write!(f, "{:02}:{:02}", self.hour(), self.minute())
        } else {
            write!(
                f,
                "{:02}:{:02}:{:02}",
                self.hour(),
                self.minute(),
                self.second()
            )
        }
    }
}

impl TryFrom<String> for ClockTime {
    type Error = TimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

/// A point on one run's linear timeline.
///
/// Measured from midnight of the day the run departs, so values of 24h or
/// more are on a following day. Two `ServiceTime`s are only comparable when
/// they belong to the same timeline.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct ServiceTime(i64);

impl ServiceTime {
    /// Build from seconds since midnight of the departure day.
    pub fn from_seconds(secs: i64) -> Self {
        Self(secs)
    }

    pub fn seconds(&self) -> i64 {
        self.0
    }

    /// The wall-clock time, folded back into 0-24h.
    pub fn clock(&self) -> ClockTime {
        ClockTime::from_seconds_wrapping(self.0)
    }

    /// How many midnights lie between the departure day and this time.
    pub fn day_offset(&self) -> i64 {
        self.0.div_euclid(SECS_PER_DAY)
    }

    /// True if this time falls after the first midnight of the run.
    pub fn is_next_day(&self) -> bool {
        self.day_offset() > 0
    }

    /// Returns the duration between two times on the same timeline.
    pub fn signed_duration_since(&self, other: Self) -> Duration {
        Duration::seconds(self.0 - other.0)
    }

    /// Shift by a whole number of days.
    pub fn shifted_days(&self, days: i64) -> Self {
        Self(self.0 + days * SECS_PER_DAY)
    }
}

impl Add<Duration> for ServiceTime {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + rhs.num_seconds())
    }
}

impl Ord for ServiceTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for ServiceTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceTime({})", self)
    }
}

impl fmt::Display for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.clock())?;
        match self.day_offset() {
            0 => Ok(()),
            d if d > 0 => write!(f, "+{d}"),
            d => write!(f, "{d}"),
        }
    }
}

impl From<ServiceTime> for String {
    fn from(value: ServiceTime) -> Self {
        value.to_string()
    }
}

/// A half-open interval `[start, end)` on a run timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeWindow {
    pub start: ServiceTime,
    pub end: ServiceTime,
}

impl TimeWindow {
    /// Create a window. `start` must not be after `end`.
    pub fn new(start: ServiceTime, end: ServiceTime) -> Self {
        debug_assert!(start <= end, "window start after end");
        Self { start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end.signed_duration_since(self.start)
    }

    /// Shift both ends by a whole number of days.
    pub fn shifted_days(&self, days: i64) -> Self {
        Self {
            start: self.start.shifted_days(days),
            end: self.end.shifted_days(days),
        }
    }

    /// Intersection of two windows on the same timeline.
    ///
    /// Windows that only touch (`self.end == other.start`) do not overlap.
    ///
    /// ```
    /// use rail_scheduler::domain::{ClockTime, TimeWindow};
    ///
    /// let t = |s| ClockTime::parse(s).unwrap().on_first_day();
    /// let a = TimeWindow::new(t("01:30"), t("02:08"));
    /// let b = TimeWindow::new(t("01:45"), t("01:55"));
    /// assert_eq!(a.overlap(&b), Some(b));
    ///
    /// let c = TimeWindow::new(t("02:08"), t("02:30"));
    /// assert_eq!(a.overlap(&c), None);
    /// ```
    pub fn overlap(&self, other: &TimeWindow) -> Option<TimeWindow> {
        if self.start < other.end && other.start < self.end {
            Some(TimeWindow {
                start: self.start.max(other.start),
                end: self.end.min(other.end),
            })
        } else {
            None
        }
    }

    /// Intersection with a window from another run's timeline.
    ///
    /// Each run's timeline starts on its own departure day, so `other` is
    /// tried as-is, one day earlier and one day later. The longest overlap
    /// wins; ties prefer no shift, then the earlier day. Returns the overlap
    /// in this window's frame and the day shift applied to `other`.
    pub fn overlap_across_days(&self, other: &TimeWindow) -> Option<(TimeWindow, i64)> {
        let mut best: Option<(TimeWindow, i64)> = None;
        for shift in [0, -1, 1] {
            if let Some(o) = self.overlap(&other.shifted_days(shift)) {
                let longer = best.is_none_or(|(b, _)| o.duration() > b.duration());
                if longer {
                    best = Some((o, shift));
                }
            }
        }
        best
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(s: &str) -> ClockTime {
        ClockTime::parse(s).unwrap()
    }

    fn st(s: &str) -> ServiceTime {
        clock(s).on_first_day()
    }

    #[test]
    fn parse_valid_times() {
        let t = clock("00:00");
        assert_eq!((t.hour(), t.minute(), t.second()), (0, 0, 0));

        let t = clock("23:59");
        assert_eq!((t.hour(), t.minute()), (23, 59));

        let t = clock("14:30:45");
        assert_eq!((t.hour(), t.minute(), t.second()), (14, 30, 45));
    }

    #[test]
    fn parse_invalid_format() {
        assert!(ClockTime::parse("1430").is_err());
        assert!(ClockTime::parse("14:3").is_err());
        assert!(ClockTime::parse("14-30").is_err());
        assert!(ClockTime::parse("14:30-00").is_err());
        assert!(ClockTime::parse("").is_err());
        assert!(ClockTime::parse("ab:cd").is_err());
    }

    #[test]
    fn parse_invalid_values() {
        assert!(ClockTime::parse("24:00").is_err());
        assert!(ClockTime::parse("12:60").is_err());
        assert!(ClockTime::parse("12:00:60").is_err());
    }

    #[test]
    fn display_format() {
        assert_eq!(clock("09:05").to_string(), "09:05");
        assert_eq!(clock("09:05:07").to_string(), "09:05:07");
        assert_eq!(format!("{:?}", clock("09:05")), "ClockTime(09:05)");
    }

    #[test]
    fn serde_as_string() {
        let t = clock("01:45");
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"01:45\"");
        let back: ClockTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
        assert!(serde_json::from_str::<ClockTime>("\"25:00\"").is_err());
    }

    #[test]
    fn service_time_folds_to_clock() {
        let t = st("23:30") + Duration::hours(1);
        assert_eq!(t.clock(), clock("00:30"));
        assert!(t.is_next_day());
        assert_eq!(t.day_offset(), 1);
        assert_eq!(t.to_string(), "00:30+1");
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"00:30+1\"");
    }

    #[test]
    fn service_time_ordering_spans_days() {
        let late = st("23:30");
        let early_next = st("00:10").shifted_days(1);
        assert!(late < early_next);
        assert_eq!(early_next.signed_duration_since(late), Duration::minutes(40));
    }

    #[test]
    fn overlap_clipped_to_both() {
        let a = TimeWindow::new(st("01:30"), st("02:08"));
        let b = TimeWindow::new(st("01:20"), st("01:50"));
        assert_eq!(a.overlap(&b), Some(TimeWindow::new(st("01:30"), st("01:50"))));
    }

    #[test]
    fn touching_windows_do_not_overlap() {
        let a = TimeWindow::new(st("01:00"), st("02:00"));
        let b = TimeWindow::new(st("02:00"), st("03:00"));
        assert_eq!(a.overlap(&b), None);
        assert_eq!(b.overlap(&a), None);
    }

    #[test]
    fn overlap_across_midnight() {
        // Candidate runs 00:10-00:20; other run departed 23:50 the day before
        // and is on the line until 00:40.
        let candidate = TimeWindow::new(st("00:10"), st("00:20"));
        let other = TimeWindow::new(st("23:50"), st("00:40").shifted_days(1));

        assert_eq!(candidate.overlap(&other), None);
        assert_eq!(candidate.overlap_across_days(&other), Some((candidate, -1)));
    }

    #[test]
    fn overlap_across_days_prefers_longest() {
        let a = TimeWindow::new(st("22:00"), st("02:00").shifted_days(1));
        let b = TimeWindow::new(st("01:00"), st("23:00"));
        // Same day gives [22:00, 23:00); shifted forward gives [01:00+1, 02:00+1).
        let (o, shift) = a.overlap_across_days(&b).unwrap();
        assert_eq!(o, TimeWindow::new(st("22:00"), st("23:00")));
        assert_eq!(shift, 0);
    }
}

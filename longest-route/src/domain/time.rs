//! Clock times on the modeled travel day.
//!
//! Timetables give times as "HH:MM" strings. A travel day may run past
//! midnight (a 06:00 start with an 18 hour budget ends at 24:00, and the
//! bound table runs to 25:00), so hours are not limited to 0-23. Spans
//! between two clock times are plain `chrono::Duration`s.

use std::fmt;
use std::ops::{Add, Sub};

use chrono::Duration;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time {input:?}: {reason}")]
pub struct TimeError {
    input: String,
    reason: &'static str,
}

impl TimeError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// A minute-resolution instant of the travel day, counted from midnight.
///
/// # Examples
///
/// ```
/// use longest_route::domain::Clock;
///
/// let t = Clock::parse_hhmm("08:30").unwrap();
/// assert_eq!(t.minutes(), 510);
/// assert_eq!(t.to_string(), "08:30");
///
/// // Times past midnight of the first day are allowed.
/// assert_eq!(Clock::parse_hhmm("25:00").unwrap().minutes(), 1500);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Clock(u32);

impl Clock {
    /// Midnight at the start of the travel day.
    pub const MIDNIGHT: Clock = Clock(0);

    /// Create a clock time from minutes since midnight.
    pub const fn from_minutes(minutes: u32) -> Self {
        Self(minutes)
    }

    /// Parse a time from "HH:MM" format.
    ///
    /// ```
    /// use longest_route::domain::Clock;
    ///
    /// assert!(Clock::parse_hhmm("00:00").is_ok());
    /// assert!(Clock::parse_hhmm("24:00").is_ok());
    /// assert!(Clock::parse_hhmm("1430").is_err());
    /// assert!(Clock::parse_hhmm("14:3").is_err());
    /// assert!(Clock::parse_hhmm("14:60").is_err());
    /// ```
    pub fn parse_hhmm(s: &str) -> Result<Self, TimeError> {
        if s.len() != 5 {
            return Err(TimeError::new(s, "expected HH:MM format"));
        }

        let bytes = s.as_bytes();
        if bytes[2] != b':' {
            return Err(TimeError::new(s, "expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new(s, "invalid hour digits"))?;
        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new(s, "invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new(s, "minute must be 0-59"));
        }

        Ok(Self(hour * 60 + minute))
    }

    /// Minutes since midnight.
    pub const fn minutes(self) -> u32 {
        self.0
    }

    pub fn hour(self) -> u32 {
        self.0 / 60
    }

    pub fn minute(self) -> u32 {
        self.0 % 60
    }

    /// Add a span, returning `None` if the result would fall before midnight.
    pub fn checked_add(self, span: Duration) -> Option<Self> {
        let minutes = i64::from(self.0) + span.num_minutes();
        u32::try_from(minutes).ok().map(Self)
    }

    /// Subtract a span, returning `None` if the result would fall before midnight.
    pub fn checked_sub(self, span: Duration) -> Option<Self> {
        self.checked_add(-span)
    }

    /// The span from `earlier` to `self`; negative if `earlier` is later.
    pub fn signed_duration_since(self, earlier: Clock) -> Duration {
        Duration::minutes(i64::from(self.0) - i64::from(earlier.0))
    }
}

impl Add<Duration> for Clock {
    type Output = Self;

    /// Saturates at midnight for negative spans that would underflow.
    fn add(self, rhs: Duration) -> Self::Output {
        self.checked_add(rhs).unwrap_or(Clock::MIDNIGHT)
    }
}

impl Sub<Duration> for Clock {
    type Output = Self;

    fn sub(self, rhs: Duration) -> Self::Output {
        self + (-rhs)
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Clock({self})")
    }
}

impl fmt::Display for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for Clock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Clock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Clock::parse_hhmm(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse a span written as "HH:MM" (used for waits and rule thresholds).
pub fn parse_span_hhmm(s: &str) -> Result<Duration, TimeError> {
    Clock::parse_hhmm(s).map(|c| Duration::minutes(i64::from(c.minutes())))
}

/// Format a span as "HH:MM". Negative spans are clamped to zero.
pub fn format_span(span: Duration) -> String {
    let minutes = span.num_minutes().max(0);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
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

    fn clock(s: &str) -> Clock {
        Clock::parse_hhmm(s).unwrap()
    }

    #[test]
    fn parse_valid_times() {
        assert_eq!(clock("00:00").minutes(), 0);
        assert_eq!(clock("06:00").minutes(), 360);
        assert_eq!(clock("23:59").minutes(), 23 * 60 + 59);
        assert_eq!(clock("25:00").minutes(), 1500);
    }

    #[test]
    fn reject_invalid_format() {
        assert!(Clock::parse_hhmm("").is_err());
        assert!(Clock::parse_hhmm("8:00").is_err());
        assert!(Clock::parse_hhmm("08-00").is_err());
        assert!(Clock::parse_hhmm("0a:00").is_err());
        assert!(Clock::parse_hhmm("08:61").is_err());
        assert!(Clock::parse_hhmm("08:000").is_err());
    }

    #[test]
    fn error_mentions_input() {
        let err = Clock::parse_hhmm("8:00").unwrap_err();
        assert_eq!(err.to_string(), "invalid time \"8:00\": expected HH:MM format");
    }

    #[test]
    fn arithmetic() {
        let t = clock("08:30");
        assert_eq!(t + Duration::minutes(45), clock("09:15"));
        assert_eq!(t - Duration::minutes(31), clock("07:59"));
        assert_eq!(t.checked_sub(Duration::hours(9)), None);
        assert_eq!(clock("09:10").signed_duration_since(t), Duration::minutes(40));
        assert_eq!(t.signed_duration_since(clock("09:10")), Duration::minutes(-40));
    }

    #[test]
    fn span_formatting() {
        assert_eq!(format_span(Duration::minutes(5)), "00:05");
        assert_eq!(format_span(Duration::minutes(18 * 60)), "18:00");
        assert_eq!(format_span(Duration::minutes(-3)), "00:00");
        assert_eq!(parse_span_hhmm("00:15").unwrap(), Duration::minutes(15));
    }

    #[test]
    fn serde_uses_hhmm_strings() {
        let json = serde_json::to_string(&clock("11:05")).unwrap();
        assert_eq!(json, "\"11:05\"");
        let back: Clock = serde_json::from_str(&json).unwrap();
        assert_eq!(back, clock("11:05"));
        assert!(serde_json::from_str::<Clock>("\"11h05\"").is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Display output always parses back to the same clock time.
        #[test]
        fn display_parses_back(minutes in 0u32..6000) {
            let t = Clock::from_minutes(minutes);
            prop_assert_eq!(Clock::parse_hhmm(&t.to_string()).unwrap(), t);
        }

        /// Ordering of clock times agrees with ordering of their text form.
        #[test]
        fn order_matches_text(a in 0u32..6000, b in 0u32..6000) {
            let (ta, tb) = (Clock::from_minutes(a), Clock::from_minutes(b));
            prop_assert_eq!(ta.cmp(&tb), ta.to_string().cmp(&tb.to_string()));
        }
    }
}

//! Time types for the presence protocols.
//!
//! These types provide explicit time handling without relying on
//! platform clocks. All time values are passed explicitly, enabling
//! deterministic simulation. One tick of simulated time is one second,
//! so both types count whole seconds.

use core::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// Simulated timestamp in seconds since the start of the run.
///
/// Wraps a u64 to keep points-in-time and spans from being mixed up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Zero timestamp (start of the simulation).
    pub const ZERO: Timestamp = Timestamp(0);

    /// Maximum timestamp.
    pub const MAX: Timestamp = Timestamp(u64::MAX);

    /// Create a timestamp from seconds.
    #[inline]
    pub const fn from_secs(secs: u64) -> Self {
        Timestamp(secs)
    }

    /// Get the timestamp as seconds.
    #[inline]
    pub const fn as_secs(self) -> u64 {
        self.0
    }

    /// Saturating subtraction of another timestamp, returning a duration.
    #[inline]
    pub const fn saturating_sub(self, other: Timestamp) -> Duration {
        Duration(self.0.saturating_sub(other.0))
    }

    /// Checked subtraction of a duration.
    #[inline]
    pub const fn checked_sub(self, duration: Duration) -> Option<Timestamp> {
        match self.0.checked_sub(duration.0) {
            Some(t) => Some(Timestamp(t)),
            None => None,
        }
    }

    /// Checked addition of a duration.
    #[inline]
    pub const fn checked_add(self, duration: Duration) -> Option<Timestamp> {
        match self.0.checked_add(duration.0) {
            Some(t) => Some(Timestamp(t)),
            None => None,
        }
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    #[inline]
    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0 + rhs.0)
    }
}

impl AddAssign<Duration> for Timestamp {
    #[inline]
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs.0;
    }
}

impl Sub for Timestamp {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Timestamp) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Timestamp;

    #[inline]
    fn sub(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0 - rhs.0)
    }
}

/// Duration in seconds.
///
/// Represents a time span, not a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(u64);

impl Duration {
    /// Zero duration.
    pub const ZERO: Duration = Duration(0);

    /// Maximum duration.
    pub const MAX: Duration = Duration(u64::MAX);

    /// Create a duration from seconds.
    #[inline]
    pub const fn from_secs(secs: u64) -> Self {
        Duration(secs)
    }

    /// Create a duration from hours.
    #[inline]
    pub const fn from_hours(hours: u64) -> Self {
        Duration(hours.saturating_mul(3600))
    }

    /// Create a duration from days.
    #[inline]
    pub const fn from_days(days: u64) -> Self {
        Duration(days.saturating_mul(24 * 3600))
    }

    /// Get the duration as seconds.
    #[inline]
    pub const fn as_secs(self) -> u64 {
        self.0
    }

    /// Saturating addition.
    #[inline]
    pub const fn saturating_add(self, other: Duration) -> Self {
        Duration(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction.
    #[inline]
    pub const fn saturating_sub(self, other: Duration) -> Self {
        Duration(self.0.saturating_sub(other.0))
    }

    /// Saturating multiplication.
    #[inline]
    pub const fn saturating_mul(self, n: u64) -> Self {
        Duration(self.0.saturating_mul(n))
    }
}

impl Add for Duration {
    type Output = Duration;

    #[inline]
    fn add(self, rhs: Duration) -> Duration {
        Duration(self.0 + rhs.0)
    }
}

impl AddAssign for Duration {
    #[inline]
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs.0;
    }
}

impl Sub for Duration {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Duration) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl SubAssign for Duration {
    #[inline]
    fn sub_assign(&mut self, rhs: Duration) {
        self.0 -= rhs.0;
    }
}

impl Mul<u64> for Duration {
    type Output = Duration;

    #[inline]
    fn mul(self, rhs: u64) -> Duration {
        Duration(self.0 * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_creation() {
        let t = Timestamp::from_secs(1500);
        assert_eq!(t.as_secs(), 1500);
        assert_eq!(Timestamp::ZERO.as_secs(), 0);
    }

    #[test]
    fn test_duration_creation() {
        assert_eq!(Duration::from_secs(90).as_secs(), 90);
        assert_eq!(Duration::from_hours(2).as_secs(), 7200);
        assert_eq!(Duration::from_days(1).as_secs(), 86400);
    }

    #[test]
    fn test_timestamp_arithmetic() {
        let t1 = Timestamp::from_secs(10);
        let d = Duration::from_secs(5);

        assert_eq!((t1 + d).as_secs(), 15);
        assert_eq!((Timestamp::from_secs(20) - t1).as_secs(), 10);
        assert_eq!((t1 - d).as_secs(), 5);
    }

    #[test]
    fn test_duration_arithmetic() {
        let d1 = Duration::from_secs(5);
        let d2 = Duration::from_secs(3);

        assert_eq!((d1 + d2).as_secs(), 8);
        assert_eq!((d1 - d2).as_secs(), 2);
        assert_eq!((d1 * 4).as_secs(), 20);
    }

    #[test]
    fn test_saturating_operations() {
        let t1 = Timestamp::from_secs(5);
        let t2 = Timestamp::from_secs(10);
        assert_eq!(t1.saturating_sub(t2), Duration::ZERO);
        assert_eq!(t2.saturating_sub(t1), Duration::from_secs(5));

        assert_eq!(Timestamp::MAX.checked_add(Duration::from_secs(1)), None);
        assert_eq!(Timestamp::ZERO.checked_sub(Duration::from_secs(1)), None);
    }

    #[test]
    fn test_ordering() {
        assert!(Timestamp::from_secs(5) < Timestamp::from_secs(10));
        assert!(Duration::from_secs(3) < Duration::from_secs(7));
    }
}

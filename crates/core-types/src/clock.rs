use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

/// Source of wall-clock time for every time-sensitive check.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

pub type SharedClock = Arc<dyn Clock>;

/// Upper bound for every configured window or TTL (one leap year).
pub const MAX_WINDOW_SECONDS: u64 = 366 * 24 * 60 * 60;

/// Seconds as a chrono duration, clamped to [`MAX_WINDOW_SECONDS`].
pub fn window_duration(seconds: u64) -> Duration {
    Duration::seconds(seconds.min(MAX_WINDOW_SECONDS) as i64)
}

/// `at + by`, saturating at the latest representable instant.
pub fn saturating_add(at: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    at.checked_add_signed(by).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// `at - by`, saturating at the earliest representable instant.
pub fn saturating_sub(at: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    at.checked_sub_signed(by).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Clones share the same instant.
#[derive(Clone, Debug)]
pub struct ManualClock {
    current: Arc<RwLock<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Arc::new(RwLock::new(start)),
        }
    }

    /// Starts at the given unix timestamp (seconds).
    pub fn at_unix(seconds: i64) -> Self {
        let start = DateTime::<Utc>::from_timestamp(seconds, 0).unwrap_or_else(Utc::now);
        Self::new(start)
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.current.write() = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.current.write();
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::at_unix(1_700_000_000);
        let other = clock.clone();
        clock.advance(Duration::seconds(30));
        assert_eq!(other.now().timestamp(), 1_700_000_030);
    }

    #[test]
    fn window_arithmetic_saturates_instead_of_panicking() {
        assert_eq!(window_duration(u64::MAX), Duration::seconds(MAX_WINDOW_SECONDS as i64));
        let now = ManualClock::at_unix(1_700_000_000).now();
        let far = Duration::days(100_000_000);
        assert_eq!(saturating_add(now, far), DateTime::<Utc>::MAX_UTC);
        assert_eq!(saturating_sub(now, far), DateTime::<Utc>::MIN_UTC);
        assert_eq!(saturating_add(now, Duration::seconds(5)).timestamp(), 1_700_000_005);
    }
}

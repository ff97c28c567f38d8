//! Wall-clock abstraction.
//!
//! Approval expiry and ledger timestamps read time through [`Clock`] so
//! tests can move time explicitly.

use chrono::{DateTime, TimeZone, Utc};

/// Source of the current time in whole seconds since the UNIX epoch.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;

    /// The current time as a UTC timestamp.
    fn now_utc(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.now(), 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Manually driven clock for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug, Default)]
pub struct ManualClock(std::sync::atomic::AtomicI64);

#[cfg(any(test, feature = "test-helpers"))]
impl ManualClock {
    #[must_use]
    pub fn at(epoch_secs: i64) -> Self {
        Self(std::sync::atomic::AtomicI64::new(epoch_secs))
    }

    pub fn set(&self, epoch_secs: i64) {
        self.0.store(epoch_secs, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.0.fetch_add(secs, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_moves_only_when_told() {
        let clock = ManualClock::at(100);
        assert_eq!(clock.now(), 100);
        clock.advance(11);
        assert_eq!(clock.now(), 111);
        clock.set(0);
        assert_eq!(clock.now(), 0);
    }

    #[test]
    fn now_utc_matches_seconds() {
        let clock = ManualClock::at(1_700_000_000);
        assert_eq!(clock.now_utc().timestamp(), 1_700_000_000);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now() > 1_577_836_800);
    }
}

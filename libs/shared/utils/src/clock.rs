use chrono::{DateTime, Utc};

/// Source of "now" for everything time-sensitive in the scheduling core:
/// same-day slot suppression, past-date checks and cache expiry all take the
/// clock as an explicit dependency so tests can pin it.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

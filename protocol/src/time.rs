//! Injectable clock.
//!
//! Every timestamp and default deadline in the bridge comes from a
//! [`TimeProvider`] handed to the assemblers at construction. Production
//! code uses [`SystemTimeProvider`]; tests pin time with
//! [`FixedTimeProvider`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

// ---------------------------------------------------------------------------
// TimeInstant
// ---------------------------------------------------------------------------

/// Ledger time: whole seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeInstant(u64);

impl TimeInstant {
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    /// `self + window`, saturating at `u64::MAX`.
    pub fn saturating_add(&self, window: Duration) -> Self {
        Self(self.0.saturating_add(window.as_secs()))
    }

    /// Seconds from `self` until `later`, or `None` if `later` is not after.
    pub fn until(&self, later: TimeInstant) -> Option<Duration> {
        later
            .0
            .checked_sub(self.0)
            .filter(|d| *d > 0)
            .map(Duration::from_secs)
    }

    pub fn to_le_bytes(&self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

impl Add<Duration> for TimeInstant {
    type Output = TimeInstant;

    fn add(self, rhs: Duration) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl From<DateTime<Utc>> for TimeInstant {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp().max(0) as u64)
    }
}

impl fmt::Display for TimeInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match DateTime::<Utc>::from_timestamp(self.0 as i64, 0) {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "{}s", self.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// Source of the current ledger time. Read-only and shareable.
pub trait TimeProvider: Send + Sync {
    fn current_time(&self) -> TimeInstant;
}

/// Wall clock, clamped so it never reports an earlier instant than it
/// already has.
#[derive(Debug, Default)]
pub struct SystemTimeProvider {
    last: AtomicU64,
}

impl SystemTimeProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimeProvider for SystemTimeProvider {
    fn current_time(&self) -> TimeInstant {
        let now = TimeInstant::from(Utc::now()).as_secs();
        let prev = self.last.fetch_max(now, Ordering::AcqRel);
        TimeInstant(prev.max(now))
    }
}

/// Always reports the same instant. For tests and replay.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeProvider(TimeInstant);

impl FixedTimeProvider {
    pub fn new(at: TimeInstant) -> Self {
        Self(at)
    }

    pub fn at_secs(secs: u64) -> Self {
        Self(TimeInstant::from_secs(secs))
    }
}

impl TimeProvider for FixedTimeProvider {
    fn current_time(&self) -> TimeInstant {
        self.0
    }
}

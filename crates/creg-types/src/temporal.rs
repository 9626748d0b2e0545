use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Issuance instant: wall-clock milliseconds since the UNIX epoch.
///
/// Set exactly once when a certificate is created and never changed. The
/// millisecond granularity is part of the identifier contract: two issuances
/// for the same student and course inside the same millisecond derive the
/// same identifier and the second is rejected by the ledger.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IssuedAt(u64);

impl IssuedAt {
    /// Create an instant from explicit epoch milliseconds.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// The current wall-clock instant.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self(millis)
    }

    /// Epoch milliseconds.
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// RFC 3339 rendering in UTC with millisecond precision.
    ///
    /// Falls back to the raw millisecond count for instants chrono cannot
    /// represent.
    pub fn to_rfc3339(&self) -> String {
        i64::try_from(self.0)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_else(|| format!("{}ms", self.0))
    }
}

impl fmt::Debug for IssuedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IssuedAt({}ms)", self.0)
    }
}

impl fmt::Display for IssuedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> IssuedAt;
}

/// Wall-clock [`Clock`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> IssuedAt {
        IssuedAt::now()
    }
}

/// A [`Clock`] that only moves when told to. Used to pin issuance instants
/// in tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    millis: AtomicU64,
}

impl FixedClock {
    pub fn new(at: IssuedAt) -> Self {
        Self {
            millis: AtomicU64::new(at.as_millis()),
        }
    }

    /// Move the clock to an explicit instant.
    pub fn set(&self, at: IssuedAt) {
        self.millis.store(at.as_millis(), Ordering::SeqCst);
    }

    /// Move the clock forward by `millis`.
    pub fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> IssuedAt {
        IssuedAt::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

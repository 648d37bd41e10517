//! Wall-clock sources for audit stamping and token lifetimes.
//!
//! # Invariants
//! - All timestamps are Unix epoch milliseconds.
//! - `SystemClock` reports wall-clock time unmodified; ordering of
//!   successive `update_time` values is enforced by the account store.
//!
//! # See also
//! - `crate::repo::account_repo::SqliteAccountStore`

use std::time::{SystemTime, UNIX_EPOCH};

/// Unix epoch milliseconds.
pub type Timestamp = i64;

/// Source of the current time used by the audit interceptor.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> Timestamp;
}

/// Process wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> Timestamp {
        epoch_millis()
    }
}

/// Current system time in epoch milliseconds; `0` if the clock is before 1970.
pub fn epoch_millis() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

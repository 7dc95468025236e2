//! Identifier and clock providers injected into the entry store.
//!
//! # Responsibility
//! - Supply fresh entry ids with negligible collision probability.
//! - Supply wall-clock timestamps in Unix epoch milliseconds.
//!
//! # Invariants
//! - Providers are `Send + Sync` so one store can serve many threads.
//! - Strict cross-machine monotonicity is not required of `Clock`.

use crate::model::entry::EntryId;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of fresh entry identifiers.
pub trait IdProvider: Send + Sync {
    fn next_id(&self) -> EntryId;
}

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    /// Current time in Unix epoch milliseconds.
    fn now_ms(&self) -> i64;
}

/// Random v4 UUID identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdProvider;

impl IdProvider for UuidIdProvider {
    fn next_id(&self) -> EntryId {
        EntryId::new_v4()
    }
}

/// System wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX),
            // Clock set before 1970; report the epoch rather than fail.
            Err(_) => 0,
        }
    }
}

impl<T: IdProvider + ?Sized> IdProvider for &T {
    fn next_id(&self) -> EntryId {
        (**self).next_id()
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_provider_yields_distinct_ids() {
        let ids = UuidIdProvider;
        assert_ne!(ids.next_id(), ids.next_id());
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }
}

//! Monotonic clock used for election cooldowns and timeouts. Kept separate from `ledger_core::context::Clock`, which
//! only needs wall-clock `unix_time()` for the sideband -- elections never
//! want wall-clock time, since it can jump backwards under NTP correction
//! and would make the vote cooldown unsound.
//!
//! Exposed as milliseconds since an arbitrary epoch, not `std::time::
//! Instant`, so a test double can fast-forward it deterministically
//! without the unsafe construction `Instant` would otherwise require.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub trait MonotonicClock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Real clock, backed by `std::time::Instant`.
pub struct SystemClock {
    epoch: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self { epoch: Instant::now() }
    }
}

impl MonotonicClock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

/// A clock the test controls directly, for exercising the vote cooldown
/// and election expiry without sleeping.
pub struct ManualClock(AtomicU64);

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self(AtomicU64::new(start_ms))
    }

    pub fn advance(&self, delta_ms: u64) {
        self.0.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl MonotonicClock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

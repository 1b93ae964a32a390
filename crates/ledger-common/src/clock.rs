//! Wall-clock [`ledger_core::context::Clock`] for production wiring. Tests
//! reach for `ledger_test_utils::FixedClock` instead; this is the one
//! `ledgerd` actually constructs.

use ledger_core::context::Clock;

#[derive(Default)]
pub struct WallClock;

impl WallClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for WallClock {
    fn unix_time(&self) -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_time_is_plausible() {
        let now = WallClock::new().unix_time();
        assert!(now > 1_700_000_000);
    }
}

use super::Backoff;

/// Delay grows by `multiplier / multiplier_base` each retry, e.g.
/// `multiplier = 15, multiplier_base = 10` is a 1.5x backoff.
pub struct ExponentialBackoff {
    base_delay_ms: u64,
    multiplier: u64,
    multiplier_base: u64,
}

impl ExponentialBackoff {
    pub fn new(base_delay_ms: u64, multiplier: u64, multiplier_base: u64) -> Self {
        assert!(multiplier_base != 0);
        Self { base_delay_ms, multiplier, multiplier_base }
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self { base_delay_ms: 200, multiplier: 15, multiplier_base: 10 }
    }
}

impl Backoff for ExponentialBackoff {
    fn base_delay_ms(&self) -> u64 {
        self.base_delay_ms
    }

    fn next_delay_ms(&self, curr_delay_ms: u64) -> u64 {
        curr_delay_ms * self.multiplier / self.multiplier_base
    }
}

//! Generic retry-with-backoff helper, used by the block processor and the
//! storage backends for transient failures (lock contention, a store handle
//! mid-compaction) that are worth a few attempts before giving up.

use std::thread::sleep;
use std::time::Duration;

use tracing::{error, warn};

pub mod policies;

pub use policies::ExponentialBackoff;

pub trait Backoff {
    fn base_delay_ms(&self) -> u64;
    fn next_delay_ms(&self, curr_delay_ms: u64) -> u64;
}

/// Retries `operation` up to `max_retries` times, sleeping for a delay
/// computed by `backoff` between attempts. Logs a warning per failed
/// attempt and an error once retries are exhausted.
pub fn retry_with_backoff<R, E, F>(name: &str, max_retries: u16, backoff: &impl Backoff, operation: F) -> Result<R, E>
where
    F: FnMut() -> Result<R, E>,
    E: std::fmt::Debug,
{
    retry_with_backoff_inner(name, max_retries, backoff, operation, sleep)
}

fn retry_with_backoff_inner<R, E, F, S>(
    name: &str,
    max_retries: u16,
    backoff: &impl Backoff,
    mut operation: F,
    mut sleep_fn: S,
) -> Result<R, E>
where
    F: FnMut() -> Result<R, E>,
    E: std::fmt::Debug,
    S: FnMut(Duration),
{
    let mut delay = backoff.base_delay_ms();

    for attempt in 0..=max_retries {
        match operation() {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_retries => {
                warn!("attempt {} failed with {:?} while running {}, retrying in {}ms", attempt + 1, err, name, delay);
                sleep_fn(Duration::from_millis(delay));
                delay = backoff.next_delay_ms(delay);
            }
            Err(err) => {
                error!("max retries exceeded while running {}", name);
                return Err(err);
            }
        }
    }

    unreachable!()
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    struct CountingBackoff;

    impl Backoff for CountingBackoff {
        fn base_delay_ms(&self) -> u64 {
            1
        }

        fn next_delay_ms(&self, curr_delay_ms: u64) -> u64 {
            curr_delay_ms * 2
        }
    }

    #[test]
    fn succeeds_without_retry() {
        let result: Result<u32, &str> = retry_with_backoff("noop", 3, &CountingBackoff, || Ok(7));
        assert_eq!(result, Ok(7));
    }

    #[test]
    fn retries_then_succeeds() {
        let attempts = Cell::new(0);
        let result: Result<u32, &str> = retry_with_backoff_inner(
            "flaky",
            3,
            &CountingBackoff,
            || {
                let n = attempts.get() + 1;
                attempts.set(n);
                if n < 3 {
                    Err("not yet")
                } else {
                    Ok(n)
                }
            },
            |_| {},
        );
        assert_eq!(result, Ok(3));
    }

    #[test]
    fn gives_up_after_max_retries() {
        let result: Result<u32, &str> = retry_with_backoff_inner("always_fails", 2, &CountingBackoff, || Err("nope"), |_| {});
        assert_eq!(result, Err("nope"));
    }
}

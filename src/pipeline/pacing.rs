use std::time::Duration;

/// Blocking wait used between fan-out groups and commit retries
#[cfg_attr(test, mockall::automock)]
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the calling thread
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Wait before retry number `retry` (0-based): `base * multiplier^retry`
pub fn backoff_delay(base: Duration, multiplier: u32, retry: u32) -> Duration {
    let factor = multiplier.saturating_pow(retry);
    base.saturating_mul(factor)
}

//! Bounded exponential backoff with jitter around a single fetch unit.
//!
//! A unit is one page of one source for one ticker. When retries run out the
//! last error goes back to the caller, which drops that unit and moves on;
//! nothing here is ever fatal to a run.

use super::error::FetchError;
use rand::Rng;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Re-tries after the first attempt. Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay before re-try `attempt` (1-based):
    /// `base × 2^(attempt−1) × (1 + jitter)`, with `jitter` in `[0, 1)`.
    pub fn backoff(&self, attempt: u32, jitter: f64) -> Duration {
        let exponent = attempt.saturating_sub(1).min(30) as i32;
        let scale = 2f64.powi(exponent) * (1.0 + jitter.clamp(0.0, 1.0));
        self.base_delay.mul_f64(scale)
    }

    /// Run `op` under this policy, sleeping on the current thread between tries.
    pub fn run<T>(
        &self,
        unit: &str,
        op: impl FnMut() -> Result<T, FetchError>,
    ) -> Result<T, FetchError> {
        self.run_with(unit, &mut rand::thread_rng(), std::thread::sleep, op)
    }

    /// Same as `run` with the jitter source and the sleeper supplied.
    pub fn run_with<T, R: Rng + ?Sized>(
        &self,
        unit: &str,
        rng: &mut R,
        mut sleep: impl FnMut(Duration),
        mut op: impl FnMut() -> Result<T, FetchError>,
    ) -> Result<T, FetchError> {
        let mut attempt = 0u32;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.max_attempts() {
                        warn!(unit, attempts = attempt, error = %e, "retries exhausted, skipping unit");
                        return Err(e);
                    }
                    let delay = self.backoff(attempt, rng.gen::<f64>());
                    warn!(
                        unit,
                        attempt,
                        delay_secs = delay.as_secs_f64(),
                        error = %e,
                        "transient failure, backing off"
                    );
                    sleep(delay);
                }
            }
        }
    }
}

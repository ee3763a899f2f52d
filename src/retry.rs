//! Shared retry/backoff policy for remote gateways
//!
//! Both remote gateways (embeddings, completions) are wrapped in the
//! same policy object instead of carrying their own retry loops.

use std::time::Duration;

use anyhow::{Context, Result};

use crate::cancel::{is_cancellation, CancelToken};

/// Default classifier: every failure is worth retrying except an abort
fn default_retryable(err: &anyhow::Error) -> bool {
    !is_cancellation(err)
}

/// Retrying-call policy: ceiling, base delay, retryable classifier
///
/// The ceiling counts total attempts, so `max_attempts = 4` means one
/// initial call plus three retries. Delays double per attempt from
/// `base_delay` with a small random jitter on top.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    retryable: fn(&anyhow::Error) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(4, Duration::from_millis(500))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            retryable: default_retryable,
        }
    }

    /// Replace the retryable classifier (default retries everything
    /// except cancellation)
    pub fn with_retryable(mut self, retryable: fn(&anyhow::Error) -> bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Run `op` under this policy
    ///
    /// The token is checked before every attempt, so a fired token
    /// stops the sequence without issuing another remote call. On
    /// exhaustion the last error propagates with `label` and the
    /// attempt count attached; there is deliberately no fallback value.
    pub fn run<T, F>(&self, cancel: &CancelToken, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            cancel
                .check()
                .with_context(|| format!("{label} aborted before attempt {attempt}"))?;

            match op() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= self.max_attempts || !(self.retryable)(&err) {
                        return Err(
                            err.context(format!("{label}: giving up after {attempt} attempt(s)"))
                        );
                    }
                    std::thread::sleep(self.delay_before(attempt + 1));
                }
            }
        }
    }

    /// Backoff before the given (1-based) attempt number
    fn delay_before(&self, attempt: u32) -> Duration {
        // attempt 2 waits base_delay, attempt 3 double that, and so on
        let exponent = attempt.saturating_sub(2).min(10);
        let backoff = self.base_delay.saturating_mul(1u32 << exponent);
        backoff + backoff.mul_f64(fastrand::f64() * 0.1)
    }
}

//! Retry policy shared by the outbound publisher and the inbound consumer.
//!
//! A policy allows `max_retries` retries after the first attempt, so an
//! operation runs at most `max_retries + 1` times. The delay before retry `n`
//! (1-based) is either fixed or doubles from the base delay up to a cap.

use crate::error::AnalyzerResult;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Delay strategy between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every retry
    Fixed,
    /// Base delay doubled per retry, capped at `max_delay`
    Exponential { max_delay: Duration },
}

/// Explicit retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    delay: Duration,
    backoff: Backoff,
}

/// Result of a retried operation together with the attempts it took
#[derive(Debug)]
pub struct Attempted<T> {
    pub result: AnalyzerResult<T>,
    pub attempts: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration, backoff: Backoff) -> Self {
        Self {
            max_retries,
            delay,
            backoff,
        }
    }

    /// Single attempt, no retries
    pub fn no_retry() -> Self {
        Self::new(0, Duration::ZERO, Backoff::Fixed)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential { max_delay } => {
                let factor = 2u32.saturating_pow(retry.saturating_sub(1));
                self.delay.saturating_mul(factor).min(max_delay)
            }
        }
    }

    /// Run `op` until it succeeds or the policy is exhausted.
    ///
    /// `op` receives the 1-based attempt number. On exhaustion the last error
    /// is returned unchanged.
    pub async fn run<T, F, Fut>(&self, operation: &str, key: &str, mut op: F) -> Attempted<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = AnalyzerResult<T>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match op(attempt).await {
                Ok(value) => {
                    return Attempted {
                        result: Ok(value),
                        attempts: attempt,
                    }
                }
                Err(e) => {
                    if attempt > self.max_retries {
                        return Attempted {
                            result: Err(e),
                            attempts: attempt,
                        };
                    }

                    let delay = self.delay_for(attempt);
                    warn!(
                        operation,
                        key,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts(),
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying after failure"
                    );

                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }
}

// src/progress/retry.rs

use std::{fmt, future::Future, time::Duration};

/// Bounded exponential backoff for operations that are safe to repeat.
///
/// Attempt `n` (1-based) that fails with a retryable error is followed by a
/// wait of `base_delay * multiplier^(n - 1)`. With the defaults the waits are
/// 2s, 4s and 8s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            multiplier: 2,
        }
    }
}

/// Terminal outcome of a retried operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error.
    Exhausted { attempts: u32, last: E },
    /// A non-retryable error stopped the loop.
    Aborted(E),
}

impl<E> RetryError<E> {
    /// The underlying error, whichever way the loop ended.
    pub fn inner(&self) -> &E {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::Aborted(e) => e,
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Exhausted { attempts, last } => {
                write!(f, "gave up after {} attempts: {}", attempts, last)
            }
            RetryError::Aborted(e) => write!(f, "{}", e),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for RetryError<E> {}

impl RetryPolicy {
    /// Wait applied after the given failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self
            .multiplier
            .saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    /// Sum of every backoff wait when all attempts fail.
    pub fn total_backoff(&self) -> Duration {
        (1..=self.max_attempts)
            .map(|attempt| self.delay_for(attempt))
            .fold(Duration::ZERO, |acc, d| acc.saturating_add(d))
    }

    /// Runs `op` until it succeeds, fails with an error `is_retryable`
    /// rejects, or `max_attempts` is reached.
    pub async fn run<T, E, F, Fut, P>(&self, mut op: F, is_retryable: P) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !is_retryable(&err) {
                return Err(RetryError::Aborted(err));
            }

            let delay = self.delay_for(attempt);
            tracing::warn!(
                "Attempt {}/{} failed: {}. Backing off {:?}",
                attempt,
                max_attempts,
                err,
                delay
            );
            tokio::time::sleep(delay).await;

            if attempt >= max_attempts {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: err,
                });
            }
        }
    }
}

//! Bounded retry for model calls.
//!
//! Only the *value* decides whether to try again; an `Err` from the operation
//! is returned immediately.

use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

#[derive(Debug, PartialEq, Eq)]
pub enum RetryOutcome<T> {
    /// The predicate accepted a value.
    Accepted { value: T, attempts: u32 },
    /// Every attempt produced a value the predicate rejected; the last one is kept.
    Exhausted { last: T, attempts: u32 },
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `op` until `should_retry` returns false or the attempt budget is spent.
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut, P>(&self, mut op: F, should_retry: P) -> Result<RetryOutcome<T>, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&T) -> bool,
    {
        let mut attempt = 1;
        loop {
            let value = op(attempt).await?;

            if !should_retry(&value) {
                return Ok(RetryOutcome::Accepted {
                    value,
                    attempts: attempt,
                });
            }

            if attempt >= self.max_attempts {
                return Ok(RetryOutcome::Exhausted {
                    last: value,
                    attempts: attempt,
                });
            }

            tracing::warn!(
                "attempt {}/{} rejected, retrying",
                attempt,
                self.max_attempts
            );
            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_ATTEMPTS)
    }
}

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// How a failed attempt should be treated by [`with_retry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// The service asked us to slow down; wait the long delay
    RateLimited,
    /// Timeout or connection failure; wait the short delay
    Transient,
    /// Retrying cannot help
    Fatal,
}

/// Errors that know whether another attempt is worth making
pub trait Classify {
    fn retry_class(&self) -> RetryClass;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub transient_delay: Duration,
    pub rate_limit_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            transient_delay: Duration::from_secs(1),
            rate_limit_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt, or None when the failure is final
    pub fn delay_for(&self, class: RetryClass) -> Option<Duration> {
        match class {
            RetryClass::RateLimited => Some(self.rate_limit_delay),
            RetryClass::Transient => Some(self.transient_delay),
            RetryClass::Fatal => None,
        }
    }

    /// Same policy limited to one attempt, used by availability checks
    pub fn single_attempt(&self) -> Self {
        Self {
            max_attempts: 1,
            ..self.clone()
        }
    }
}

/// Why [`with_retry`] gave up
#[derive(Debug, PartialEq, Eq)]
pub enum RetryError<E> {
    /// A non-retryable failure, returned as-is
    Fatal(E),
    /// Every attempt failed with a retryable error; `last` is the final one
    Exhausted { attempts: u32, last: E },
}

/// Run `operation` until it succeeds, fails fatally, or runs out of attempts.
///
/// The delay is slept here, between attempts, so anything the operation
/// acquires at its start (such as a quota token) is never held while waiting.
/// The closure receives the 1-based attempt number.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    E: Classify + Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let err = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let Some(delay) = policy.delay_for(err.retry_class()) else {
            return Err(RetryError::Fatal(err));
        };

        if attempt >= max_attempts {
            tracing::error!(
                operation = operation_name,
                attempts = attempt,
                error = %err,
                "Retry budget exhausted"
            );
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last: err,
            });
        }

        tracing::warn!(
            operation = operation_name,
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Retryable failure, backing off"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

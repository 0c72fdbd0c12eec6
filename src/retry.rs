//! Fixed-interval retry of a fallible operation
//!
//! The operation classifies its own failures: transient errors are slept on
//! and retried up to a bound, fatal errors propagate immediately without
//! consuming a retry. Each retry is logged with the error text and the
//! attempt count so the operator can see the pipeline waiting.

use colored::Colorize;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Interval between attempts
const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Retries beyond the first attempt
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Errors that know whether a retry can plausibly succeed
pub trait Transient {
    /// True when the failure category is worth retrying
    fn is_transient(&self) -> bool;
}

/// Terminal failure of a retried operation
#[derive(Debug)]
pub enum RetryFailure<E> {
    /// A non-retriable failure, propagated on the attempt that produced it
    Fatal(E),

    /// The retry budget ran out; carries the last transient error
    Exhausted { attempts: u32, last: E },
}

impl<E> RetryFailure<E> {
    /// The underlying error, whichever way the retry ended
    pub fn into_inner(self) -> E {
        match self {
            RetryFailure::Fatal(e) => e,
            RetryFailure::Exhausted { last, .. } => last,
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryFailure::Fatal(e) => write!(f, "{}", e),
            RetryFailure::Exhausted { attempts, last } => {
                write!(f, "retry budget exhausted after {} attempts: {}", attempts, last)
            }
        }
    }
}

impl<E: fmt::Display + fmt::Debug> std::error::Error for RetryFailure<E> {}

/// Retry policy: a bounded number of fixed-interval retries
#[derive(Debug, Clone)]
pub struct Retrier {
    max_retries: u32,
    interval: Duration,
}

impl Retrier {
    /// Creates a retrier with the default policy (3 retries, 10s apart)
    pub fn new() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            interval: DEFAULT_INTERVAL,
        }
    }

    /// Overrides the retry count
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Overrides the interval between attempts
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Runs the operation until it succeeds, fails fatally, or the retry
    /// budget is exhausted.
    pub async fn run<T, E, F, Fut>(
        &self,
        label: &str,
        mut operation: F,
    ) -> Result<T, RetryFailure<E>>
    where
        E: Transient + fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let total_attempts = self.max_retries + 1;

        for attempt in 1..=total_attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(RetryFailure::Fatal(e)),
                Err(e) => {
                    if attempt == total_attempts {
                        return Err(RetryFailure::Exhausted {
                            attempts: total_attempts,
                            last: e,
                        });
                    }
                    eprintln!(
                        "{} {}: {} Retry {} of {}.",
                        "warning:".yellow().bold(),
                        label,
                        e,
                        attempt,
                        self.max_retries
                    );
                    tokio::time::sleep(self.interval).await;
                }
            }
        }

        unreachable!("loop returns on every path")
    }
}

impl Default for Retrier {
    fn default() -> Self {
        Self::new()
    }
}

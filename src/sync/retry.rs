//! Bounded, fixed-delay retry policy for AnkiConnect requests.
//!
//! AnkiConnect is a single local process, so there is no exponential backoff
//! or jitter: a request is tried up to `max_attempts` times with a delay
//! between attempts. The delay is a function of the attempt number so tests
//! can plug in [`RetryPolicy::immediate`] and never sleep.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

type DelayFn = dyn Fn(u32) -> Duration + Send + Sync;

/// How often and how patiently to retry a request.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Arc<DelayFn>,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

    /// `max_attempts` tries, waiting `delay` after each failed one.
    /// At least one attempt is always made.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self::with_delay_fn(max_attempts, move |_| delay)
    }

    /// No waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::fixed(max_attempts, Duration::ZERO)
    }

    /// Custom delay; `f` receives the 1-based number of the attempt that
    /// just failed.
    pub fn with_delay_fn<F>(max_attempts: u32, f: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        Self {
            max_attempts: max_attempts.max(1),
            delay: Arc::new(f),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait after failed attempt `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        (self.delay)(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_DELAY)
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("first_delay", &self.delay_after(1))
            .finish()
    }
}

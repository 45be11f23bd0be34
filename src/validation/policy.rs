//! Bounded polling.
//!
//! [`RetryPolicy`] is the one bounded-wait primitive in the pipeline: a poll
//! interval plus an attempt budget, configured per run rather than hard-coded
//! at call sites. [`poll_until`] drives any async attempt under a policy
//! while staying responsive to the run-wide interrupt.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;

use crate::interrupt::Interrupt;

/// Poll interval and attempt budget for a bounded wait.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use observa_install::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.interval, Duration::from_secs(5));
/// assert_eq!(policy.max_attempts, 60);
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay between attempts.
    pub interval: Duration,
    /// Maximum number of attempts before giving up.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        // 60 attempts at 5s gives telemetry five minutes to land.
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
        }
    }
}

/// Why a bounded poll stopped without producing a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    /// Every attempt in the budget came back empty.
    #[error("gave up after {attempts} attempts")]
    Exhausted {
        /// How many attempts were made.
        attempts: u32,
    },
    /// The run-wide interrupt fired mid-poll.
    #[error("poll interrupted")]
    Interrupted,
}

/// Run `attempt` under `policy` until it yields a value.
///
/// The attempt closure receives the 1-based attempt number and returns
/// `Some(value)` once the awaited condition holds. Sleeps between attempts
/// race against the interrupt so cancellation unwinds promptly.
pub async fn poll_until<T, F, Fut>(
    policy: &RetryPolicy,
    interrupt: &Interrupt,
    mut attempt: F,
) -> Result<T, PollError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for n in 1..=policy.max_attempts {
        if interrupt.is_triggered() {
            return Err(PollError::Interrupted);
        }

        if let Some(value) = attempt(n).await {
            return Ok(value);
        }

        if n < policy.max_attempts {
            tokio::select! {
                _ = sleep(policy.interval) => {}
                _ = interrupt.cancelled() => return Err(PollError::Interrupted),
            }
        }
    }

    Err(PollError::Exhausted {
        attempts: policy.max_attempts,
    })
}

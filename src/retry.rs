//! Bounded retry for values that show up late.
//!
//! Thumbnails are rendered lazily, so an image element can exist before its
//! `src` is filled in. [`RetryPolicy::until_some`] keeps asking until it gets
//! a value, a fixed number of times, with a fixed pause between attempts.
//!
//! # Retry Strategy
//!
//! - 3 attempts by default
//! - 1 second between attempts, no pause after the last one
//! - Errors from an attempt are logged and count as an empty attempt; the
//!   most recent one is handed back if the attempts run out

use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, warn};

/// How many times to ask, and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Tagged result of a retried lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempted<T, E> {
    Resolved { value: T, attempts: u32 },
    /// `last_error` is the most recent failed attempt, `None` if every
    /// attempt came back empty.
    Exhausted { attempts: u32, last_error: Option<E> },
}

impl RetryPolicy {
    /// Run `attempt` until it yields `Ok(Some(_))` or the attempts run out.
    ///
    /// The closure receives the 1-based attempt number. At least one attempt
    /// is always made.
    pub async fn until_some<T, E, F, Fut>(&self, what: &str, mut attempt: F) -> Attempted<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let total_t0 = Instant::now();
        let mut last_error = None;

        for n in 1..=max_attempts {
            match attempt(n).await {
                Ok(Some(value)) => {
                    debug!(what, attempt = n, "Resolved");
                    return Attempted::Resolved { value, attempts: n };
                }
                Ok(None) => {
                    warn!(what, attempt = n, max = max_attempts, "Attempt came back empty");
                }
                Err(e) => {
                    warn!(what, attempt = n, max = max_attempts, error = %e, "Attempt failed");
                    last_error = Some(e);
                }
            }
            if n < max_attempts {
                sleep(self.delay).await;
            }
        }

        warn!(
            what,
            attempts = max_attempts,
            elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
            failed = last_error.is_some(),
            "Exhausted retries"
        );
        Attempted::Exhausted {
            attempts: max_attempts,
            last_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_resolves_on_first_value() {
        let calls = Cell::new(0);
        let outcome = instant_policy(3)
            .until_some("value", |_| {
                calls.set(calls.get() + 1);
                async { Ok::<_, String>(Some(7)) }
            })
            .await;
        assert_eq!(outcome, Attempted::Resolved { value: 7, attempts: 1 });
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_retries_through_empty_and_errors() {
        let outcome = instant_policy(3)
            .until_some("value", |n| async move {
                match n {
                    1 => Err("stale element".to_string()),
                    2 => Ok(None),
                    _ => Ok(Some("ready")),
                }
            })
            .await;
        assert_eq!(outcome, Attempted::Resolved { value: "ready", attempts: 3 });
    }

    #[tokio::test]
    async fn test_exhausts_after_max_attempts() {
        let calls = Cell::new(0);
        let outcome: Attempted<(), String> = instant_policy(3)
            .until_some("value", |_| {
                calls.set(calls.get() + 1);
                async { Ok::<_, String>(None) }
            })
            .await;
        assert_eq!(
            outcome,
            Attempted::Exhausted {
                attempts: 3,
                last_error: None
            }
        );
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let outcome = instant_policy(0)
            .until_some("value", |_| async { Ok::<_, String>(Some(1)) })
            .await;
        assert_eq!(outcome, Attempted::Resolved { value: 1, attempts: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_between_attempts_only() {
        let policy = RetryPolicy::default();
        let t0 = tokio::time::Instant::now();
        let outcome: Attempted<(), String> = policy
            .until_some("value", |_| async { Ok::<_, String>(None) })
            .await;
        assert_eq!(
            outcome,
            Attempted::Exhausted {
                attempts: 3,
                last_error: None
            }
        );
        let waited = t0.elapsed();
        assert!(waited >= Duration::from_secs(2) && waited < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_exhausted_keeps_most_recent_error() {
        let outcome: Attempted<(), String> = instant_policy(3)
            .until_some("value", |n| async move {
                match n {
                    1 => Err("session lost".to_string()),
                    2 => Err("stale element".to_string()),
                    _ => Ok(None),
                }
            })
            .await;
        assert_eq!(
            outcome,
            Attempted::Exhausted {
                attempts: 3,
                last_error: Some("stale element".to_string())
            }
        );
    }
}

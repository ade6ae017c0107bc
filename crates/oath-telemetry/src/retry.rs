//! # Backoff for Uptime Reads
//!
//! A read runs inside one executor's consensus budget, and an executor
//! that misses the budget counts as a failed node. [`RetryPolicy::within`]
//! sizes the retries so the total backoff stays under half of that budget.
//!
//! Only transport errors are retried. A status or a body the API actually
//! sent is final, since every executor would see the same answer again.

use std::future::Future;
use std::time::Duration;

/// Upper bound on retries after the first attempt.
pub const MAX_RETRIES: u32 = 3;

const BASE_DELAY: Duration = Duration::from_millis(100);

/// How often a failed read is re-sent and how long to wait in between.
///
/// Delays double from `base_delay`: 100 ms, 200 ms, 400 ms by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Re-sends after the first attempt.
    pub retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            base_delay: BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Send once and never retry.
    pub const NONE: Self = Self {
        retries: 0,
        base_delay: Duration::ZERO,
    };

    /// The most retries (up to [`MAX_RETRIES`]) whose summed backoff fits in
    /// half of `budget`. A budget too small for one delay yields no retries.
    pub fn within(budget: Duration) -> Self {
        let allowance = budget / 2;
        let mut policy = Self {
            retries: 0,
            base_delay: BASE_DELAY,
        };
        while policy.retries < MAX_RETRIES {
            let next = Self {
                retries: policy.retries + 1,
                ..policy
            };
            if next.total_backoff() > allowance {
                break;
            }
            policy = next;
        }
        policy
    }

    /// Wait before re-send number `attempt + 1`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Time spent sleeping when every attempt fails.
    pub fn total_backoff(&self) -> Duration {
        (0..self.retries).fold(Duration::ZERO, |acc, attempt| acc.saturating_add(self.delay(attempt)))
    }

    /// Issue `f` until it yields a response or the retries run out.
    ///
    /// `f` must build a fresh request on every call.
    pub(crate) async fn send<F, Fut>(&self, f: F) -> Result<reqwest::Response, reqwest::Error>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        let mut attempt = 0;
        loop {
            match f().await {
                Ok(resp) => return Ok(resp),
                Err(e) if attempt < self.retries => {
                    let delay = self.delay(attempt);
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        retries = self.retries,
                        ?delay,
                        error = %e,
                        "uptime read failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn delays_double_from_base() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(2), Duration::from_millis(400));
        assert_eq!(policy.total_backoff(), Duration::from_millis(300));
        assert!(policy.delay(u32::MAX) > policy.delay(3));
    }

    #[test]
    fn budget_bounds_the_retries() {
        assert_eq!(RetryPolicy::within(Duration::from_secs(10)).retries, MAX_RETRIES);
        // 500 ms allowance: 100 + 200 fits, 100 + 200 + 400 does not.
        assert_eq!(RetryPolicy::within(Duration::from_secs(1)).retries, 2);
        assert_eq!(RetryPolicy::within(Duration::from_millis(100)).retries, 0);
        assert_eq!(RetryPolicy::within(Duration::ZERO).retries, 0);
    }

    #[test]
    fn budgeted_backoff_stays_under_half_the_budget() {
        for ms in [0u64, 150, 300, 999, 1_400, 5_000, 60_000] {
            let budget = Duration::from_millis(ms);
            assert!(RetryPolicy::within(budget).total_backoff() <= budget / 2, "budget {ms} ms");
        }
    }

    #[tokio::test]
    async fn refused_connection_is_sent_retries_plus_one_times() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy {
            retries: 2,
            base_delay: Duration::from_millis(1),
        };
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();

        let result = policy
            .send(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                http.get("http://127.0.0.1:1/").send()
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn no_retry_policy_sends_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let http = reqwest::Client::new();

        let result = RetryPolicy::NONE
            .send(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                http.get("http://127.0.0.1:1/").send()
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

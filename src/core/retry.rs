//! Exponential-backoff retry shared by every call that can be throttled.

use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// 第 n 次重試前的等待時間：base * 2^n，上限 max_delay
    pub fn delay_for(&self, retry_index: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry_index);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

/// Runs `request` until it succeeds, fails with a non-retryable error, or
/// the policy is exhausted. `on_retry` sees the retry number (1-based) and
/// the delay before it is slept.
pub async fn retry_with_backoff<T, E, F, Fut, D, N>(
    policy: &RetryPolicy,
    mut request: F,
    is_retryable: D,
    mut on_retry: N,
) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    D: Fn(&E) -> bool,
    N: FnMut(u32, Duration, &E),
{
    let mut attempts = 0;

    loop {
        attempts += 1;
        match request(attempts).await {
            Ok(value) => {
                return RetryOutcome {
                    result: Ok(value),
                    attempts,
                }
            }
            Err(err) => {
                let retries_used = attempts - 1;
                if !is_retryable(&err) || retries_used >= policy.max_retries {
                    return RetryOutcome {
                        result: Err(err),
                        attempts,
                    };
                }

                let delay = policy.delay_for(retries_used);
                on_retry(retries_used + 1, delay, &err);
                tokio::time::sleep(delay).await;
            }
        }
    }
}

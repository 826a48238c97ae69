use std::time::Duration;
use tokio::time::sleep;

// ============================================================================
// Exponential Backoff Retry
// ============================================================================
//
// Retries a fallible async operation with exponentially growing delays.
// Used by the notification dispatcher, where a flaky delivery channel is
// expected and a couple of retries are cheaper than a lost message.
//
// ============================================================================

#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound the delay never grows past.
    pub max_delay: Duration,
    /// Backoff multiplier applied after each failed attempt.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

/// Terminal outcome of a retried operation.
#[derive(Debug)]
pub enum RetryResult<T, E> {
    Success(T),
    /// Every attempt failed; carries the last error.
    Failed(E),
}

/// Run `operation` until it succeeds or the attempt budget is spent. The
/// closure receives the 1-based attempt number.
pub async fn retry_with_backoff<F, Fut, T, E>(
    config: RetryConfig,
    mut operation: F,
) -> RetryResult<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut delay = config.initial_delay;

    for attempt in 1..=config.max_attempts {
        match operation(attempt).await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempt = attempt, "Operation succeeded after retry");
                }
                return RetryResult::Success(result);
            }
            Err(error) if attempt == config.max_attempts => {
                tracing::error!(
                    attempt = attempt,
                    error = %error,
                    "Operation failed after all retries"
                );
                return RetryResult::Failed(error);
            }
            Err(error) => {
                tracing::warn!(
                    attempt = attempt,
                    error = %error,
                    delay_ms = delay.as_millis(),
                    "Operation failed, retrying after delay"
                );
                sleep(delay).await;
                delay = Duration::from_millis(
                    ((delay.as_millis() as f64) * config.multiplier) as u64,
                )
                .min(config.max_delay);
            }
        }
    }

    unreachable!("max_attempts is at least 1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn quick_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(50),
            multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_succeeds_on_a_later_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = retry_with_backoff(quick_config(3), |_attempt| {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("channel unavailable")
                } else {
                    Ok("delivered")
                }
            }
        })
        .await;

        assert!(matches!(result, RetryResult::Success("delivered")));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_budget() {
        let result = retry_with_backoff(quick_config(2), |_attempt| async {
            Err::<(), _>("still down")
        })
        .await;

        assert!(matches!(result, RetryResult::Failed(_)));
    }
}

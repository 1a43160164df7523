//! Bounded fixed-interval polling.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Poll `probe` until it yields a value or the attempt budget runs out.
///
/// Probe errors are swallowed and counted as "not ready yet"; the loop
/// keeps running until the budget is exhausted. Total wall-clock wait is
/// bounded by `interval * max_attempts` plus individual call latency.
pub async fn poll_until<T, E, F, Fut>(interval: Duration, max_attempts: u32, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
    E: std::fmt::Display,
{
    for attempt in 1..=max_attempts {
        match probe().await {
            Ok(Some(value)) => return Some(value),
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(attempt, error = %e, "Poll probe failed, treating as not ready");
            }
        }
        sleep(interval).await;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn returns_value_on_first_success() {
        let result: Option<u8> =
            poll_until(Duration::from_secs(2), 30, || async { Ok::<_, Infallible>(Some(7)) }).await;
        assert_eq!(result, Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_attempt_budget() {
        let attempts = AtomicU32::new(0);
        let result: Option<()> = poll_until(Duration::from_secs(2), 30, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, Infallible>(None) }
        })
        .await;
        assert_eq!(result, None);
        assert_eq!(attempts.load(Ordering::SeqCst), 30);
    }

    #[tokio::test(start_paused = true)]
    async fn errors_count_as_not_ready() {
        let attempts = AtomicU32::new(0);
        let result: Option<()> = poll_until(Duration::from_millis(10), 5, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err("connection refused") }
        })
        .await;
        assert_eq!(result, None);
        assert_eq!(attempts.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_midway() {
        let attempts = AtomicU32::new(0);
        let result = poll_until(Duration::from_secs(2), 30, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n == 3 {
                    Ok::<_, Infallible>(Some(n))
                } else {
                    Ok(None)
                }
            }
        })
        .await;
        assert_eq!(result, Some(3));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}

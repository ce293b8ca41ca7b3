//! Resilience Manager — retry, circuit breaker, and composition helpers
//! (`with_resilience`, `race`, `parallel`).

mod circuit_breaker;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use retry::{default_retry_condition, retry, retry_default, RetryConfig};

use crate::error::{Error, Result};
use futures::future::join_all;
use std::future::Future;
use std::time::Duration;

/// Wrap `operation` with a circuit breaker gate (if `cb_config` is
/// given), then with retry (if `retry_config` is given).
pub async fn with_resilience<F, Fut, T>(
    breaker: &CircuitBreaker,
    name: &str,
    cb_config: Option<CircuitBreakerConfig>,
    retry_config: Option<RetryConfig>,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match (cb_config, retry_config) {
        (Some(cb_config), Some(retry_config)) => {
            retry::retry_default(&retry_config, move || {
                let cb_config = cb_config.clone();
                let op = &mut operation;
                breaker.call(name, cb_config, move || (op)())
            })
            .await
        }
        (Some(cb_config), None) => breaker.call(name, cb_config, operation).await,
        (None, Some(retry_config)) => retry::retry_default(&retry_config, operation).await,
        (None, None) => operation().await,
    }
}

/// Race `fut` against a `timeout` duration.
pub async fn race<Fut, T>(fut: Fut, timeout: Duration) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(timeout, "race".to_string())),
    }
}

/// Run every future in `futs` concurrently. When `continue_on_error` is
/// true, returns a result per future (errors included); otherwise fails
/// at the first error encountered (in completion order, not input order).
pub async fn parallel<Fut, T>(futs: Vec<Fut>, continue_on_error: bool) -> Result<Vec<Result<T>>>
where
    Fut: Future<Output = Result<T>>,
{
    let results = join_all(futs).await;
    if !continue_on_error {
        if let Some(Err(_)) = results.iter().find(|r| r.is_err()) {
            for result in results {
                result?;
            }
            unreachable!("loop above returns on the first error");
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn race_times_out() {
        let fut = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, Error>(())
        };
        let result = race(fut, Duration::from_millis(5)).await;
        assert!(matches!(result, Err(Error::Timeout(..))));
    }

    #[tokio::test]
    async fn parallel_continue_on_error_collects_all_results() {
        let futs: Vec<_> = vec![
            Box::pin(async { Ok::<_, Error>(1) }) as std::pin::Pin<Box<dyn Future<Output = Result<i32>>>>,
            Box::pin(async { Err(Error::Internal("boom".into())) }),
        ];
        let results = parallel(futs, true).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[tokio::test]
    async fn parallel_fails_fast_without_continue_on_error() {
        let futs: Vec<_> = vec![
            Box::pin(async { Ok::<_, Error>(1) }) as std::pin::Pin<Box<dyn Future<Output = Result<i32>>>>,
            Box::pin(async { Err(Error::Internal("boom".into())) }),
        ];
        let result = parallel(futs, false).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn with_resilience_retries_then_succeeds() {
        let breaker = CircuitBreaker::new();
        let retry_config = RetryConfig { max_attempts: 3, base_delay: Duration::from_millis(1), ..Default::default() };
        let calls = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
        let calls2 = calls.clone();

        let result: Result<u32> = with_resilience(&breaker, "gate", None, Some(retry_config), move || {
            let calls = calls2.clone();
            async move {
                let n = calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                if n < 1 {
                    Err(Error::Tool("ECONNRESET".into()))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
    }
}

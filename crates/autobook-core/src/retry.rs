//! Deadlines and bounded retry for outbound calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use autobook_contracts::{
    error::{AutobookError, AutobookResult},
    limits::RunLimits,
};

/// Run `call` under `deadline`, retrying transient failures.
///
/// Expiry becomes `AutobookError::Timeout`. Transient errors are retried up
/// to `limits.max_attempts` total attempts, sleeping `retry_backoff * n`
/// before attempt `n + 1`. The last error is returned unchanged.
pub async fn call_with_deadline<T, F, Fut>(
    operation: &str,
    deadline: Duration,
    limits: &RunLimits,
    call: F,
) -> AutobookResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AutobookResult<T>>,
{
    call_with_deadline_while(operation, deadline, limits, || true, call).await
}

/// Like `call_with_deadline`, but a failed attempt is only retried while
/// `may_retry` returns true.
///
/// Streaming callers pass a check on their token sink: once an attempt has
/// put output in front of the client, its failure is final.
pub async fn call_with_deadline_while<T, F, Fut, R>(
    operation: &str,
    deadline: Duration,
    limits: &RunLimits,
    may_retry: R,
    mut call: F,
) -> AutobookResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AutobookResult<T>>,
    R: Fn() -> bool,
{
    let attempts = limits.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let result = match tokio::time::timeout(deadline, call()).await {
            Ok(result) => result,
            Err(_) => Err(AutobookError::Timeout {
                operation: operation.to_string(),
                after_ms: deadline.as_millis() as u64,
            }),
        };

        match result {
            Err(e) if e.is_transient() && attempt < attempts => {
                if !may_retry() {
                    warn!(operation, attempt, error = %e, "transient failure is final: retry refused");
                    return Err(e);
                }
                warn!(operation, attempt, error = %e, "retrying after transient failure");
                tokio::time::sleep(limits.retry_backoff() * attempt).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use autobook_contracts::{
        error::{AutobookError, ErrorKind},
        limits::RunLimits,
    };

    use super::{call_with_deadline, call_with_deadline_while};

    fn limits(max_attempts: u32) -> RunLimits {
        RunLimits { max_attempts, retry_backoff_ms: 1, ..RunLimits::default() }
    }

    #[tokio::test]
    async fn expiry_is_a_timeout() {
        let result: Result<(), _> = call_with_deadline("oracle", Duration::from_millis(10), &limits(1), || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        match result {
            Err(AutobookError::Timeout { operation, after_ms }) => {
                assert_eq!(operation, "oracle");
                assert_eq!(after_ms, 10);
            }
            other => panic!("expected Timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn transient_failures_are_retried_up_to_the_bound() {
        let calls = Arc::new(Mutex::new(0u32));
        let counter = calls.clone();
        let result: Result<String, _> = call_with_deadline("retrieval", Duration::from_secs(1), &limits(3), || {
            let counter = counter.clone();
            async move {
                let mut n = counter.lock().unwrap();
                *n += 1;
                if *n < 3 {
                    Err(AutobookError::RetrievalUnavailable { reason: "flaky".to_string() })
                } else {
                    Ok("found".to_string())
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "found");
        assert_eq!(*calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn repeated_failure_is_surfaced() {
        let calls = Arc::new(Mutex::new(0u32));
        let counter = calls.clone();
        let result: Result<(), _> = call_with_deadline("oracle", Duration::from_secs(1), &limits(2), || {
            let counter = counter.clone();
            async move {
                *counter.lock().unwrap() += 1;
                Err(AutobookError::OracleUnavailable { reason: "down".to_string() })
            }
        })
        .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::OracleUnavailable);
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn non_transient_errors_are_not_retried() {
        let calls = Arc::new(Mutex::new(0u32));
        let counter = calls.clone();
        let result: Result<(), _> = call_with_deadline("tool", Duration::from_secs(1), &limits(5), || {
            let counter = counter.clone();
            async move {
                *counter.lock().unwrap() += 1;
                Err(AutobookError::StateViolation { reason: "bug".to_string() })
            }
        })
        .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::StateViolation);
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn refused_retry_returns_the_first_failure() {
        let calls = Arc::new(Mutex::new(0u32));
        let counter = calls.clone();
        let result: Result<(), _> =
            call_with_deadline_while("oracle", Duration::from_secs(1), &limits(3), || false, || {
                let counter = counter.clone();
                async move {
                    *counter.lock().unwrap() += 1;
                    Err(AutobookError::OracleUnavailable { reason: "dropped mid-stream".to_string() })
                }
            })
            .await;

        match result {
            Err(AutobookError::OracleUnavailable { reason }) => assert_eq!(reason, "dropped mid-stream"),
            other => panic!("expected OracleUnavailable, got {:?}", other),
        }
        assert_eq!(*calls.lock().unwrap(), 1);
    }
}

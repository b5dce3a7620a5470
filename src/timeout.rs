//! Deadline racing for backend calls.
//!
//! The operation runs as its own task. If the deadline wins, the task is
//! detached rather than aborted: it keeps running and its result is dropped.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::Error;
use crate::Result;

/// Race `operation` against `timeout`.
///
/// Fails with [`Error::Timeout`] when the deadline fires first. The timer is
/// dropped as soon as the operation completes.
pub async fn with_timeout<F, T>(operation: F, timeout: Duration) -> Result<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::spawn(operation);

    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(Error::Other(format!("Provider task failed: {join_err}"))),
        Err(_) => {
            let ms = timeout.as_millis() as u64;
            warn!("Backend call exceeded {}ms deadline, detaching", ms);
            Err(Error::Timeout(ms))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_fast_operation_wins() {
        let value = with_timeout(async { Ok(42) }, Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_error_passes_through() {
        let result: Result<()> = with_timeout(
            async { Err(Error::InvalidResponse("empty".into())) },
            Duration::from_millis(50),
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_never_resolving_operation_times_out() {
        let start = Instant::now();
        let result: Result<()> =
            with_timeout(std::future::pending(), Duration::from_millis(50)).await;

        assert!(matches!(result, Err(Error::Timeout(50))));
        assert!(start.elapsed() < Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_loser_is_detached_not_cancelled() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        let result = with_timeout(
            async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                flag.store(true, Ordering::SeqCst);
                Ok(())
            },
            Duration::from_millis(20),
        )
        .await;
        tokio_test::assert_err!(result);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(finished.load(Ordering::SeqCst));
    }
}

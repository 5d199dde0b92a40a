use std::future::Future;

use tracing::warn;

/// Attempts for an idempotent read before the failure is surfaced.
const MAX_READ_RETRIES: u32 = 2;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Only store failures are eligible for automatic retry, and only on
    /// reads. `NotFound`/`InvalidArgument` go back to the caller as-is and
    /// writes are never retried (a repeated write could duplicate a
    /// notification or rating).
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::StoreUnavailable(_))
    }
}

/// Runs an idempotent read, retrying a bounded number of times if the store
/// reports itself unavailable.
pub async fn retry_read<T, F, Fut>(mut op: F) -> CoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CoreResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(e) if e.is_retryable() && attempt < MAX_READ_RETRIES => {
                attempt += 1;
                warn!("store unavailable, retrying read (attempt {})", attempt);
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retry_read_retries_store_failures_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = retry_read(|| async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(CoreError::StoreUnavailable("lock timed out".into()))
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn retry_read_does_not_retry_not_found() {
        let calls = AtomicU32::new(0);
        let result: CoreResult<()> = retry_read(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(CoreError::NotFound("book"))
        })
        .await;
        assert_eq!(result, Err(CoreError::NotFound("book")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retry_read_gives_up_after_bounded_attempts() {
        let calls = AtomicU32::new(0);
        let result: CoreResult<()> = retry_read(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(CoreError::StoreUnavailable("still down".into()))
        })
        .await;
        assert!(matches!(result, Err(CoreError::StoreUnavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1 + MAX_READ_RETRIES);
    }
}

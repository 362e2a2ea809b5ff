//! Cooperative cancellation for storage calls.
//!
//! Every storage operation receives a [`CancellationToken`]. Engines wrap
//! their I/O in [`cancellable`] so a triggered token drops the in-flight
//! future and surfaces [`StoreError::Cancelled`] instead of a data result.

use std::future::Future;

pub use tokio_util::sync::CancellationToken;

use crate::error::{Result, StoreError};

/// Run `operation` until it completes or `cancel` fires.
///
/// A token that is already cancelled short-circuits without polling the
/// operation at all.
pub async fn cancellable<F, T>(cancel: &CancellationToken, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if cancel.is_cancelled() {
        return Err(StoreError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StoreError::Cancelled),
        result = operation => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_completes_when_not_cancelled() {
        let cancel = CancellationToken::new();
        let value = cancellable(&cancel, async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_skips_operation() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: Result<()> = cancellable(&cancel, async {
            panic!("operation must not be polled");
        })
        .await;

        assert!(matches!(result, Err(StoreError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancel_aborts_pending_operation() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let result: Result<()> = cancellable(&cancel, async {
            std::future::pending::<()>().await;
            Ok(())
        })
        .await;

        assert!(result.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_operation_error_passes_through() {
        let cancel = CancellationToken::new();
        let result: Result<()> = cancellable(&cancel, async {
            Err(StoreError::DatabaseError("connection reset".to_string()))
        })
        .await;

        assert!(matches!(result, Err(StoreError::DatabaseError(_))));
    }
}

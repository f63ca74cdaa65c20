//! Timeout and cancellation helpers for suspension points.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::AideError;

/// Wrap a future with a timeout.
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, AideError>>,
) -> Result<T, AideError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(AideError::Timeout(duration.as_millis() as u64)),
    }
}

/// Run a future under both a timeout and a cancellation token.
///
/// Cancellation wins if both fire in the same poll.
pub async fn run_bounded<T>(
    duration: Duration,
    cancel: &CancellationToken,
    label: &str,
    future: impl Future<Output = Result<T, AideError>>,
) -> Result<T, AideError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AideError::Cancelled(label.to_string())),
        result = with_timeout(duration, future) => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn times_out_slow_future() {
        let cancel = CancellationToken::new();
        let result: Result<(), _> = run_bounded(Duration::from_millis(50), &cancel, "tool", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(AideError::Timeout(50))));
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result: Result<u8, _> =
            run_bounded(Duration::from_secs(5), &cancel, "model call", async { Ok(1) }).await;
        assert!(matches!(result, Err(AideError::Cancelled(label)) if label == "model call"));
    }
}

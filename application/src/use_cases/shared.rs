//! Shared utilities for use cases.
//!
//! Cancellation checking and cancellable awaiting used between and during
//! workflow stages.

use crate::use_cases::run_chat::RunChatError;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Check if cancellation has been requested.
///
/// Returns `Err(RunChatError::Cancelled)` if the token exists and is cancelled.
pub(crate) fn check_cancelled(token: &Option<CancellationToken>) -> Result<(), RunChatError> {
    if let Some(token) = token
        && token.is_cancelled()
    {
        return Err(RunChatError::Cancelled);
    }
    Ok(())
}

/// Await `fut`, abandoning it as soon as the token is cancelled.
pub(crate) async fn cancellable<F: Future>(
    token: &Option<CancellationToken>,
    fut: F,
) -> Result<F::Output, RunChatError> {
    match token {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(RunChatError::Cancelled),
            output = fut => Ok(output),
        },
        None => Ok(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_check_cancelled() {
        assert!(check_cancelled(&None).is_ok());

        let token = CancellationToken::new();
        assert!(check_cancelled(&Some(token.clone())).is_ok());
        token.cancel();
        assert!(matches!(
            check_cancelled(&Some(token)),
            Err(RunChatError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn test_cancellable_aborts_pending_future() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let result = cancellable(&Some(token), async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            42
        })
        .await;
        assert!(matches!(result, Err(RunChatError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancellable_without_token() {
        let result = cancellable(&None, async { 7 }).await;
        assert_eq!(result.unwrap(), 7);
    }
}

//! Bounded execution of external calls.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use ensemble_core::{EnsembleError, Result};

/// Run `future` with a deadline, giving up early if `cancel` fires.
///
/// A timeout becomes [`EnsembleError::Timeout`] and cancellation becomes
/// [`EnsembleError::Cancelled`], both naming `operation`. Cancellation wins
/// when both are ready.
pub async fn bounded<T, F>(
    operation: &str,
    limit: Duration,
    cancel: &CancellationToken,
    future: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(EnsembleError::cancelled(operation)),
        outcome = tokio::time::timeout(limit, future) => match outcome {
            Ok(result) => result,
            Err(_) => Err(EnsembleError::timeout(operation)),
        },
    }
}

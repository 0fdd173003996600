//! Per-request deadlines

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// The wrapped operation did not finish in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation exceeded its {0:?} deadline")]
pub struct DeadlineExceeded(pub Duration);

/// Run `fut` with a deadline.
///
/// The inner future is dropped on expiry, so in-flight database or HTTP
/// calls are cancelled rather than left running.
pub async fn with_deadline<F, T>(deadline: Duration, fut: F) -> Result<T, DeadlineExceeded>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(deadline, fut)
        .await
        .map_err(|_| {
            tracing::warn!(deadline_ms = deadline.as_millis() as u64, "Request deadline exceeded");
            DeadlineExceeded(deadline)
        })
}

//! Deadline wrapper for remote operations

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::error::{ClientError, Result};

/// Run a fallible remote operation under a deadline.
///
/// The inner future is dropped when the deadline elapses, which cancels the
/// in-flight call.
pub async fn with_deadline<F, T>(duration: Duration, operation: &str, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(ClientError::Timeout {
            message: format!("{operation} after {}ms", duration.as_millis()),
        }),
    }
}

use std::time::Duration;

use thiserror::Error;
use tokio::{task, time};

#[derive(Debug, Error)]
pub enum DeadlineError {
    #[error("operation did not finish within {0:?}")]
    Elapsed(Duration),
    #[error("blocking task failed: {0}")]
    Join(String),
}

/// Runs blocking `work` off the async runtime, giving up after `limit` when one is set.
///
/// A timed-out task is abandoned, not cancelled; it may still complete in the background.
pub async fn run_blocking<T, F>(limit: Option<Duration>, work: F) -> Result<T, DeadlineError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let handle = task::spawn_blocking(work);
    let joined = match limit {
        Some(limit) => time::timeout(limit, handle)
            .await
            .map_err(|_| DeadlineError::Elapsed(limit))?,
        None => handle.await,
    };
    joined.map_err(|err| DeadlineError::Join(err.to_string()))
}

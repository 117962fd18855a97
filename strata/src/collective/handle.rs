use crate::error::{Result, StrataError};
use std::future::Future;
use tokio::task::JoinHandle;

/// A handle to a non-blocking exchange running in the background.
///
/// Call `wait()` to block until it completes and take its output, or
/// `is_finished()` to poll. Dropping the handle without waiting aborts
/// the background task.
pub struct PendingExchange<T> {
    inner: Option<JoinHandle<Result<T>>>,
}

impl<T: Send + 'static> PendingExchange<T> {
    pub(crate) fn spawn(fut: impl Future<Output = Result<T>> + Send + 'static) -> Self {
        Self {
            inner: Some(tokio::spawn(fut)),
        }
    }

    /// Wait for the exchange to complete and propagate any error.
    pub async fn wait(mut self) -> Result<T> {
        let handle = self.inner.take().ok_or(StrataError::Cancelled)?;
        match handle.await {
            Ok(res) => res,
            Err(e) if e.is_cancelled() => Err(StrataError::Cancelled),
            Err(e) => Err(StrataError::transport_with_source(
                "exchange task panicked",
                e,
            )),
        }
    }

    /// Check if the exchange has finished (non-blocking).
    pub fn is_finished(&self) -> bool {
        self.inner.as_ref().is_none_or(|h| h.is_finished())
    }
}

impl<T> Drop for PendingExchange<T> {
    fn drop(&mut self) {
        if let Some(handle) = &self.inner {
            handle.abort();
        }
    }
}

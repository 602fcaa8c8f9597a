//! Completion signal of an optimistic mutation.

use std::future::Future;

use tokio::task::JoinHandle;

use crate::error::{Result, SyncError};

/// Handle returned once the optimistic write is visible in the cache.
///
/// The remote call runs on its own task. Awaiting [`Settlement::settled`]
/// reports how it ended; dropping the handle leaves the call running.
#[derive(Debug)]
pub enum Settlement<T> {
    /// Precondition not met (no persisted id, no category); nothing happened.
    Skipped,
    /// Settled without a network round trip.
    Done(Result<T>),
    /// Remote call in flight.
    Pending(JoinHandle<Result<T>>),
}

impl<T: Send + 'static> Settlement<T> {
    pub(crate) fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        Self::Pending(tokio::spawn(future))
    }
}

impl<T> Settlement<T> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// Wait for the remote call.
    ///
    /// `Ok(None)` for a skipped mutation, `Ok(Some(_))` once confirmed, and
    /// the gateway error after the local state was rolled back.
    pub async fn settled(self) -> Result<Option<T>> {
        match self {
            Self::Skipped => Ok(None),
            Self::Done(result) => result.map(Some),
            Self::Pending(handle) => match handle.await {
                Ok(result) => result.map(Some),
                Err(e) => Err(SyncError::Aborted(e.to_string())),
            },
        }
    }
}

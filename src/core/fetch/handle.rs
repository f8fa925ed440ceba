//! One-shot fetch handles.

use super::CancellationToken;
use crate::core::library::MediaId;
use crate::error::FetchError;
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

/// Pending result of a single fetch
///
/// Delivers exactly one success or one failure. Once [`cancel`](Self::cancel)
/// has returned, the handle only ever reports [`FetchError::Cancelled`].
/// Dropping the handle cancels the request.
pub struct FetchHandle<T> {
    id: MediaId,
    receiver: Receiver<Result<T, FetchError>>,
    token: CancellationToken,
}

impl<T> FetchHandle<T> {
    pub(crate) fn new(
        id: MediaId,
        receiver: Receiver<Result<T, FetchError>>,
        token: CancellationToken,
    ) -> Self {
        Self {
            id,
            receiver,
            token,
        }
    }

    pub fn id(&self) -> MediaId {
        self.id
    }

    /// Block until the result arrives
    pub fn wait(self) -> Result<T, FetchError> {
        if self.token.is_cancelled() {
            return Err(FetchError::Cancelled { id: self.id });
        }
        match self.receiver.recv() {
            Ok(result) => self.settle(result),
            Err(_) => Err(self.disconnected()),
        }
    }

    /// Block for at most `timeout`; `None` if nothing arrived in time
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<T, FetchError>> {
        if self.token.is_cancelled() {
            return Some(Err(FetchError::Cancelled { id: self.id }));
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => Some(self.settle(result)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(self.disconnected())),
        }
    }

    /// The result, if it is already available
    pub fn try_result(&self) -> Option<Result<T, FetchError>> {
        if self.token.is_cancelled() {
            return Some(Err(FetchError::Cancelled { id: self.id }));
        }
        match self.receiver.try_recv() {
            Ok(result) => Some(self.settle(result)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(self.disconnected())),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn settle(&self, result: Result<T, FetchError>) -> Result<T, FetchError> {
        if self.token.is_cancelled() {
            Err(FetchError::Cancelled { id: self.id })
        } else {
            result
        }
    }

    fn disconnected(&self) -> FetchError {
        if self.token.is_cancelled() {
            FetchError::Cancelled { id: self.id }
        } else {
            FetchError::Interrupted { id: self.id }
        }
    }
}

impl<T> Drop for FetchHandle<T> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

//! Preview-then-original cascades.

use super::CancellationToken;
use crate::core::library::{MediaId, Tier};
use crate::error::FetchError;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Progress of an opportunistic fetch
///
/// ```text
/// Idle -> PreviewPending -> PreviewDelivered -> OriginalPending -> Done
///              |                                     |
///              +--> Failed                  Failed <-+
/// ```
/// `Cancelled` is reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchState {
    Idle,
    PreviewPending,
    PreviewDelivered,
    OriginalPending,
    Done,
    Failed,
    Cancelled,
}

impl FetchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchState::Done | FetchState::Failed | FetchState::Cancelled)
    }
}

/// One tiered result of a cascade
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery<T> {
    pub tier: Tier,
    pub value: T,
}

/// Shared state between the worker and the consumer
pub(crate) type SharedState = Arc<Mutex<FetchState>>;

pub(crate) fn lock_state(state: &Mutex<FetchState>) -> MutexGuard<'_, FetchState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Subscription to a preview-then-original fetch
///
/// Yields at most two items: the preview, then the original. A failed
/// preview is the only item and ends the cascade. After
/// [`cancel`](Self::cancel) returns, no stage that was still running is
/// delivered; stages that had already completed are. Dropping the
/// subscription cancels it.
pub struct OpportunisticFetch<T> {
    id: MediaId,
    receiver: Receiver<Result<Delivery<T>, FetchError>>,
    state: SharedState,
    token: CancellationToken,
}

impl<T> OpportunisticFetch<T> {
    pub(crate) fn new(
        id: MediaId,
        receiver: Receiver<Result<Delivery<T>, FetchError>>,
        state: SharedState,
        token: CancellationToken,
    ) -> Self {
        Self {
            id,
            receiver,
            state,
            token,
        }
    }

    pub fn id(&self) -> MediaId {
        self.id
    }

    pub fn state(&self) -> FetchState {
        *lock_state(&self.state)
    }

    /// Stop the cascade; a terminal state is left as it is
    pub fn cancel(&self) {
        let mut state = lock_state(&self.state);
        if !state.is_terminal() {
            *state = FetchState::Cancelled;
        }
        self.token.cancel();
    }

    /// Wait at most `timeout` for the next delivery
    ///
    /// `None` means either nothing arrived in time or the cascade is over;
    /// check [`state`](Self::state) to tell them apart. After a cancel,
    /// stages that completed before it are still handed out.
    pub fn next_timeout(&self, timeout: Duration) -> Option<Result<Delivery<T>, FetchError>> {
        if self.token.is_cancelled() {
            return self.completed_before_cancel();
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(delivery) => Some(delivery),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Deliveries are queued under the state lock, so whatever sits in the
    /// channel once the cascade is cancelled finished before the cancel.
    fn completed_before_cancel(&self) -> Option<Result<Delivery<T>, FetchError>> {
        self.receiver.try_recv().ok()
    }
}

impl<T> Iterator for OpportunisticFetch<T> {
    type Item = Result<Delivery<T>, FetchError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.token.is_cancelled() {
            return self.completed_before_cancel();
        }
        self.receiver.recv().ok()
    }
}

impl<T> Drop for OpportunisticFetch<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

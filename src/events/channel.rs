//! Event channel implementation using crossbeam-channel.
//!
//! Provides a thread-safe way to send events from the core library
//! to any UI layer. The channel is generic over the payload so the
//! same plumbing carries import progress, view change-sets and
//! status notifications.

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use super::Event;

/// Sends events from the core library.
///
/// This is a thin wrapper around crossbeam's Sender that can be
/// cloned and sent across threads.
pub struct EventSender<T = Event> {
    inner: Sender<T>,
}

impl<T> Clone for EventSender<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> EventSender<T> {
    /// Create a new EventSender from a raw crossbeam sender.
    pub fn new(sender: Sender<T>) -> Self {
        Self { inner: sender }
    }

    /// Send an event. Non-blocking if the channel isn't full.
    ///
    /// If the receiver is dropped, the event is silently discarded.
    /// This allows progress reporting to be optional.
    pub fn send(&self, event: T) {
        let _ = self.inner.send(event);
    }

    /// Send an event, reporting whether a receiver is still attached.
    ///
    /// Fan-out lists use this to prune subscribers that went away.
    pub fn try_send(&self, event: T) -> bool {
        self.inner.send(event).is_ok()
    }
}

/// Receives events from the core library.
///
/// Used by UI layers to subscribe to progress updates. Dropping the
/// receiver ends the subscription.
pub struct EventReceiver<T = Event> {
    inner: Receiver<T>,
}

impl<T> EventReceiver<T> {
    /// Block until the next event is received
    pub fn recv(&self) -> Option<T> {
        self.inner.recv().ok()
    }

    /// Block for at most `timeout` waiting for the next event
    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        match self.inner.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&self) -> Option<T> {
        self.inner.try_recv().ok()
    }

    /// Collect every event that is already queued, without blocking
    pub fn drain(&self) -> Vec<T> {
        self.inner.try_iter().collect()
    }

    /// Returns an iterator over received events
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.inner.iter()
    }
}

/// A bidirectional event channel for communication between
/// the core library and UI layers.
pub struct EventChannel;

impl EventChannel {
    /// Create a new unbounded event channel.
    ///
    /// Use this for most cases - events are small and fast.
    pub fn new<T>() -> (EventSender<T>, EventReceiver<T>) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }

    /// Create a bounded event channel with the specified capacity.
    ///
    /// Use this if you need backpressure (e.g., slow UI that can't
    /// keep up with events).
    pub fn bounded<T>(capacity: usize) -> (EventSender<T>, EventReceiver<T>) {
        let (sender, receiver) = bounded(capacity);
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        EventChannel
    }
}

/// A no-op event sender for when you don't need progress reporting.
///
/// This is useful for tests or when running without a UI.
pub fn null_sender<T>() -> EventSender<T> {
    let (sender, _receiver) = EventChannel::new();
    sender
}

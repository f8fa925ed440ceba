//! Publish/subscribe channel for status changes.

use super::StatusEvent;
use crate::core::library::{MediaId, MediaStatus};
use crate::events::{EventChannel, EventReceiver, EventSender};
use std::cell::RefCell;
use std::rc::Rc;

/// Broadcasts status changes to every live subscriber
///
/// Publishing and observing happen on the thread that performs the status
/// mutation, so the subscriber list needs no lock. Clones share the same
/// subscriber list. Subscribers whose receiver was dropped are pruned on
/// the next publish.
#[derive(Clone, Default)]
pub struct StatusEventBus {
    subscribers: Rc<RefCell<Vec<EventSender<StatusEvent>>>>,
}

/// Stream of status events, alive until dropped
pub struct StatusSubscription {
    receiver: EventReceiver<StatusEvent>,
}

impl StatusSubscription {
    /// Next queued event, without blocking
    pub fn try_next(&self) -> Option<StatusEvent> {
        self.receiver.try_recv()
    }

    /// Every queued event, oldest first
    pub fn drain(&self) -> Vec<StatusEvent> {
        self.receiver.drain()
    }
}

impl StatusEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> StatusSubscription {
        let (sender, receiver) = EventChannel::new();
        self.subscribers.borrow_mut().push(sender);
        StatusSubscription { receiver }
    }

    pub fn publish(&self, id: MediaId, status: MediaStatus) {
        let event = StatusEvent { id, status };
        self.subscribers
            .borrow_mut()
            .retain(|subscriber| subscriber.try_send(event));
    }

    /// Number of subscribers still attached after the last publish
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

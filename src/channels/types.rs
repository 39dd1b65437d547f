//! Wake-up handles and the events delivered through them.

use crate::types::Message;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Counter for generating waiter IDs.
static NEXT_WAITER_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a waiter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WaiterId(pub u64);

/// Event handed to a waiter when a channel it is registered on publishes.
#[derive(Clone, Debug)]
pub struct ChannelEvent {
    /// Name of the channel that published.
    pub channel: Arc<str>,
    /// The message that was published.
    pub message: Message,
}

/// A single-slot wake handle.
///
/// Register it on one or more channels with `Channel::subscribe`, then block
/// on `recv_timeout` outside any channel lock. A publish fills the slot and
/// drops the registration, so the waiter must be subscribed again to keep
/// waiting. While the slot is full, further publishes skip this waiter.
pub struct Waiter {
    pub id: WaiterId,
    sender: Sender<ChannelEvent>,
    receiver: Receiver<ChannelEvent>,
}

impl Waiter {
    pub fn new() -> Self {
        let id = WaiterId(NEXT_WAITER_ID.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = bounded(1);
        Self {
            id,
            sender,
            receiver,
        }
    }

    /// Sending half registered into a channel's waiter set.
    pub(crate) fn sender(&self) -> Sender<ChannelEvent> {
        self.sender.clone()
    }

    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<ChannelEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<ChannelEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> Result<ChannelEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Whether a wake is pending in the slot.
    pub fn is_signaled(&self) -> bool {
        !self.receiver.is_empty()
    }
}

impl Default for Waiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Etag;

    #[test]
    fn test_waiter_ids_are_unique() {
        let a = Waiter::new();
        let b = Waiter::new();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_single_slot() {
        let waiter = Waiter::new();
        let sender = waiter.sender();
        let event = ChannelEvent {
            channel: Arc::from("news"),
            message: Message::new(b"hi".to_vec(), Etag(1)),
        };

        assert!(sender.try_send(event.clone()).is_ok());
        assert!(waiter.is_signaled());
        assert!(matches!(
            sender.try_send(event),
            Err(crossbeam_channel::TrySendError::Full(_))
        ));

        let received = waiter.try_recv().unwrap();
        assert_eq!(&*received.channel, "news");
        assert!(!waiter.is_signaled());
    }
}

//! Fixed-capacity ring of messages.

use crate::error::{HubError, Result};
use crate::types::Message;

/// Ring buffer holding the newest `capacity` messages in publish order.
///
/// Index 0 is the oldest retained message, `len() - 1` the newest.
#[derive(Debug)]
pub struct CircularHistory {
    /// Backing slots. Grows up to `capacity`, then wraps.
    slots: Vec<Message>,

    /// Slot holding the oldest message once the ring has wrapped.
    start: usize,

    capacity: usize,

    /// Total messages ever pushed, evicted ones included.
    pushed: u64,
}

impl CircularHistory {
    /// Create an empty history. A capacity of 0 retains nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            start: 0,
            capacity,
            pushed: 0,
        }
    }

    /// Append a message, evicting the oldest when full.
    pub fn push(&mut self, message: Message) {
        self.pushed += 1;

        if self.capacity == 0 {
            return;
        }

        if self.slots.len() < self.capacity {
            self.slots.push(message);
        } else {
            self.slots[self.start] = message;
            self.start = (self.start + 1) % self.capacity;
        }
    }

    /// Number of retained messages.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total number of messages pushed over the ring's lifetime.
    pub fn total_pushed(&self) -> u64 {
        self.pushed
    }

    /// The `index`-th oldest retained message.
    pub fn ith(&self, index: usize) -> Result<&Message> {
        let len = self.slots.len();
        if index >= len {
            return Err(HubError::IndexOutOfRange { index, len });
        }
        Ok(&self.slots[(self.start + index) % len])
    }

    pub fn peek_oldest(&self) -> Result<&Message> {
        if self.is_empty() {
            return Err(HubError::Empty);
        }
        self.ith(0)
    }

    pub fn peek_newest(&self) -> Result<&Message> {
        if self.is_empty() {
            return Err(HubError::Empty);
        }
        self.ith(self.len() - 1)
    }

    /// Iterate retained messages from `start` to the newest.
    pub fn iter_from(&self, start: usize) -> impl Iterator<Item = &Message> + '_ {
        (start..self.len()).filter_map(move |i| self.ith(i).ok())
    }
}

//! A named channel: bounded history plus a set of waiters.

use crate::error::{HubError, Result};
use crate::history::CircularHistory;
use crate::poll::{ChannelBatch, PollResponse};
use crate::types::{ChannelConfig, ChannelInfo, ChannelSnapshot, Etag, Message};
use crossbeam_channel::{Sender, TrySendError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

use super::types::{ChannelEvent, Waiter, WaiterId};

/// State guarded by the channel lock.
struct ChannelState {
    /// Set by the first configuration. `None` means unconfigured.
    config: Option<ChannelConfig>,

    /// Present once configured.
    history: Option<CircularHistory>,

    /// Waiters to wake on the next publish.
    waiters: HashMap<WaiterId, Sender<ChannelEvent>>,

    /// Etag of the last publish, retained or not.
    last_etag: Etag,
}

impl ChannelState {
    /// Catch-up decision for `etag`. Returns the index to resume from.
    fn resume_index(&self, etag: Etag) -> Option<usize> {
        let history = self.history.as_ref()?;
        let oldest = history.peek_oldest().ok()?;

        // Position fell out of the window (or the caller has nothing):
        // replay everything retained.
        if oldest.created > etag {
            return Some(0);
        }

        // The newest message is skipped: matching it means nothing is new.
        let len = history.len();
        (0..len - 1)
            .find(|&i| history.ith(i).map(|m| m.created == etag).unwrap_or(false))
            .map(|i| i + 1)
    }

    fn newest_etag(&self) -> Etag {
        self.history
            .as_ref()
            .and_then(|h| h.peek_newest().ok())
            .map(|m| m.created)
            .unwrap_or(Etag::NONE)
    }

    fn collect_from(&self, start: usize) -> (Vec<Vec<u8>>, Etag) {
        let payloads = match self.history.as_ref() {
            Some(history) => history.iter_from(start).map(|m| m.payload.clone()).collect(),
            None => Vec::new(),
        };
        (payloads, self.newest_etag())
    }
}

/// A named topic with its own history and subscriber set.
///
/// Every operation takes the channel's own lock; channels never contend
/// with each other.
pub struct Channel {
    name: Arc<str>,

    /// Largest payload `publish` accepts.
    max_payload_bytes: Option<usize>,

    state: Mutex<ChannelState>,
}

impl Channel {
    /// Create an unconfigured channel.
    pub fn new(name: &str, max_payload_bytes: Option<usize>) -> Self {
        Self {
            name: Arc::from(name),
            max_payload_bytes,
            state: Mutex::new(ChannelState {
                config: None,
                history: None,
                waiters: HashMap::new(),
                last_etag: Etag::NONE,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply `config` if this is the first configuration.
    ///
    /// Returns true when the config was applied. Later calls are ignored.
    pub fn configure(&self, config: ChannelConfig) -> bool {
        let mut state = self.state.lock();
        if state.config.is_some() {
            trace!(channel = %self.name, "channel already configured; ignoring");
            return false;
        }

        debug!(
            channel = %self.name,
            capacity = config.capacity,
            retention_secs = config.retention.as_secs(),
            exclusive = config.exclusive,
            keyed = config.key.is_some(),
            "configured channel"
        );
        state.history = Some(CircularHistory::new(config.capacity));
        state.config = Some(config);
        true
    }

    pub fn is_configured(&self) -> bool {
        self.state.lock().config.is_some()
    }

    /// Configured capacity (0 while unconfigured).
    pub fn capacity(&self) -> usize {
        self.state
            .lock()
            .config
            .as_ref()
            .map(|c| c.capacity)
            .unwrap_or(0)
    }

    pub fn is_exclusive(&self) -> bool {
        self.state
            .lock()
            .config
            .as_ref()
            .map(|c| c.exclusive)
            .unwrap_or(false)
    }

    /// Number of retained messages.
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .history
            .as_ref()
            .map(|h| h.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of waiters registered for the next publish.
    pub fn waiter_count(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// Check `key` against the channel's key. Unkeyed channels admit anyone.
    pub fn authorize(&self, key: Option<&str>) -> Result<()> {
        let state = self.state.lock();
        match state.config.as_ref().and_then(|c| c.key.as_deref()) {
            Some(expected) if key != Some(expected) => {
                Err(HubError::AccessDenied(self.name.to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Describe the channel.
    pub fn info(&self) -> ChannelInfo {
        let state = self.state.lock();
        match state.config.as_ref() {
            Some(config) => ChannelInfo {
                name: self.name.to_string(),
                capacity: config.capacity,
                retention_secs: config.retention.as_secs(),
                key: config.key.clone(),
                exclusive: config.exclusive,
            },
            None => ChannelInfo {
                name: self.name.to_string(),
                capacity: 0,
                retention_secs: 0,
                key: None,
                exclusive: false,
            },
        }
    }

    // --- Publish ---

    /// Publish a payload and wake every registered waiter.
    ///
    /// Never blocks on subscribers: a waiter whose slot is still full is
    /// skipped. The waiter set is cleared either way. Returns the etag
    /// stamped on the message.
    pub fn publish(&self, payload: Vec<u8>) -> Result<Etag> {
        if let Some(max) = self.max_payload_bytes {
            if payload.len() > max {
                return Err(HubError::PayloadTooLarge {
                    size: payload.len(),
                    max,
                });
            }
        }

        let mut state = self.state.lock();

        let etag = Etag::after(state.last_etag);
        state.last_etag = etag;

        let message = Message::new(payload, etag);
        if let Some(history) = state.history.as_mut() {
            history.push(message.clone());
        }

        let event = ChannelEvent {
            channel: Arc::clone(&self.name),
            message,
        };

        let mut woken = 0usize;
        let mut skipped = 0usize;
        for (_, sender) in state.waiters.drain() {
            match sender.try_send(event.clone()) {
                Ok(()) => woken += 1,
                Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => skipped += 1,
            }
        }

        debug!(channel = %self.name, %etag, woken, skipped, "published");
        Ok(etag)
    }

    // --- Catch-up ---

    /// Decide whether a client holding `etag` has anything to read.
    ///
    /// Returns `(true, index)` with the index to collect from, or
    /// `(false, 0)` when the client is current.
    pub fn has_new_since(&self, etag: Etag) -> (bool, usize) {
        match self.state.lock().resume_index(etag) {
            Some(index) => (true, index),
            None => (false, 0),
        }
    }

    /// Every retained payload from `start` to the newest, plus the newest
    /// etag for the client's next poll.
    pub fn collect_from(&self, start: usize) -> (Vec<Vec<u8>>, Etag) {
        self.state.lock().collect_from(start)
    }

    /// Catch-up decision and collection under a single lock acquisition.
    pub fn collect_since(&self, etag: Etag) -> Option<ChannelBatch> {
        let state = self.state.lock();
        let start = state.resume_index(etag)?;
        let (payloads, etag) = state.collect_from(start);
        Some(ChannelBatch::new(etag, payloads))
    }

    /// Collect from `start` into a multi-channel response.
    pub fn append_to(&self, response: &mut PollResponse, start: usize) {
        let (payloads, etag) = self.collect_from(start);
        response.insert(self.name(), ChannelBatch::new(etag, payloads));
    }

    /// The newest etag, for clients that only want a position.
    pub fn snapshot(&self) -> Result<ChannelSnapshot> {
        let state = self.state.lock();
        let newest = state
            .history
            .as_ref()
            .ok_or(HubError::Empty)?
            .peek_newest()?;
        Ok(ChannelSnapshot {
            etag: newest.created,
        })
    }

    // --- Waiters ---

    /// Register `waiter` to be woken by the next publish.
    pub fn subscribe(&self, waiter: &Waiter) {
        self.state.lock().waiters.insert(waiter.id, waiter.sender());
    }

    /// Remove `waiter` from the set. No-op if it is not registered.
    pub fn unsubscribe(&self, waiter: &Waiter) {
        self.state.lock().waiters.remove(&waiter.id);
    }
}

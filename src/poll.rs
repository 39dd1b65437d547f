//! Long-poll driver and response envelope.
//!
//! A poll names one or more channels with the etag last seen on each. If any
//! of them has something newer, the poll returns at once. Otherwise one
//! waiter is registered on all of them and the caller blocks, outside every
//! channel lock, until a publish or the timeout.

use crate::channels::{Channel, ChannelRegistry, Waiter};
use crate::types::Etag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Payloads collected from one channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelBatch {
    /// Etag to send on the next poll.
    pub etag: Etag,
    /// Payloads, oldest first, rendered as UTF-8.
    pub payload: Vec<String>,
}

impl ChannelBatch {
    pub fn new(etag: Etag, payloads: Vec<Vec<u8>>) -> Self {
        let payload = payloads
            .into_iter()
            .map(|p| String::from_utf8_lossy(&p).into_owned())
            .collect();
        Self { etag, payload }
    }
}

/// Response to a poll across several channels.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollResponse {
    pub channels: BTreeMap<String, ChannelBatch>,
}

impl PollResponse {
    pub fn insert(&mut self, channel: &str, batch: ChannelBatch) {
        self.channels.insert(channel.to_string(), batch);
    }

    pub fn get(&self, channel: &str) -> Option<&ChannelBatch> {
        self.channels.get(channel)
    }

    /// True when no channel had anything new.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

/// Collect everything newer than each channel's etag. Returns true if any
/// channel contributed.
fn collect_new(channels: &[(Arc<Channel>, Etag)], response: &mut PollResponse) -> bool {
    let mut found = false;
    for (channel, etag) in channels {
        if let Some(batch) = channel.collect_since(*etag) {
            response.insert(channel.name(), batch);
            found = true;
        }
    }
    found
}

/// Poll `requests` (channel name, last seen etag), blocking up to `timeout`
/// for a publish when nothing is new. An empty response means the poll
/// timed out.
///
/// Unknown channels are created unconfigured so that a poll may start
/// before the first publish.
pub fn long_poll(
    registry: &ChannelRegistry,
    requests: &[(&str, Etag)],
    timeout: Duration,
) -> PollResponse {
    let channels: Vec<(Arc<Channel>, Etag)> = requests
        .iter()
        .map(|(name, etag)| (registry.get(name), *etag))
        .collect();

    let mut response = PollResponse::default();
    if collect_new(&channels, &mut response) {
        return response;
    }

    let waiter = Waiter::new();
    for (channel, _) in &channels {
        channel.subscribe(&waiter);
    }

    // A publish may have landed between the first check and subscribing.
    if !collect_new(&channels, &mut response) {
        match waiter.recv_timeout(timeout) {
            Ok(event) => {
                trace!(channel = %event.channel, etag = %event.message.created, "poll woken");
                collect_new(&channels, &mut response);
            }
            Err(_) => {
                debug!(channels = channels.len(), ?timeout, "poll timed out");
            }
        }
    }

    for (channel, _) in &channels {
        channel.unsubscribe(&waiter);
    }

    response
}

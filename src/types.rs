//! Core types for the channel hub.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Version token of a message: its publish time in nanoseconds since the
/// Unix epoch. `Etag(0)` means "nothing seen yet".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Etag(pub i64);

impl Etag {
    /// The "I have nothing" etag.
    pub const NONE: Etag = Etag(0);

    /// Current wall-clock time.
    pub fn now() -> Self {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| Self::from_nanos(d.as_nanos()))
            .unwrap_or(Etag::NONE)
    }

    /// Clamp a nanosecond count to the `i64` range.
    pub fn from_nanos(nanos: u128) -> Self {
        Etag(i64::try_from(nanos).unwrap_or(i64::MAX))
    }

    /// Next etag strictly after `last`, taken from the clock when it has
    /// moved forward.
    pub fn after(last: Etag) -> Self {
        let now = Self::now();
        if now > last {
            now
        } else {
            Etag(last.0.saturating_add(1))
        }
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Etag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Etag({})", self.0)
    }
}

impl fmt::Display for Etag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Etag {
    fn from(v: i64) -> Self {
        Etag(v)
    }
}

/// A single published message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Opaque payload bytes.
    pub payload: Vec<u8>,

    /// Publish time, doubling as the message's etag.
    pub created: Etag,
}

impl Message {
    pub fn new(payload: Vec<u8>, created: Etag) -> Self {
        Self { payload, created }
    }
}

/// Parameters applied to a channel on its first configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelConfig {
    /// How many messages the history retains (0 = none).
    pub capacity: usize,

    /// Advisory retention. Not enforced by the hub.
    pub retention: Duration,

    /// Marks a one-to-one pair channel. Advisory for the transport.
    pub exclusive: bool,

    /// Access key required by `Channel::authorize`.
    pub key: Option<String>,
}

impl ChannelConfig {
    pub fn new(capacity: usize, retention: Duration) -> Self {
        Self {
            capacity,
            retention,
            exclusive: false,
            key: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }
}

/// Serializable description of a channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub name: String,
    pub capacity: usize,
    pub retention_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(rename = "one2one")]
    pub exclusive: bool,
}

/// The newest etag of a channel, for a client's next poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    pub etag: Etag,
}

impl ChannelSnapshot {
    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Registry statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub channel_count: usize,
}

//! Named channels and the registry that owns them.
//!
//! A channel keeps a bounded history of published messages and a set of
//! waiters to wake on the next publish. Clients resume from an etag (the
//! publish time of the last message they saw):
//!
//! - `has_new_since` decides whether there is anything to return and from
//!   which index
//! - `collect_from` returns the payloads and the etag for the next poll
//! - `subscribe` / `unsubscribe` manage one-shot waiters for blocking polls
//!
//! # Example
//!
//! ```ignore
//! let registry = ChannelRegistry::new();
//! let channel = registry.configure("news", ChannelConfig::new(100, Duration::from_secs(3600)));
//!
//! let waiter = Waiter::new();
//! channel.subscribe(&waiter);
//! channel.publish(b"hello".to_vec())?;
//!
//! let event = waiter.recv_timeout(Duration::from_secs(30))?;
//! let (payloads, etag) = channel.collect_from(0);
//! ```

mod channel;
mod registry;
mod types;

pub use channel::Channel;
pub use registry::ChannelRegistry;
pub use types::{ChannelEvent, Waiter, WaiterId};

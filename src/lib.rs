//! # Poll Hub
//!
//! An in-memory publish/subscribe hub for long-polling clients.
//!
//! ## Core Concepts
//!
//! - **Channels**: Named topics, each with a bounded ring of recent messages
//! - **Etags**: Publish timestamps that let a reconnecting client resume
//!   exactly where it left off
//! - **Waiters**: One-shot wake handles a blocked poll registers on channels
//! - **Registry**: The map of channels, passed explicitly to callers
//!
//! Nothing is persisted. Messages older than a channel's capacity are
//! evicted, and a client whose etag fell out of the window is resent
//! everything still retained.
//!
//! ## Example
//!
//! ```ignore
//! use pollhub::{ChannelConfig, ChannelRegistry, Etag};
//!
//! let registry = ChannelRegistry::new();
//!
//! // Publisher side
//! let channel = registry.configure("news", ChannelConfig::new(100, Duration::from_secs(3600)));
//! channel.publish(b"hello".to_vec())?;
//!
//! // Poller side
//! let response = pollhub::long_poll(&registry, &[("news", Etag::NONE)], Duration::from_secs(30));
//! ```

pub mod channels;
pub mod config;
pub mod error;
pub mod history;
pub mod poll;
pub mod types;

// Re-exports
pub use channels::{Channel, ChannelEvent, ChannelRegistry, Waiter, WaiterId};
pub use config::HubConfig;
pub use error::{HubError, Result};
pub use history::CircularHistory;
pub use poll::{long_poll, ChannelBatch, PollResponse};
pub use types::*;

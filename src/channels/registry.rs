//! Registry of named channels.

use crate::config::HubConfig;
use crate::error::Result;
use crate::types::{ChannelConfig, RegistryStats};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::channel::Channel;

/// Maps channel names to channels.
///
/// One lock guards the map itself; each channel carries its own lock for
/// its history and waiters. The registry is an ordinary value: create one
/// at startup and hand it (usually behind an `Arc`) to whoever publishes or
/// polls. Channels are never removed.
pub struct ChannelRegistry {
    channels: RwLock<HashMap<String, Arc<Channel>>>,
    config: HubConfig,
}

impl ChannelRegistry {
    /// Create a registry with default settings.
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            config: HubConfig::default(),
        }
    }

    /// Create a registry with `config`, rejecting invalid settings.
    pub fn with_config(config: HubConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            channels: RwLock::new(HashMap::new()),
            config,
        })
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Get or create `name` and apply `config` if the channel has never been
    /// configured. Otherwise `config` is ignored.
    pub fn configure(&self, name: &str, config: ChannelConfig) -> Arc<Channel> {
        let channel = {
            let mut channels = self.channels.write();
            Self::get_or_insert(&mut channels, name, &self.config)
        };
        channel.configure(config);
        channel
    }

    /// Configure `name` with the registry's default capacity and retention.
    pub fn configure_default(&self, name: &str) -> Arc<Channel> {
        let config = ChannelConfig::new(
            self.config.default_capacity,
            self.config.default_retention(),
        );
        self.configure(name, config)
    }

    /// Get `name`, creating it unconfigured if it does not exist yet.
    pub fn get(&self, name: &str) -> Arc<Channel> {
        if let Some(channel) = self.channels.read().get(name) {
            return Arc::clone(channel);
        }

        let mut channels = self.channels.write();
        Self::get_or_insert(&mut channels, name, &self.config)
    }

    /// Get `name` without creating it.
    pub fn lookup(&self, name: &str) -> Option<Arc<Channel>> {
        self.channels.read().get(name).cloned()
    }

    /// Names of all channels, sorted.
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            channel_count: self.channels.read().len(),
        }
    }

    fn get_or_insert(
        channels: &mut HashMap<String, Arc<Channel>>,
        name: &str,
        config: &HubConfig,
    ) -> Arc<Channel> {
        if let Some(channel) = channels.get(name) {
            return Arc::clone(channel);
        }

        debug!(channel = name, "created channel");
        let channel = Arc::new(Channel::new(name, config.max_payload_bytes));
        channels.insert(name.to_string(), Arc::clone(&channel));
        channel
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

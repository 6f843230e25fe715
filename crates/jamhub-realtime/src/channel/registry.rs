//! Channel registry: one channel per open jam room.

use dashmap::DashMap;

use jamhub_core::types::Identity;

use super::channel::Channel;

/// Registry of all open channels.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    /// Channel name → Channel.
    channels: DashMap<String, Channel>,
}

impl ChannelRegistry {
    /// Creates a new channel registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes an identity to a channel.
    pub fn subscribe(&self, channel_name: String, identity: Identity) {
        self.channels
            .entry(channel_name.clone())
            .or_insert_with(|| Channel::new(channel_name))
            .subscribe(identity);
    }

    /// Unsubscribes an identity from a channel. Empty channels are dropped.
    pub fn unsubscribe(&self, channel_name: &str, identity: &Identity) {
        self.channels.remove_if_mut(channel_name, |_, channel| {
            channel.unsubscribe(identity);
            channel.is_empty()
        });
    }

    /// Drops a channel and every subscription to it.
    ///
    /// Returns the identities that were subscribed.
    pub fn close(&self, channel_name: &str) -> Vec<Identity> {
        self.channels
            .remove(channel_name)
            .map(|(_, channel)| channel.get_subscribers())
            .unwrap_or_default()
    }

    /// Returns all subscribers of a channel.
    pub fn get_subscribers(&self, channel_name: &str) -> Vec<Identity> {
        self.channels
            .get(channel_name)
            .map(|ch| ch.get_subscribers())
            .unwrap_or_default()
    }

    /// Returns total number of open channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

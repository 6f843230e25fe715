//! Single channel with subscriber tracking.

use std::collections::HashSet;

use jamhub_core::types::Identity;

/// A single pub/sub channel with a set of subscribed identities.
#[derive(Debug, Clone)]
pub struct Channel {
    /// Channel name.
    pub name: String,
    /// Subscribed identities.
    pub subscribers: HashSet<Identity>,
}

impl Channel {
    /// Creates a new empty channel.
    pub fn new(name: String) -> Self {
        Self {
            name,
            subscribers: HashSet::new(),
        }
    }

    /// Adds a subscriber.
    pub fn subscribe(&mut self, identity: Identity) {
        self.subscribers.insert(identity);
    }

    /// Removes a subscriber.
    pub fn unsubscribe(&mut self, identity: &Identity) {
        self.subscribers.remove(identity);
    }

    /// Returns whether the channel has any subscribers.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Returns all subscribers.
    pub fn get_subscribers(&self) -> Vec<Identity> {
        self.subscribers.iter().cloned().collect()
    }
}

//! Channel type definitions and parsing.

use serde::{Deserialize, Serialize};

use jamhub_core::types::JamCode;

/// Typed channel identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id")]
pub enum ChannelType {
    /// Room of one jam: every member, host included.
    Jam(JamCode),
}

impl ChannelType {
    /// Parses a channel string into a typed channel.
    pub fn parse(channel: &str) -> Option<Self> {
        match channel.split_once(':') {
            Some(("jam", code)) => JamCode::parse(code).ok().map(ChannelType::Jam),
            _ => None,
        }
    }

    /// Converts back to a channel string.
    pub fn to_channel_string(&self) -> String {
        match self {
            ChannelType::Jam(code) => format!("jam:{code}"),
        }
    }
}

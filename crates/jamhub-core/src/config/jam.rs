//! Jam session rules and limits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::types::id::MAX_JAM_CODE_LEN;

/// Jam session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JamConfig {
    /// Number of characters in a generated jam code.
    #[serde(default = "default_code_length")]
    pub code_length: usize,
    /// How many codes to try before giving up with `ResourceExhausted`.
    #[serde(default = "default_max_code_attempts")]
    pub max_code_attempts: u32,
    /// How long a command waits for its jam's lock, in milliseconds.
    #[serde(default = "default_lock_timeout")]
    pub lock_timeout_ms: u64,
    /// Base URL used to build shareable join links.
    #[serde(default = "default_share_base_url")]
    pub share_base_url: String,
    /// Maximum members in one jam, host included.
    #[serde(default = "default_max_members")]
    pub max_members: usize,
    /// Maximum queued tracks in one jam.
    #[serde(default = "default_max_playlist_length")]
    pub max_playlist_length: usize,
}

impl JamConfig {
    /// Lock acquisition timeout as a [`Duration`].
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Reject limits the rest of the system cannot honor.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(4..=MAX_JAM_CODE_LEN).contains(&self.code_length) {
            return Err(AppError::configuration(format!(
                "jam.code_length must be between 4 and {MAX_JAM_CODE_LEN}, got {}",
                self.code_length
            )));
        }
        if self.max_code_attempts == 0 || self.max_members == 0 {
            return Err(AppError::configuration(
                "jam.max_code_attempts and jam.max_members must be positive",
            ));
        }
        Ok(())
    }
}

impl Default for JamConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            max_code_attempts: default_max_code_attempts(),
            lock_timeout_ms: default_lock_timeout(),
            share_base_url: default_share_base_url(),
            max_members: default_max_members(),
            max_playlist_length: default_max_playlist_length(),
        }
    }
}

fn default_code_length() -> usize {
    6
}

fn default_max_code_attempts() -> u32 {
    8
}

fn default_lock_timeout() -> u64 {
    2000
}

fn default_share_base_url() -> String {
    "http://localhost:8080/jam".to_string()
}

fn default_max_members() -> usize {
    50
}

fn default_max_playlist_length() -> usize {
    500
}

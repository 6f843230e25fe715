//! Identifier newtypes for jams, callers, and tracks.
//!
//! Using distinct types prevents accidentally passing an [`Identity`] where
//! a [`JamCode`] is expected. All three serialize as plain strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Alphabet for jam codes. Drops `0`, `1`, `I` and `O` so codes can be read aloud.
pub const JAM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Longest code [`JamCode::parse`] accepts.
pub const MAX_JAM_CODE_LEN: usize = 32;

/// Short, human-shareable identifier of a jam session.
///
/// Deserialization goes through [`JamCode::parse`], so codes arriving on the
/// wire are normalized the same way as typed ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JamCode(String);

impl JamCode {
    /// Parse a user-supplied code. Input is trimmed and upper-cased.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let code = raw.trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(AppError::invalid_argument("Jam code is required"));
        }
        if code.len() > MAX_JAM_CODE_LEN || !code.bytes().all(|b| JAM_CODE_ALPHABET.contains(&b)) {
            return Err(AppError::invalid_argument(format!(
                "Malformed jam code: '{raw}'"
            )));
        }
        Ok(Self(code))
    }

    /// Wrap a code produced by the generator without re-validating it.
    pub fn from_generated(code: String) -> Self {
        Self(code)
    }

    /// Return the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JamCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for JamCode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for JamCode {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<JamCode> for String {
    fn from(code: JamCode) -> Self {
        code.0
    }
}

/// Opaque, already-verified caller handle.
///
/// Either a connection id (anonymous mode) or an authenticated subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Create an identity from any string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Create a fresh random identity for an anonymous connection.
    pub fn anonymous() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Return the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier of a queued track, unique within its playlist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    /// Create a new random track identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Return the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TrackId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TrackId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

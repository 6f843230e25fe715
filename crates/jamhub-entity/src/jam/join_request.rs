//! Pending join request for a private jam.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A guest waiting for the host to let them into a private jam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Nickname the requester will use once approved.
    pub nickname: String,
    /// When the request was made.
    pub requested_at: DateTime<Utc>,
}

//! Change notifications for documents written through a [`StoreManager`](crate::StoreManager).

use serde::Serialize;

/// What happened to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Written by `create` or `set` on a free key.
    Created,
    /// Replaced or merged.
    Updated,
    /// Removed.
    Deleted,
}

/// One committed write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentChange {
    /// Unprefixed document key.
    pub key: String,
    /// Kind of write.
    pub kind: ChangeKind,
}

impl DocumentChange {
    pub(crate) fn new(key: &str, kind: ChangeKind) -> Self {
        Self {
            key: key.to_string(),
            kind,
        }
    }
}

//! Room identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix of placeholder rooms that exist only on this client.
const TEMPORARY_PREFIX: &str = "temp_";

/// Name of a room as it appears in URLs and envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wrap a room name.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Room name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Placeholder rooms are never persisted server-side.
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMPORARY_PREFIX)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

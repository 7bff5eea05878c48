//! Rooms this client created.
//!
//! Newest first. The history loader consults it to skip fetching a room that
//! was created moments ago; the UI lists it as recent rooms.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    RoomId,
    message::{format_timestamp, parse_timestamp},
};

/// One created room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Room identifier
    pub id: RoomId,
    /// Creation instant, RFC 3339
    pub timestamp: String,
}

impl LedgerEntry {
    /// Parsed creation instant. `None` if the stored text is not a timestamp.
    pub fn created_at(&self) -> Option<OffsetDateTime> {
        parse_timestamp(&self.timestamp)
    }
}

/// Local record of created rooms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomLedger {
    entries: Vec<LedgerEntry>,
}

impl RoomLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `room` was created at `at`.
    pub fn record_created(&mut self, room: RoomId, at: OffsetDateTime) {
        self.entries.insert(0, LedgerEntry { id: room, timestamp: format_timestamp(at) });
    }

    /// When `room` was created, if this client created it.
    ///
    /// Uses the newest entry for the room.
    pub fn created_at(&self, room: &RoomId) -> Option<OffsetDateTime> {
        self.entries.iter().find(|entry| &entry.id == room).and_then(LedgerEntry::created_at)
    }

    /// Entries other than `excluding`, newest first.
    pub fn recent<'a>(&'a self, excluding: &'a RoomId) -> impl Iterator<Item = &'a LedgerEntry> {
        self.entries.iter().filter(move |entry| &entry.id != excluding)
    }

    /// All entries, newest first.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a ledger from JSON.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

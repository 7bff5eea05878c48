//! One-shot transcript load on room entry.
//!
//! The loader decides whether to fetch at all, and turns a fetched body into
//! messages built by the same constructor live traffic uses. The fetch itself
//! is the driver's job.
//!
//! Loading is a soft operation. Any failure leaves the transcript empty and
//! room entry proceeds.

use std::time::Duration;

use convoroom_proto::{Endpoints, HistoryResponse};
use time::OffsetDateTime;

use crate::{
    RoomId,
    env::Environment,
    error::{HistoryError, HttpError},
    ledger::RoomLedger,
    message::{Message, parse_timestamp},
};

/// A room created more recently than this has no persisted history yet.
pub const DEFAULT_NEW_ROOM_THRESHOLD: Duration = Duration::from_secs(2);

/// History loader configuration
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Skip the fetch for rooms this client created within this long
    pub new_room_threshold: Duration,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { new_room_threshold: DEFAULT_NEW_ROOM_THRESHOLD }
    }
}

/// What to do about history for a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryPlan {
    /// Fetch the transcript from `url`
    Fetch {
        /// History endpoint for the room
        url: String,
    },
    /// Do not fetch
    Skip(SkipReason),
}

/// Why a fetch was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Temporary rooms are never persisted
    TemporaryRoom,
    /// This client created the room moments ago
    NewlyCreated {
        /// Time since creation
        age: Duration,
    },
}

/// Plans and decodes history fetches.
#[derive(Debug, Clone, Default)]
pub struct HistoryLoader {
    config: HistoryConfig,
}

impl HistoryLoader {
    /// Create a loader.
    pub fn new(config: HistoryConfig) -> Self {
        Self { config }
    }

    /// Decide whether `room` needs a fetch at `now`.
    pub fn plan(
        &self,
        room: &RoomId,
        endpoints: &Endpoints,
        ledger: &RoomLedger,
        now: OffsetDateTime,
    ) -> HistoryPlan {
        if room.is_temporary() {
            tracing::debug!(%room, "temporary room, no history");
            return HistoryPlan::Skip(SkipReason::TemporaryRoom);
        }

        if let Some(created) = ledger.created_at(room) {
            // Clock skew can put creation in the future; that is still new.
            let age = Duration::try_from(now - created).unwrap_or_default();
            if age < self.config.new_room_threshold {
                tracing::debug!(%room, ?age, "room just created, skipping history");
                return HistoryPlan::Skip(SkipReason::NewlyCreated { age });
            }
        }

        HistoryPlan::Fetch { url: endpoints.history_url(room) }
    }

    /// Turn a history body into messages, oldest first.
    ///
    /// Records with unparsable timestamps are stamped with the current time.
    pub fn decode<E: Environment>(
        &self,
        env: &E,
        body: &[u8],
    ) -> Result<Vec<Message>, HistoryError> {
        let response = HistoryResponse::decode(body)?;

        let messages = response
            .messages
            .iter()
            .map(|record| {
                let timestamp =
                    parse_timestamp(&record.timestamp).unwrap_or_else(|| env.wall_clock());
                Message::compose(env, &record.sender, &record.message, timestamp)
            })
            .collect();

        Ok(messages)
    }

    /// Resolve a completed fetch, logging and swallowing any failure.
    pub fn settle<E: Environment>(
        &self,
        env: &E,
        room: &RoomId,
        result: Result<Vec<u8>, HttpError>,
    ) -> Vec<Message> {
        match result.map_err(HistoryError::from).and_then(|body| self.decode(env, &body)) {
            Ok(messages) => {
                tracing::info!(%room, count = messages.len(), "history loaded");
                messages
            },
            Err(error) => {
                let transient = error.is_transient();
                tracing::warn!(%room, %error, transient, "history unavailable");
                Vec::new()
            },
        }
    }
}

//! Messages and content keys.
//!
//! Every message, whatever its origin (history, peer frame, local send,
//! computed reply), is built by [`Message::compose`] so id generation,
//! timestamp handling, and render hints are uniform.

use std::fmt;

use time::{
    OffsetDateTime, PrimitiveDateTime,
    format_description::well_known::{Iso8601, Rfc3339},
};

use crate::{env::Environment, render::RenderHints};

/// Reserved sender of computed replies.
pub const AI_SENDER: &str = "AI";

/// Length of the random suffix in message ids.
const ID_SUFFIX_LEN: usize = 9;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Process-local message identifier. Never sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(String);

impl MessageId {
    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a logical utterance: sender and text joined by a NUL.
///
/// NUL cannot appear in a display name, so the join is unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentKey(String);

impl ContentKey {
    /// Key for `(sender, text)`.
    pub fn new(sender: &str, text: &str) -> Self {
        let mut key = String::with_capacity(sender.len() + 1 + text.len());
        key.push_str(sender);
        key.push('\u{0}');
        key.push_str(text);
        Self(key)
    }

    /// Key for a computed reply.
    pub fn computed(text: &str) -> Self {
        Self::new(AI_SENDER, text)
    }
}

/// One displayed chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Unique per process, generated at construction.
    pub id: MessageId,
    /// Display identity of the author.
    pub sender: String,
    /// Message body.
    pub text: String,
    /// When the message was first materialized.
    pub timestamp: OffsetDateTime,
    /// Authored by the compute responder.
    pub is_computed_reply: bool,
    /// Derived from `text`.
    pub render_hints: RenderHints,
}

impl Message {
    /// Build a message with a fresh id and derived render hints.
    pub fn compose<E: Environment>(
        env: &E,
        sender: &str,
        text: &str,
        timestamp: OffsetDateTime,
    ) -> Self {
        let is_computed_reply = sender == AI_SENDER;
        let render_hints =
            if is_computed_reply { RenderHints::analyze(text) } else { RenderHints::plain() };

        Self {
            id: generate_id(env, sender),
            sender: sender.to_string(),
            text: text.to_string(),
            timestamp,
            is_computed_reply,
            render_hints,
        }
    }

    /// Content key of this message.
    pub fn content_key(&self) -> ContentKey {
        ContentKey::new(&self.sender, &self.text)
    }

    /// Timestamp as RFC 3339 text.
    pub fn timestamp_string(&self) -> String {
        format_timestamp(self.timestamp)
    }
}

/// `<sender>-<unix millis>-<9 base36 chars>`
fn generate_id<E: Environment>(env: &E, sender: &str) -> MessageId {
    let millis = env.wall_clock().unix_timestamp_nanos() / 1_000_000;

    let mut entropy = env.random_u64();
    let mut suffix = String::with_capacity(ID_SUFFIX_LEN);
    for _ in 0..ID_SUFFIX_LEN {
        suffix.push(char::from(BASE36[(entropy % 36) as usize]));
        entropy /= 36;
    }

    MessageId(format!("{sender}-{millis}-{suffix}"))
}

/// Parse a persisted ISO-8601 timestamp.
///
/// Accepts RFC 3339, general ISO-8601 with an offset, and offset-less
/// ISO-8601 (assumed UTC).
pub fn parse_timestamp(text: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(text, &Rfc3339)
        .or_else(|_| OffsetDateTime::parse(text, &Iso8601::DEFAULT))
        .ok()
        .or_else(|| {
            PrimitiveDateTime::parse(text, &Iso8601::DEFAULT).ok().map(PrimitiveDateTime::assume_utc)
        })
}

/// Format a timestamp as RFC 3339.
pub fn format_timestamp(timestamp: OffsetDateTime) -> String {
    timestamp.format(&Rfc3339).unwrap_or_else(|_| timestamp.to_string())
}

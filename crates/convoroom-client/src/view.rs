//! Per-room transcript state shared by the inbound and outbound paths.

use convoroom_core::{
    dedup::{DedupConfig, Deduplicator},
    message::{Message, MessageId},
    sequence::MessageSequence,
};
use time::OffsetDateTime;

/// The displayed transcript plus the deduplicator guarding it.
///
/// Only the inbound router, the outbound pipeline and the history merge
/// mutate it, each from a single event handler.
#[derive(Debug, Clone)]
pub struct RoomView {
    messages: MessageSequence,
    dedup: Deduplicator,
    at_bottom: bool,
}

impl RoomView {
    /// Create an empty view scrolled to the bottom.
    pub fn new(config: DedupConfig) -> Self {
        Self { messages: MessageSequence::new(), dedup: Deduplicator::new(config), at_bottom: true }
    }

    /// Displayed messages in order.
    pub fn messages(&self) -> &MessageSequence {
        &self.messages
    }

    /// Deduplicator for this room.
    pub fn dedup(&self) -> &Deduplicator {
        &self.dedup
    }

    /// True if the newest message is visible.
    pub fn at_bottom(&self) -> bool {
        self.at_bottom
    }

    pub(crate) fn set_at_bottom(&mut self, at_bottom: bool) {
        self.at_bottom = at_bottom;
    }

    /// Append `message` if its content key is new at its timestamp.
    ///
    /// Returns false if it was suppressed as a duplicate.
    pub(crate) fn admit(&mut self, message: Message) -> bool {
        if !self.dedup.should_accept(&message.content_key(), message.timestamp) {
            tracing::debug!(sender = %message.sender, "suppressing duplicate message");
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Merge a history snapshot ahead of live messages.
    ///
    /// Records are filtered through the deduplicator at their persisted
    /// timestamps. Returns the number admitted.
    pub(crate) fn merge_history(&mut self, history: Vec<Message>) -> usize {
        let mut admitted = Vec::with_capacity(history.len());
        for message in history {
            if self.dedup.should_accept(&message.content_key(), message.timestamp) {
                admitted.push(message);
            }
        }

        let count = admitted.len();
        self.messages.prepend(admitted);
        count
    }

    /// Withdraw an optimistic message and release its content key.
    ///
    /// The key is only released when no other displayed message carries it.
    pub(crate) fn rollback(&mut self, id: &MessageId) -> Option<Message> {
        let message = self.messages.remove(id)?;
        let key = message.content_key();
        if self.messages.count_content(&key) == 0 {
            self.dedup.forget(&key);
        }
        Some(message)
    }

    pub(crate) fn sweep(&mut self, now: OffsetDateTime) {
        self.dedup.maybe_sweep(now);
    }

    /// Drop all messages and dedupe state.
    pub(crate) fn reset(&mut self) {
        self.messages.clear();
        self.dedup.clear();
        self.at_bottom = true;
    }
}

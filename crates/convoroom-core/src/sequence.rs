//! The displayed transcript.
//!
//! Insertion order is display order. Nothing here re-sorts by timestamp.

use crate::message::{ContentKey, Message, MessageId};

/// Ordered list of messages shown for the current room.
#[derive(Debug, Clone, Default)]
pub struct MessageSequence {
    messages: Vec<Message>,
}

impl MessageSequence {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at the end.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Insert a batch ahead of everything already displayed.
    ///
    /// Used to merge a history snapshot that arrives after live messages.
    pub fn prepend(&mut self, batch: Vec<Message>) {
        if batch.is_empty() {
            return;
        }
        let live = std::mem::replace(&mut self.messages, batch);
        self.messages.extend(live);
    }

    /// Remove a message by id. `None` if it is not present.
    pub fn remove(&mut self, id: &MessageId) -> Option<Message> {
        let index = self.messages.iter().position(|m| &m.id == id)?;
        Some(self.messages.remove(index))
    }

    /// Drop every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Messages in display order.
    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    /// Iterate in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// Number of displayed messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True if nothing is displayed.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// True if a message with this id is displayed.
    pub fn contains(&self, id: &MessageId) -> bool {
        self.messages.iter().any(|m| &m.id == id)
    }

    /// Number of displayed messages with this content key.
    pub fn count_content(&self, key: &ContentKey) -> usize {
        self.messages.iter().filter(|m| &m.content_key() == key).count()
    }
}

impl<'a> IntoIterator for &'a MessageSequence {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

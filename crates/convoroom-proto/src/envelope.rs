//! JSON envelopes on the duplex channel.
//!
//! Outbound envelopes are a closed set and use an internally tagged enum.
//! Inbound frames are deliberately loose: the server may emit any `type`, and
//! only `chat_message` carries meaning for the client. Unknown types, pings
//! echoed back, and garbage are all expected traffic.

use serde::{Deserialize, Serialize};

use crate::{ProtocolError, Result, RoomId};

/// `type` value of chat frames in both directions.
pub const CHAT_MESSAGE_TYPE: &str = "chat_message";

/// Sender attributed to chat frames that omit one.
const UNKNOWN_SENDER: &str = "Unknown";

/// Envelopes the client sends on the duplex channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundEnvelope {
    /// Broadcast a chat message to the room's peers.
    #[serde(rename = "chat_message")]
    ChatMessage {
        /// Message text
        message: String,
        /// Target room
        #[serde(rename = "roomId")]
        room_id: RoomId,
        /// Sender display identity
        username: String,
    },

    /// Announce this socket's identity after open.
    #[serde(rename = "JOIN")]
    Join {
        /// Sender display identity
        username: String,
        /// Joined room
        #[serde(rename = "roomId")]
        room_id: RoomId,
    },

    /// Keepalive probe.
    #[serde(rename = "PING")]
    Ping,
}

impl OutboundEnvelope {
    /// Serialize to the JSON text sent on the wire.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| ProtocolError::Encode { what: "envelope", reason: e.to_string() })
    }
}

/// Any JSON object received on the duplex channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InboundFrame {
    /// Envelope type. Absent on some server broadcasts.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Sender display identity
    #[serde(default, alias = "sender")]
    pub username: Option<String>,
    /// Chat text
    #[serde(default)]
    pub message: Option<String>,
}

impl InboundFrame {
    /// Parse raw frame text.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ProtocolError::malformed("frame", &e))
    }

    /// Classify as a chat message. `None` for every other frame type.
    ///
    /// A chat frame without a sender is attributed to `Unknown`; one without
    /// text is not a chat message.
    pub fn into_chat(self) -> Option<ChatFrame> {
        if self.kind.as_deref() != Some(CHAT_MESSAGE_TYPE) {
            return None;
        }

        let text = self.message?;
        let sender = self.username.unwrap_or_else(|| UNKNOWN_SENDER.to_string());
        Some(ChatFrame { sender, text })
    }
}

/// A classified inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatFrame {
    /// Sender display identity
    pub sender: String,
    /// Chat text
    pub text: String,
}

impl ChatFrame {
    /// Parse raw frame text and keep it only if it is a chat message.
    pub fn classify(text: &str) -> Option<Self> {
        InboundFrame::parse(text).ok().and_then(InboundFrame::into_chat)
    }
}

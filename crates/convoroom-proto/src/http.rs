//! Request and response bodies for the history and compute endpoints.

use serde::{Deserialize, Serialize};

use crate::{ProtocolError, Result, RoomId};

/// `GET /api/get_chat_history/<room>/` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryResponse {
    /// Persisted transcript, oldest first.
    pub messages: Vec<HistoryRecord>,
}

impl HistoryResponse {
    /// Decode a response body. Any shape mismatch is an error.
    pub fn decode(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| ProtocolError::malformed("history payload", &e))
    }
}

/// One persisted transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Sender display identity
    pub sender: String,
    /// Message text
    pub message: String,
    /// ISO-8601 instant the message was persisted
    pub timestamp: String,
}

/// `POST /api/data/` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeRequest {
    /// Text the user sent
    pub message: String,
    /// Room the text was sent in
    #[serde(rename = "roomId")]
    pub room_id: RoomId,
    /// Sender display identity
    pub username: String,
}

impl ComputeRequest {
    /// Serialize to a JSON request body.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| ProtocolError::Encode { what: "compute request", reason: e.to_string() })
    }
}

/// `POST /api/data/` response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeResponse {
    /// Computed reply. Absent means there is nothing to insert.
    #[serde(default)]
    pub response: Option<String>,
}

impl ComputeResponse {
    /// Decode a response body.
    pub fn decode(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| ProtocolError::malformed("compute response", &e))
    }

    /// Reply text, if present and non-empty.
    pub fn reply(&self) -> Option<&str> {
        self.response.as_deref().filter(|r| !r.is_empty())
    }
}

/// `POST /api/create_room/` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    /// Client-chosen room name
    #[serde(rename = "roomId")]
    pub room_id: RoomId,
}

impl CreateRoomRequest {
    /// Serialize to a JSON request body.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| ProtocolError::Encode { what: "create room request", reason: e.to_string() })
    }
}

/// `POST /api/create_room/` response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    /// Room was registered
    #[serde(default)]
    pub success: bool,
    /// Reason for a refusal
    #[serde(default)]
    pub error: Option<String>,
}

impl CreateRoomResponse {
    /// Decode a response body.
    pub fn decode(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| ProtocolError::malformed("create room response", &e))
    }
}

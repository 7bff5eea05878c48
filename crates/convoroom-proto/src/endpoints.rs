//! URL construction for the backend endpoints.

use crate::RoomId;

/// Base URLs of the HTTP backend and the duplex channel server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    http_base: String,
    ws_base: String,
}

impl Endpoints {
    /// Create from base URLs. Trailing slashes are optional.
    pub fn new(http_base: impl Into<String>, ws_base: impl Into<String>) -> Self {
        Self { http_base: http_base.into(), ws_base: ws_base.into() }
    }

    /// HTTP base URL as configured.
    pub fn http_base(&self) -> &str {
        &self.http_base
    }

    /// Duplex channel base URL as configured.
    pub fn ws_base(&self) -> &str {
        &self.ws_base
    }

    /// `GET <base>/api/get_chat_history/<room>/`
    pub fn history_url(&self, room: &RoomId) -> String {
        format!("{}api/get_chat_history/{}/", with_slash(&self.http_base), room)
    }

    /// `POST <base>/api/data/`
    pub fn compute_url(&self) -> String {
        format!("{}api/data/", with_slash(&self.http_base))
    }

    /// `POST <base>/api/create_room/`
    pub fn create_room_url(&self) -> String {
        format!("{}api/create_room/", with_slash(&self.http_base))
    }

    /// `<ws-base>/ws/room/<room>/`
    pub fn channel_url(&self, room: &RoomId) -> String {
        format!("{}ws/room/{}/", with_slash(&self.ws_base), room)
    }
}

fn with_slash(base: &str) -> String {
    if base.ends_with('/') { base.to_string() } else { format!("{base}/") }
}

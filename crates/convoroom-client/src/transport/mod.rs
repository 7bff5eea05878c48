//! Production transport for the client.
//!
//! Thin I/O layer around the Sans-IO [`crate::Client`]. Room logic stays in
//! the client; this module opens WebSockets, performs HTTP calls, runs a tick
//! timer and reports outcomes back as events.

mod http;
mod session;
mod system_env;
mod websocket;

use thiserror::Error;

pub use self::{
    http::HttpBackend,
    session::{DEFAULT_TICK_INTERVAL, Session, SessionHandle},
    system_env::SystemEnv,
};

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP client could not be built.
    #[error("http client setup failed: {0}")]
    HttpSetup(String),

    /// WebSocket failure.
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// Session stopped before the operation completed.
    #[error("session closed")]
    SessionClosed,
}

//! ConvoRoom wire protocol.
//!
//! Plain data types for everything that crosses a process boundary: JSON
//! envelopes on the room-scoped duplex channel, the history and compute HTTP
//! bodies, WebSocket close codes, and URL construction for all three
//! endpoints.
//!
//! Nothing in this crate performs I/O. Encoding and decoding are pure
//! functions so the state machines in `convoroom-core` and
//! `convoroom-client` can be exercised without a network.

#![forbid(unsafe_code)]

pub mod close;
pub mod endpoints;
pub mod envelope;
pub mod errors;
pub mod http;
mod room;

pub use close::CloseCode;
pub use endpoints::Endpoints;
pub use envelope::{CHAT_MESSAGE_TYPE, ChatFrame, InboundFrame, OutboundEnvelope};
pub use errors::{ProtocolError, Result};
pub use http::{
    ComputeRequest, ComputeResponse, CreateRoomRequest, CreateRoomResponse, HistoryRecord,
    HistoryResponse,
};
pub use room::RoomId;

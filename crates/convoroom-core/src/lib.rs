//! ConvoRoom synchronization core.
//!
//! Pure state machines for keeping one client's view of a chat room
//! consistent while messages arrive from three independent sources: text the
//! local user typed, peer broadcasts on the duplex channel, and replies from
//! the compute endpoint.
//!
//! # Sans-IO
//!
//! Nothing here touches the network, a clock, or an RNG directly. Methods take
//! the current time as a parameter (or draw it from an [`env::Environment`])
//! and return actions for a driver to execute. The same code runs against the
//! system clock in production and a virtual clock in simulation.
//!
//! # Components
//!
//! - [`dedup::Deduplicator`]: content-key / time-window duplicate filter
//! - [`history::HistoryLoader`]: one-shot transcript fetch planning and
//!   decoding
//! - [`channel::ChannelManager`]: duplex connection lifecycle with heartbeat
//!   and exponential-backoff reconnect
//! - [`message::Message`] and [`sequence::MessageSequence`]: the displayed
//!   transcript
//! - [`ledger::RoomLedger`]: rooms this client created, for the new-room
//!   heuristic

#![forbid(unsafe_code)]

pub mod channel;
pub mod dedup;
pub mod env;
pub mod error;
pub mod history;
pub mod ledger;
pub mod message;
pub mod render;
pub mod sequence;

#[cfg(test)]
mod test_support;

pub use convoroom_proto::RoomId;

//! Client
//!
//! Action-based client for a ConvoRoom chat room. Keeps the displayed
//! transcript consistent while messages arrive from the local user, from peers
//! on the duplex channel, and from the compute endpoint.
//!
//! # Architecture
//!
//! The client follows the same Sans-IO and action-based patterns as
//! [`convoroom_core`]. It receives events ([`ClientEvent`]), processes them
//! through pure state machine logic, and returns actions ([`ClientAction`]) for
//! the caller to execute.
//!
//! # Components
//!
//! - [`Client`]: Top-level state machine for one room at a time
//! - [`OutboundPipeline`]: optimistic echo, broadcast, compute call, rollback
//! - [`InboundRouter`]: classify, filter and merge duplex frames
//! - [`NoticeSink`]: injected destination for transient user notices
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::Session`]: async executor that runs a [`Client`] against a
//!   real WebSocket and HTTP backend
//! - [`transport::SystemEnv`]: system clock and OS randomness

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod config;
mod error;
mod event;
mod inbound;
mod notice;
mod outbound;
mod view;

#[cfg(test)]
mod test_support;

#[cfg(feature = "transport")]
pub mod transport;

pub use client::Client;
pub use config::ClientConfig;
pub use convoroom_core::{RoomId, env::Environment, message::Message};
pub use error::{ClientError, SendError};
pub use event::{ClientAction, ClientEvent, RequestId};
pub use inbound::InboundRouter;
pub use notice::{Notice, NoticeKind, NoticeSink};
pub use outbound::{OutboundPipeline, Outgoing};
pub use view::RoomView;

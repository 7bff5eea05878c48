//! Deterministic simulation harness for ConvoRoom.
//!
//! A virtual-time [`SimEnv`] and a scripted [`SimHost`] that stands in for
//! the network, the backend and the UI. Tests feed events one at a time,
//! inspect the actions the client returned, and answer its requests in any
//! order they like.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks WHAT must be true after every event, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the common
//! set and [`SimHost::with_invariants`] to check after each step.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod notices;
pub mod sim_env;
pub mod sim_host;

pub use invariants::{
    ConnectionFlagMatches, DisplayMirrorsClient, HostSnapshot, Invariant, InvariantRegistry,
    InvariantResult, ReconnectBounded, SendsTargetCurrentChannel, TypingMatchesInFlight,
    UniqueLiveContent, Violation,
};
pub use notices::RecordingSink;
pub use sim_env::{SimEnv, SimInstant};
pub use sim_host::{HostError, HostResult, PendingCompute, SimHost};

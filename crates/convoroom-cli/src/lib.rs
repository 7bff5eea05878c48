//! Line-mode terminal client for ConvoRoom.
//!
//! Wires the client engine to stdin and stdout: typed lines become sends or
//! slash commands, client actions become printed lines. The data directory
//! holds the remembered display name and the ledger of rooms this user
//! created.

#![forbid(unsafe_code)]

pub mod app;
pub mod args;
pub mod commands;
pub mod error;
pub mod identity;
pub mod render;
pub mod store;

pub use app::run;
pub use args::Args;
pub use error::CliError;

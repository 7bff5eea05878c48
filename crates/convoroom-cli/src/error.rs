//! CLI error types.

use std::path::PathBuf;

use convoroom_client::transport::TransportError;
use convoroom_proto::ProtocolError;
use thiserror::Error;

/// Errors surfaced by the terminal client.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading or writing a file in the data directory failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A data file could not be encoded.
    #[error("{}: {source}", path.display())]
    Encode {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// Terminal input could not be read.
    #[error("stdin: {0}")]
    Input(#[source] std::io::Error),

    /// Transport setup or session failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Wire encoding failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The backend refused or failed to create a room.
    #[error("room creation failed: {0}")]
    CreateRoom(String),
}

impl CliError {
    /// Returns true if retrying the operation might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::CreateRoom(_) | Self::Transport(TransportError::WebSocket(_)))
    }
}

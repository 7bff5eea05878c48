//! Client error types.

use convoroom_core::error::{ChannelError, HttpError};
use convoroom_proto::ProtocolError;
use thiserror::Error;

/// Errors returned by [`crate::Client::handle`].
///
/// Room-level failures (dropped frames, failed sends, missing history) are
/// handled inside the client and never surface here. These indicate a bug in
/// the caller or an unencodable request.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Channel state machine rejected a transition
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Request body could not be encoded
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Why a compute call counts as failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// Network failure or non-2xx status
    #[error("compute request failed: {0}")]
    Http(#[from] HttpError),

    /// 2xx response whose body was not a compute response
    #[error("compute response rejected: {0}")]
    Malformed(#[from] ProtocolError),
}

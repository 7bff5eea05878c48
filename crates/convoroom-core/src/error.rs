//! Error types for the synchronization core.
//!
//! None of these are fatal to a room session. Channel errors feed the
//! reconnect policy, HTTP errors roll back optimistic sends or leave the
//! history empty, and malformed data is dropped.

use std::time::Duration;

use convoroom_proto::ProtocolError;
use thiserror::Error;

use crate::channel::ChannelState;

/// Errors from the channel manager state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// Invalid state transition attempted
    #[error("invalid state transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// Current state when error occurred
        state: ChannelState,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Channel never reached `Open`
    #[error("connect timeout after {elapsed:?}")]
    ConnectTimeout {
        /// How long we waited
        elapsed: Duration,
    },

    /// Underlying transport error
    #[error("transport error: {0}")]
    Transport(String),
}

impl ChannelError {
    /// Returns true if this error is transient and may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectTimeout { .. } | Self::Transport(_))
    }
}

/// Failure of a request/response call, as reported by the driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// Server answered with a non-2xx status
    #[error("HTTP {status}")]
    Status {
        /// Response status code
        status: u16,
    },

    /// Request never produced a response
    #[error("network error: {0}")]
    Network(String),
}

/// Errors while loading the persisted transcript.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// Fetch failed
    #[error("history fetch failed: {0}")]
    Http(#[from] HttpError),

    /// Body did not match the expected shape
    #[error("history payload rejected: {0}")]
    Malformed(#[from] ProtocolError),
}

impl HistoryError {
    /// Returns true if fetching again might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(HttpError::Network(_)) => true,
            Self::Http(HttpError::Status { status }) => *status >= 500,
            Self::Malformed(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_timeouts_are_transient() {
        assert!(ChannelError::ConnectTimeout { elapsed: Duration::from_secs(11) }.is_transient());
        assert!(ChannelError::Transport("reset".into()).is_transient());
        assert!(
            !ChannelError::InvalidState { state: ChannelState::Open, operation: "connect" }
                .is_transient()
        );
    }

    #[test]
    fn history_errors_classify() {
        assert!(HistoryError::from(HttpError::Network("refused".into())).is_transient());
        assert!(HistoryError::from(HttpError::Status { status: 503 }).is_transient());
        assert!(!HistoryError::from(HttpError::Status { status: 404 }).is_transient());
        assert!(!HistoryError::from(ProtocolError::MissingField("messages")).is_transient());
    }
}

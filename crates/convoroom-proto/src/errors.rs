//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding wire data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Text was not valid JSON or did not match the expected shape.
    #[error("malformed {what}: {reason}")]
    Malformed {
        /// What was being decoded (e.g. "frame", "history payload")
        what: &'static str,
        /// Decoder message
        reason: String,
    },

    /// A value could not be serialized.
    #[error("failed to encode {what}: {reason}")]
    Encode {
        /// What was being encoded
        what: &'static str,
        /// Encoder message
        reason: String,
    },

    /// A required field was absent.
    #[error("missing field `{0}`")]
    MissingField(&'static str),
}

impl ProtocolError {
    pub(crate) fn malformed(what: &'static str, err: &serde_json::Error) -> Self {
        Self::Malformed { what, reason: err.to_string() }
    }
}

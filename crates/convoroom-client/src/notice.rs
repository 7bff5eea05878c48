//! Transient user-facing notices.
//!
//! The outbound pipeline reports failed sends through a [`NoticeSink`] it is
//! given at construction. There is no process-wide registry.

use tokio::sync::mpsc;

/// Text shown when a send fails and its optimistic echo is withdrawn.
pub const SEND_FAILED_TEXT: &str = "Failed to send message. Please try again.";

/// Kind of notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// A send was rolled back
    SendFailed,
}

/// A transient notice for the host UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// What happened
    pub kind: NoticeKind,
    /// User-facing text
    pub text: String,
}

impl Notice {
    /// Notice for a rolled-back send.
    pub fn send_failed() -> Self {
        Self { kind: NoticeKind::SendFailed, text: SEND_FAILED_TEXT.to_string() }
    }
}

/// Destination for notices.
pub trait NoticeSink {
    /// Deliver a notice. Must not block.
    fn notify(&self, notice: Notice);
}

impl NoticeSink for mpsc::UnboundedSender<Notice> {
    fn notify(&self, notice: Notice) {
        if self.send(notice).is_err() {
            tracing::debug!("notice receiver dropped");
        }
    }
}

//! Observable state for invariant checks.

use std::time::Duration;

use convoroom_core::{dedup::DEFAULT_DEDUPE_WINDOW, message::Message};

/// UI projection and client state at one point in a run.
#[derive(Debug, Clone)]
pub struct HostSnapshot {
    /// Messages the UI shows, rebuilt from message actions.
    pub displayed: Vec<Message>,
    /// Displayed messages that arrived through `MessageAppended`, in order.
    pub live: Vec<Message>,
    /// The client's own sequence.
    pub client_messages: Vec<Message>,
    /// Last `ConnectionChanged` value.
    pub ui_connected: bool,
    /// Channel manager's view.
    pub client_connected: bool,
    /// Last `TypingChanged` value.
    pub ui_typing: bool,
    /// Compute call outstanding.
    pub client_sending: bool,
    /// Current reconnect attempt.
    pub reconnect_attempt: u32,
    /// Configured attempt limit.
    pub max_reconnect_attempts: u32,
    /// `SendFrame` actions addressed to a handle other than the newest.
    pub stale_sends: usize,
    /// Configured dedupe window.
    pub dedupe_window: Duration,
}

impl HostSnapshot {
    /// Snapshot of an idle client.
    pub fn empty() -> Self {
        Self {
            displayed: Vec::new(),
            live: Vec::new(),
            client_messages: Vec::new(),
            ui_connected: false,
            client_connected: false,
            ui_typing: false,
            client_sending: false,
            reconnect_attempt: 0,
            max_reconnect_attempts: 0,
            stale_sends: 0,
            dedupe_window: DEFAULT_DEDUPE_WINDOW,
        }
    }
}

//! Text rendering of client actions.

use std::fmt::Write;

use convoroom_client::ClientAction;
use convoroom_core::{message::Message, render::Segment};

/// Render one message as one or more lines.
///
/// Computed replies are laid out segment by segment with code blocks fenced
/// and labelled.
pub fn render_message(message: &Message, local: Option<&str>) -> String {
    let t = message.timestamp;
    let mut out = format!("[{:02}:{:02}:{:02}] {}", t.hour(), t.minute(), t.second(), message.sender);
    if local == Some(message.sender.as_str()) {
        out.push_str(" (you)");
    }
    out.push(':');

    let segments = &message.render_hints.segments;
    if segments.is_empty() {
        out.push(' ');
        out.push_str(&message.text);
        return out;
    }

    for segment in segments {
        match segment {
            Segment::Text(text) => {
                for line in text.trim_matches('\n').lines() {
                    let _ = write!(out, "\n  {line}");
                }
            },
            Segment::Code { language, content } => {
                let _ = write!(out, "\n  ```{language}");
                for line in content.lines() {
                    let _ = write!(out, "\n  {line}");
                }
                out.push_str("\n  ```");
            },
        }
    }
    out
}

/// Render an action for the terminal. Actions with no visible effect yield
/// `None`.
pub fn render_action(action: &ClientAction, local: Option<&str>) -> Option<String> {
    match action {
        ClientAction::MessageAppended(message) => Some(render_message(message, local)),
        ClientAction::MessagesReplaced(messages) if messages.is_empty() => None,
        ClientAction::MessagesReplaced(messages) => {
            let mut out = String::from("-- transcript --");
            for message in messages {
                out.push('\n');
                out.push_str(&render_message(message, local));
            }
            Some(out)
        },
        ClientAction::MessageRemoved { .. } => Some("* your last message was withdrawn".into()),
        ClientAction::ConnectionChanged { connected: true } => Some("* connected".into()),
        ClientAction::ConnectionChanged { connected: false } => Some("* disconnected".into()),
        ClientAction::TypingChanged { active: true } => Some("* AI is typing...".into()),
        ClientAction::TypingChanged { active: false }
        | ClientAction::ScrollToBottom
        | ClientAction::OpenChannel { .. }
        | ClientAction::CloseChannel { .. }
        | ClientAction::AbortChannel { .. }
        | ClientAction::SendFrame { .. }
        | ClientAction::FetchHistory { .. }
        | ClientAction::PostCompute { .. } => None,
    }
}

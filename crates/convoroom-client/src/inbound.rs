//! Inbound router: duplex frames into the transcript.

use convoroom_core::{env::Environment, message::Message};
use convoroom_proto::ChatFrame;

use crate::{event::ClientAction, view::RoomView};

/// Classifies duplex frames and merges chat messages into the view.
///
/// Non-chat frames (keepalive echoes, presence, garbage) are expected traffic
/// and dropped quietly. Chat frames from the local identity are dropped
/// because the optimistic echo already shows them.
#[derive(Debug, Clone, Copy, Default)]
pub struct InboundRouter;

impl InboundRouter {
    /// Route one raw frame.
    pub fn route<E: Environment>(
        &self,
        env: &E,
        view: &mut RoomView,
        identity: Option<&str>,
        text: &str,
    ) -> Vec<ClientAction> {
        let Some(chat) = ChatFrame::classify(text) else {
            tracing::trace!(len = text.len(), "ignoring non-chat frame");
            return Vec::new();
        };

        if identity == Some(chat.sender.as_str()) {
            tracing::trace!("ignoring own broadcast");
            return Vec::new();
        }

        let message = Message::compose(env, &chat.sender, &chat.text, env.wall_clock());
        if !view.admit(message.clone()) {
            return Vec::new();
        }

        let mut actions = vec![ClientAction::MessageAppended(message)];
        if view.at_bottom() {
            actions.push(ClientAction::ScrollToBottom);
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use convoroom_core::dedup::DedupConfig;

    use super::*;
    use crate::test_support::TestEnv;

    const BOB_HI: &str = r#"{"type":"chat_message","username":"bob","message":"hi"}"#;

    #[test]
    fn chat_frame_is_appended() {
        let env = TestEnv::default();
        let mut view = RoomView::new(DedupConfig::default());

        let actions = InboundRouter.route(&env, &mut view, Some("alice"), BOB_HI);

        assert_eq!(actions.len(), 2);
        assert!(matches!(&actions[0], ClientAction::MessageAppended(m) if m.sender == "bob"));
        assert_eq!(actions[1], ClientAction::ScrollToBottom);
        assert_eq!(view.messages().len(), 1);
    }

    #[test]
    fn repeat_within_window_is_dropped() {
        let env = TestEnv::default();
        let mut view = RoomView::new(DedupConfig::default());

        InboundRouter.route(&env, &mut view, Some("alice"), BOB_HI);
        env.advance(Duration::from_secs(2));
        let actions = InboundRouter.route(&env, &mut view, Some("alice"), BOB_HI);

        assert!(actions.is_empty());
        assert_eq!(view.messages().len(), 1);
    }

    #[test]
    fn own_frames_are_dropped() {
        let env = TestEnv::default();
        let mut view = RoomView::new(DedupConfig::default());

        let actions = InboundRouter.route(&env, &mut view, Some("bob"), BOB_HI);
        assert!(actions.is_empty());
        assert!(view.messages().is_empty());
    }

    #[test]
    fn non_chat_frames_are_dropped() {
        let env = TestEnv::default();
        let mut view = RoomView::new(DedupConfig::default());

        for frame in [r#"{"type":"PING"}"#, r#"{"type":"user_joined","username":"bob"}"#, "{", ""] {
            assert!(InboundRouter.route(&env, &mut view, Some("alice"), frame).is_empty());
        }
        assert!(view.messages().is_empty());
    }

    #[test]
    fn scrolled_away_viewer_is_not_moved() {
        let env = TestEnv::default();
        let mut view = RoomView::new(DedupConfig::default());
        view.set_at_bottom(false);

        let actions = InboundRouter.route(&env, &mut view, Some("alice"), BOB_HI);
        assert_eq!(actions.len(), 1);
        assert!(matches!(actions[0], ClientAction::MessageAppended(_)));
    }

    #[test]
    fn missing_sender_is_unknown() {
        let env = TestEnv::default();
        let mut view = RoomView::new(DedupConfig::default());

        InboundRouter.route(&env, &mut view, Some("alice"), r#"{"type":"chat_message","message":"yo"}"#);
        assert_eq!(view.messages().as_slice()[0].sender, "Unknown");
    }
}

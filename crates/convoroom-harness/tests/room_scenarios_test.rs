//! End-to-end room scenarios against the simulated host.
//!
//! Every test runs with the standard invariant registry, so each step also
//! checks that the UI projection stays consistent with the client.

use std::time::Duration;

use convoroom_client::{ClientAction, NoticeKind};
use convoroom_core::{channel::ChannelState, error::HttpError, message::AI_SENDER};
use convoroom_harness::{InvariantRegistry, SimHost};
use convoroom_proto::CloseCode;
use serde_json::json;

fn host() -> SimHost {
    SimHost::new(7).with_invariants(InvariantRegistry::standard())
}

fn pair(sender: &str, text: &str) -> (String, String) {
    (sender.to_string(), text.to_string())
}

fn history_body(records: &[(&str, &str, &str)]) -> Vec<u8> {
    let messages: Vec<_> = records
        .iter()
        .map(|(sender, message, timestamp)| {
            json!({ "sender": sender, "message": message, "timestamp": timestamp })
        })
        .collect();
    json!({ "messages": messages }).to_string().into_bytes()
}

#[test]
fn join_announces_identity_on_open() {
    let mut host = host();
    host.identify("alice").unwrap();
    let actions = host.enter("lobby").unwrap();

    assert!(actions.iter().any(|a| matches!(a, ClientAction::FetchHistory { url, .. }
        if url == "http://backend.test/api/get_chat_history/lobby/")));
    assert!(!host.is_connected());

    host.open().unwrap();
    assert!(host.is_connected());
    assert_eq!(host.frames().len(), 1);
    insta::assert_snapshot!(host.frames()[0].1, @r#"{"type":"JOIN","username":"alice","roomId":"lobby"}"#);
}

#[test]
fn entering_before_identity_waits_for_it() {
    let mut host = host();
    host.enter("lobby").unwrap();
    assert!(host.opened_channels().is_empty());

    host.identify("alice").unwrap();
    assert_eq!(host.opened_channels().len(), 1);
}

#[test]
fn send_echoes_before_any_response() {
    let mut host = host();
    host.join("alice", "lobby").unwrap();

    let actions = host.send("hello").unwrap();

    assert_eq!(host.transcript(), vec![pair("alice", "hello")]);
    assert!(host.is_typing());
    assert!(matches!(actions.first(), Some(ClientAction::MessageAppended(m)) if m.text == "hello"));
    assert!(actions.contains(&ClientAction::ScrollToBottom));

    let broadcast = &host.frames().last().unwrap().1;
    insta::assert_snapshot!(broadcast, @r#"{"type":"chat_message","message":"hello","roomId":"lobby","username":"alice"}"#);

    let compute = host.pending_compute().next().unwrap();
    assert_eq!(compute.url, "http://backend.test/api/data/");
    insta::assert_snapshot!(compute.body, @r#"{"message":"hello","roomId":"lobby","username":"alice"}"#);
}

#[test]
fn send_is_ignored_while_disconnected() {
    let mut host = host();
    host.identify("alice").unwrap();
    host.enter("lobby").unwrap();

    assert!(host.send("hello").unwrap().is_empty());
    assert!(host.displayed().is_empty());
    assert_eq!(host.pending_compute().count(), 0);
}

#[test]
fn blank_send_is_ignored() {
    let mut host = host();
    host.join("alice", "lobby").unwrap();
    assert!(host.send("   \n").unwrap().is_empty());
}

#[test]
fn second_send_waits_for_first_reply() {
    let mut host = host();
    host.join("alice", "lobby").unwrap();
    host.send("one").unwrap();

    assert!(host.send("two").unwrap().is_empty());
    assert_eq!(host.pending_compute().count(), 1);

    host.reply("ok").unwrap();
    host.send("two").unwrap();
    assert_eq!(host.pending_compute().count(), 1);
}

#[test]
fn repeated_peer_frame_within_window_shows_once() {
    let mut host = host();
    host.join("alice", "lobby").unwrap();

    host.chat("bob", "hi").unwrap();
    host.advance(Duration::from_secs(2)).unwrap();
    let repeat = host.chat("bob", "hi").unwrap();

    assert!(repeat.is_empty());
    assert_eq!(host.transcript(), vec![pair("bob", "hi")]);
}

#[test]
fn repeated_peer_frame_after_window_shows_twice() {
    let mut host = host();
    host.join("alice", "lobby").unwrap();

    host.chat("bob", "hi").unwrap();
    host.advance(Duration::from_secs(5)).unwrap();
    host.chat("bob", "hi").unwrap();

    assert_eq!(host.transcript(), vec![pair("bob", "hi"), pair("bob", "hi")]);
}

#[test]
fn own_broadcast_is_not_shown_twice() {
    let mut host = host();
    host.join("alice", "lobby").unwrap();
    host.send("hello").unwrap();

    assert!(host.chat("alice", "hello").unwrap().is_empty());
    assert_eq!(host.transcript(), vec![pair("alice", "hello")]);
}

#[test]
fn unknown_and_malformed_frames_are_ignored() {
    let mut host = host();
    host.join("alice", "lobby").unwrap();

    assert!(host.frame(r#"{"type":"presence","username":"bob"}"#).unwrap().is_empty());
    assert!(host.frame("not json").unwrap().is_empty());
    assert!(host.frame(r#"{"type":"PING"}"#).unwrap().is_empty());
    assert!(host.displayed().is_empty());
}

#[test]
fn frame_without_username_is_attributed_to_unknown() {
    let mut host = host();
    host.join("alice", "lobby").unwrap();
    host.frame(r#"{"type":"chat_message","message":"who am i"}"#).unwrap();
    assert_eq!(host.transcript(), vec![pair("Unknown", "who am i")]);
}

#[test]
fn inbound_scrolls_only_at_bottom() {
    let mut host = host();
    host.join("alice", "lobby").unwrap();

    host.scroll(false).unwrap();
    let actions = host.chat("bob", "while reading").unwrap();
    assert!(!actions.contains(&ClientAction::ScrollToBottom));

    host.scroll(true).unwrap();
    let actions = host.chat("bob", "back at bottom").unwrap();
    assert!(actions.contains(&ClientAction::ScrollToBottom));
}

#[test]
fn own_send_scrolls_even_when_scrolled_up() {
    let mut host = host();
    host.join("alice", "lobby").unwrap();
    host.scroll(false).unwrap();

    let actions = host.send("hello").unwrap();
    assert!(actions.contains(&ClientAction::ScrollToBottom));
}

#[test]
fn code_reply_carries_render_hints() {
    let mut host = host();
    host.join("alice", "lobby").unwrap();
    host.send("show me").unwrap();

    let actions = host.reply("```js\nconsole.log(1)\n```").unwrap();

    assert_eq!(actions[0], ClientAction::TypingChanged { active: false });
    let replies: Vec<_> = host.displayed().iter().filter(|m| m.is_computed_reply).collect();
    assert_eq!(replies.len(), 1);

    let reply = replies[0];
    assert_eq!(reply.sender, AI_SENDER);
    assert!(reply.render_hints.is_code);
    assert_eq!(reply.render_hints.language.as_deref(), Some("js"));
    insta::assert_debug_snapshot!(reply.render_hints.segments, @r#"
    [
        Code {
            language: "js",
            content: "console.log(1)",
        },
    ]
    "#);
    assert!(!host.is_typing());
}

#[test]
fn reply_without_response_inserts_nothing() {
    let mut host = host();
    host.join("alice", "lobby").unwrap();
    host.send("hello").unwrap();

    host.answer_compute(Ok(br#"{}"#.to_vec())).unwrap();

    assert_eq!(host.transcript(), vec![pair("alice", "hello")]);
    assert!(!host.is_typing());
    assert!(host.notices().is_empty());
}

#[test]
fn compute_failure_rolls_back_echo() {
    let mut host = host();
    host.join("alice", "lobby").unwrap();
    host.chat("bob", "before").unwrap();
    host.send("hello").unwrap();

    let actions = host.answer_compute(Err(HttpError::Status { status: 500 })).unwrap();

    assert!(actions.iter().any(|a| matches!(a, ClientAction::MessageRemoved { .. })));
    assert_eq!(host.transcript(), vec![pair("bob", "before")]);
    assert!(!host.is_typing());

    let notices = host.notices().notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::SendFailed);
    assert_eq!(notices[0].text, "Failed to send message. Please try again.");
}

#[test]
fn malformed_compute_body_rolls_back_echo() {
    let mut host = host();
    host.join("alice", "lobby").unwrap();
    host.send("hello").unwrap();

    host.answer_compute(Ok(b"<html>".to_vec())).unwrap();

    assert!(host.displayed().is_empty());
    assert_eq!(host.notices().len(), 1);
}

#[test]
fn send_survives_abnormal_close_and_reconnect() {
    let mut host = host();
    host.join("alice", "lobby").unwrap();
    host.send("hello").unwrap();

    host.close(CloseCode::ABNORMAL).unwrap();
    assert!(!host.is_connected());
    assert_eq!(host.transcript(), vec![pair("alice", "hello")]);

    host.run_for(Duration::from_secs(3), Duration::from_millis(500)).unwrap();
    assert_eq!(host.opened_channels().len(), 2);
    host.open().unwrap();
    assert!(host.is_connected());
    assert_eq!(host.transcript(), vec![pair("alice", "hello")]);

    host.reply("hi alice").unwrap();
    assert_eq!(host.transcript(), vec![pair("alice", "hello"), pair(AI_SENDER, "hi alice")]);
}

#[test]
fn reconnect_delays_grow_by_backoff_factor() {
    let mut host = host();
    host.join("alice", "lobby").unwrap();
    host.close(CloseCode::ABNORMAL).unwrap();

    for (attempt, delay_ms) in [3000_u64, 4500, 6750, 10_125, 15_187].into_iter().enumerate() {
        let opened = host.opened_channels().len();

        host.advance(Duration::from_millis(delay_ms - 1)).unwrap();
        assert_eq!(host.opened_channels().len(), opened, "attempt {attempt} fired early");

        host.advance(Duration::from_millis(2)).unwrap();
        assert_eq!(host.opened_channels().len(), opened + 1, "attempt {attempt} did not fire");

        host.fail("connection refused").unwrap();
    }

    assert!(host.client().is_exhausted());
    assert_eq!(host.client().reconnect_attempt(), 5);

    host.run_for(Duration::from_secs(120), Duration::from_secs(1)).unwrap();
    assert_eq!(host.opened_channels().len(), 6);
    assert_eq!(host.client().connection_state(), ChannelState::Disconnected);
}

#[test]
fn successful_open_resets_backoff() {
    let mut host = host();
    host.join("alice", "lobby").unwrap();

    host.close(CloseCode::ABNORMAL).unwrap();
    host.advance(Duration::from_secs(3)).unwrap();
    host.open().unwrap();
    assert_eq!(host.client().reconnect_attempt(), 0);

    host.close(CloseCode(1011)).unwrap();
    assert_eq!(host.client().reconnect_attempt(), 1);
    host.advance(Duration::from_secs(3)).unwrap();
    assert_eq!(host.opened_channels().len(), 3);
}

#[test]
fn intentional_close_does_not_reconnect() {
    for code in [CloseCode::NORMAL, CloseCode::GOING_AWAY] {
        let mut host = host();
        host.join("alice", "lobby").unwrap();
        host.close(code).unwrap();

        host.run_for(Duration::from_secs(60), Duration::from_secs(1)).unwrap();
        assert_eq!(host.opened_channels().len(), 1, "code {code}");
        assert!(!host.client().is_reconnecting());
    }
}

#[test]
fn stalled_connect_is_aborted_and_retried() {
    let mut host = host();
    host.identify("alice").unwrap();
    host.enter("lobby").unwrap();
    let first = host.opened_channels()[0].0;

    host.run_for(Duration::from_secs(10), Duration::from_secs(1)).unwrap();
    assert_eq!(host.aborted_channels(), &[first]);

    host.advance(Duration::from_secs(3)).unwrap();
    assert_eq!(host.opened_channels().len(), 2);
}

#[test]
fn keepalive_every_thirty_seconds() {
    let mut host = host();
    host.join("alice", "lobby").unwrap();
    let after_join = host.frames().len();

    host.run_for(Duration::from_secs(29), Duration::from_secs(1)).unwrap();
    assert_eq!(host.frames().len(), after_join);

    host.advance(Duration::from_secs(1)).unwrap();
    assert_eq!(host.frames().len(), after_join + 1);
    assert_eq!(host.frames().last().unwrap().1, r#"{"type":"PING"}"#);
}

#[test]
fn history_is_prepended_and_deduplicated() {
    let mut host = host();
    host.join("alice", "lobby").unwrap();
    host.chat("bob", "hi").unwrap();

    let body = history_body(&[
        ("carol", "welcome", "2024-05-01T09:50:00Z"),
        ("bob", "hi", "2024-05-01T09:59:58Z"),
    ]);
    let actions = host.answer_history(Ok(body)).unwrap();

    assert!(actions.contains(&ClientAction::ScrollToBottom));
    assert_eq!(host.transcript(), vec![pair("carol", "welcome"), pair("bob", "hi")]);
}

#[test]
fn history_failure_leaves_transcript_empty() {
    let mut host = host();
    host.join("alice", "lobby").unwrap();

    let actions = host.answer_history(Err(HttpError::Status { status: 404 })).unwrap();
    assert!(actions.is_empty());
    assert!(host.displayed().is_empty());

    let mut host = self::host();
    host.join("alice", "lobby").unwrap();
    host.answer_history(Ok(br#"{"rows":[]}"#.to_vec())).unwrap();
    assert!(host.displayed().is_empty());
}

#[test]
fn freshly_created_room_skips_history() {
    let mut host = host();
    host.identify("alice").unwrap();
    host.create_room("fresh").unwrap();
    host.advance(Duration::from_millis(500)).unwrap();

    let actions = host.enter("fresh").unwrap();
    assert!(!actions.iter().any(|a| matches!(a, ClientAction::FetchHistory { .. })));
    assert!(host.client().recent_rooms().is_empty());
}

#[test]
fn older_created_room_fetches_history() {
    let mut host = host();
    host.identify("alice").unwrap();
    host.create_room("older").unwrap();
    host.advance(Duration::from_millis(3000)).unwrap();

    let actions = host.enter("older").unwrap();
    assert!(actions.iter().any(|a| matches!(a, ClientAction::FetchHistory { .. })));
}

#[test]
fn temporary_room_skips_history() {
    let mut host = host();
    host.identify("alice").unwrap();
    let actions = host.enter("temp_scratch").unwrap();
    assert!(!actions.iter().any(|a| matches!(a, ClientAction::FetchHistory { .. })));
}

#[test]
fn switching_rooms_discards_late_results() {
    let mut host = host();
    host.join("alice", "lobby").unwrap();
    host.send("hello").unwrap();
    let (history, compute) = host.forget_requests();

    host.enter("garden").unwrap();
    host.open().unwrap();
    assert!(host.displayed().is_empty());
    assert!(!host.is_typing());

    let stale_history = convoroom_client::ClientEvent::HistoryFetched {
        request: history[0].0,
        result: Ok(history_body(&[("bob", "old room", "2024-05-01T09:00:00Z")])),
    };
    assert!(host.handle(stale_history).unwrap().is_empty());

    let stale_reply = convoroom_client::ClientEvent::ComputeCompleted {
        request: compute[0].request,
        result: Ok(br#"{"response":"late"}"#.to_vec()),
    };
    assert!(host.handle(stale_reply).unwrap().is_empty());
    assert!(host.displayed().is_empty());
}

#[test]
fn leaving_closes_channel_normally() {
    let mut host = host();
    host.join("alice", "lobby").unwrap();
    host.chat("bob", "hi").unwrap();

    let actions = host.leave().unwrap();

    assert!(actions.contains(&ClientAction::MessagesReplaced(Vec::new())));
    let (_, code, reason) = &host.closed_channels()[0];
    assert_eq!(*code, CloseCode::NORMAL);
    assert_eq!(reason, "Component unmounted");
    assert!(!host.is_connected());

    host.close(CloseCode::NORMAL).unwrap();
    host.run_for(Duration::from_secs(30), Duration::from_secs(1)).unwrap();
    assert_eq!(host.opened_channels().len(), 1);
}

#[test]
fn frames_from_replaced_channel_are_ignored() {
    let mut host = host();
    host.join("alice", "lobby").unwrap();
    let old = host.opened_channels()[0].0;

    host.enter("garden").unwrap();
    host.open().unwrap();

    let event = convoroom_client::ClientEvent::FrameReceived {
        handle: old,
        text: json!({ "type": "chat_message", "username": "bob", "message": "hi" }).to_string(),
    };
    assert!(host.handle(event).unwrap().is_empty());

    let close = convoroom_client::ClientEvent::ChannelClosed { handle: old, code: CloseCode::ABNORMAL };
    assert!(host.handle(close).unwrap().is_empty());
    assert!(host.is_connected());
}

#[test]
fn peer_computed_reply_is_deduplicated_against_local() {
    let mut host = host();
    host.join("alice", "lobby").unwrap();
    host.send("question").unwrap();
    host.reply("answer").unwrap();

    host.advance(Duration::from_secs(1)).unwrap();
    assert!(host.chat(AI_SENDER, "answer").unwrap().is_empty());
    assert_eq!(host.displayed().iter().filter(|m| m.sender == AI_SENDER).count(), 1);
}

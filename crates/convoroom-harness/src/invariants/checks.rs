//! Standard invariant checks.

use std::collections::HashMap;

use super::{HostSnapshot, Invariant, InvariantResult, Violation};

/// Live deliveries of one content key are at least a dedupe window apart.
///
/// History records are excluded: they carry persisted timestamps and may
/// land next to a live message once the key has been swept.
pub struct UniqueLiveContent;

impl Invariant for UniqueLiveContent {
    fn name(&self) -> &'static str {
        "unique_live_content"
    }

    fn check(&self, state: &HostSnapshot) -> InvariantResult {
        let window = time::Duration::try_from(state.dedupe_window).unwrap_or(time::Duration::MAX);
        let mut last_seen = HashMap::new();

        for message in &state.live {
            if let Some(previous) = last_seen.insert(message.content_key(), message.timestamp) {
                let gap = message.timestamp - previous;
                if gap < window {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "{:?} from {} shown twice {gap} apart",
                            message.text, message.sender
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// The UI's message list equals the client's sequence.
pub struct DisplayMirrorsClient;

impl Invariant for DisplayMirrorsClient {
    fn name(&self) -> &'static str {
        "display_mirrors_client"
    }

    fn check(&self, state: &HostSnapshot) -> InvariantResult {
        let displayed: Vec<_> = state.displayed.iter().map(|m| &m.id).collect();
        let client: Vec<_> = state.client_messages.iter().map(|m| &m.id).collect();

        if displayed != client {
            return Err(Violation {
                invariant: self.name(),
                message: format!("ui shows {displayed:?}, client holds {client:?}"),
            });
        }
        Ok(())
    }
}

/// The connection indicator reflects the channel state.
pub struct ConnectionFlagMatches;

impl Invariant for ConnectionFlagMatches {
    fn name(&self) -> &'static str {
        "connection_flag_matches"
    }

    fn check(&self, state: &HostSnapshot) -> InvariantResult {
        if state.ui_connected != state.client_connected {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "ui connected={}, channel connected={}",
                    state.ui_connected, state.client_connected
                ),
            });
        }
        Ok(())
    }
}

/// The typing indicator is on exactly while a compute call is pending.
pub struct TypingMatchesInFlight;

impl Invariant for TypingMatchesInFlight {
    fn name(&self) -> &'static str {
        "typing_matches_in_flight"
    }

    fn check(&self, state: &HostSnapshot) -> InvariantResult {
        if state.ui_typing != state.client_sending {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "ui typing={}, send in flight={}",
                    state.ui_typing, state.client_sending
                ),
            });
        }
        Ok(())
    }
}

/// Reconnect attempts never exceed the configured limit.
pub struct ReconnectBounded;

impl Invariant for ReconnectBounded {
    fn name(&self) -> &'static str {
        "reconnect_bounded"
    }

    fn check(&self, state: &HostSnapshot) -> InvariantResult {
        if state.reconnect_attempt > state.max_reconnect_attempts {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "attempt {} exceeds limit {}",
                    state.reconnect_attempt, state.max_reconnect_attempts
                ),
            });
        }
        Ok(())
    }
}

/// Frames are only ever written to the newest channel handle.
pub struct SendsTargetCurrentChannel;

impl Invariant for SendsTargetCurrentChannel {
    fn name(&self) -> &'static str {
        "sends_target_current_channel"
    }

    fn check(&self, state: &HostSnapshot) -> InvariantResult {
        if state.stale_sends > 0 {
            return Err(Violation {
                invariant: self.name(),
                message: format!("{} frame(s) sent to a replaced channel", state.stale_sends),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use convoroom_core::message::Message;
    use time::macros::datetime;

    use super::*;
    use crate::SimEnv;

    fn message(env: &SimEnv, sender: &str, text: &str, offset_ms: i64) -> Message {
        let at = datetime!(2024-05-01 10:00:00 UTC) + time::Duration::milliseconds(offset_ms);
        Message::compose(env, sender, text, at)
    }

    #[test]
    fn live_duplicates_inside_window_violate() {
        let env = SimEnv::with_seed(7);
        let mut state = HostSnapshot::empty();
        state.live = vec![message(&env, "bob", "hi", 0), message(&env, "bob", "hi", 2000)];
        assert!(UniqueLiveContent.check(&state).is_err());

        state.live = vec![message(&env, "bob", "hi", 0), message(&env, "bob", "hi", 5000)];
        assert!(UniqueLiveContent.check(&state).is_ok());
    }

    #[test]
    fn different_senders_are_different_content() {
        let env = SimEnv::with_seed(7);
        let mut state = HostSnapshot::empty();
        state.live = vec![message(&env, "bob", "hi", 0), message(&env, "eve", "hi", 10)];
        assert!(UniqueLiveContent.check(&state).is_ok());
    }

    #[test]
    fn display_must_match_client_order() {
        let env = SimEnv::with_seed(7);
        let mut state = HostSnapshot::empty();
        let a = message(&env, "bob", "one", 0);
        let b = message(&env, "bob", "two", 10);
        state.displayed = vec![a.clone(), b.clone()];
        state.client_messages = vec![b, a];
        assert!(DisplayMirrorsClient.check(&state).is_err());
    }

    #[test]
    fn attempts_over_limit_violate() {
        let mut state = HostSnapshot::empty();
        state.max_reconnect_attempts = 5;
        state.reconnect_attempt = 5;
        assert!(ReconnectBounded.check(&state).is_ok());
        state.reconnect_attempt = 6;
        assert!(ReconnectBounded.check(&state).is_err());
    }
}

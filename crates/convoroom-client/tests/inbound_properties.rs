//! Property tests for the inbound router against a reference model of the
//! dedupe window.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use convoroom_client::{ClientAction, Environment, InboundRouter, RoomView};
use convoroom_core::dedup::DedupConfig;
use proptest::prelude::*;
use time::OffsetDateTime;

#[derive(Clone)]
struct TestEnv {
    base: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl TestEnv {
    fn new() -> Self {
        Self { base: Instant::now(), elapsed: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    fn advance(&self, by: Duration) {
        *self.elapsed.lock().unwrap() += by;
    }
}

impl Environment for TestEnv {
    type Instant = Instant;

    fn now(&self) -> Instant {
        self.base + *self.elapsed.lock().unwrap()
    }

    fn wall_clock(&self) -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH + *self.elapsed.lock().unwrap()
    }

    fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        async {}
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        buffer.fill(3);
    }
}

const SENDERS: &[&str] = &["alice", "bob", "AI"];
const TEXTS: &[&str] = &["hi", "hello", "ok"];

// Senders and texts are plain ASCII words, no escaping needed.
fn frame(sender: &str, text: &str) -> String {
    format!(r#"{{"type":"chat_message","username":"{sender}","message":"{text}"}}"#)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_router_matches_window_model(
        deliveries in prop::collection::vec(
            (prop::sample::select(SENDERS), prop::sample::select(TEXTS), 0_u64..4_000),
            1..40,
        ),
    ) {
        let env = TestEnv::new();
        let mut view = RoomView::new(DedupConfig::default());
        let window = Duration::from_secs(5);

        let mut model: HashMap<(&str, &str), Duration> = HashMap::new();
        let mut now = Duration::ZERO;
        let mut expected = 0;

        for (sender, text, gap) in deliveries {
            env.advance(Duration::from_millis(gap));
            now += Duration::from_millis(gap);

            let accept = model.get(&(sender, text)).is_none_or(|last| now - *last >= window);
            if accept {
                model.insert((sender, text), now);
                expected += 1;
            }

            let actions = InboundRouter.route(&env, &mut view, Some("carol"), &frame(sender, text));
            let appended = actions.iter().any(|a| matches!(a, ClientAction::MessageAppended(_)));
            prop_assert_eq!(appended, accept);
        }

        prop_assert_eq!(view.messages().len(), expected);
    }

    #[test]
    fn prop_own_frames_never_appear(
        texts in prop::collection::vec(prop::sample::select(TEXTS), 1..20),
    ) {
        let env = TestEnv::new();
        let mut view = RoomView::new(DedupConfig::default());

        for text in texts {
            env.advance(Duration::from_secs(6));
            let actions = InboundRouter.route(&env, &mut view, Some("alice"), &frame("alice", text));
            prop_assert!(actions.is_empty());
        }
        prop_assert!(view.messages().is_empty());
    }
}

//! Deterministic environment for unit tests.

use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use convoroom_core::env::Environment;
use time::OffsetDateTime;

/// 2024-05-01 10:00:00 UTC.
const EPOCH_OFFSET: Duration = Duration::from_secs(1_714_557_600);

/// Manually advanced clock with a counting RNG.
#[derive(Clone)]
pub(crate) struct TestEnv {
    base: Instant,
    elapsed: Arc<Mutex<Duration>>,
    counter: Arc<AtomicU64>,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self {
            base: Instant::now(),
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl TestEnv {
    pub(crate) fn advance(&self, by: Duration) {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }

    fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Environment for TestEnv {
    type Instant = Instant;

    fn now(&self) -> Instant {
        self.base + self.elapsed()
    }

    fn wall_clock(&self) -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH + EPOCH_OFFSET + self.elapsed()
    }

    fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        async {}
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = (n as u8).wrapping_mul(37).wrapping_add(i as u8);
        }
    }
}

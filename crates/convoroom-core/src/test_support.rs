//! Fixed-clock environment for unit tests.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use time::{OffsetDateTime, macros::datetime};

use crate::env::Environment;

/// Wall clock pinned to 2024-05-01 10:00:00 UTC with a counting RNG.
#[derive(Clone, Default)]
pub(crate) struct TestEnv {
    counter: Arc<AtomicU64>,
}

impl Environment for TestEnv {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_clock(&self) -> OffsetDateTime {
        datetime!(2024-05-01 10:00:00 UTC)
    }

    fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        async {}
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = (n as u8).wrapping_add(i as u8).wrapping_mul(31);
        }
    }
}

//! Virtual-time environment.
//!
//! Time only moves when a test calls [`SimEnv::advance`]. The wall clock is a
//! fixed epoch plus elapsed virtual time, so message timestamps and dedupe
//! decisions are reproducible. Randomness comes from a seeded ChaCha stream.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use convoroom_core::env::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use time::{OffsetDateTime, macros::datetime};

/// Wall-clock time at virtual instant zero.
const EPOCH: OffsetDateTime = datetime!(2024-05-01 10:00:00 UTC);

/// A point in virtual time, measured from simulation start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimInstant(pub Duration);

impl std::ops::Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

/// Deterministic environment. Clones share one clock and one RNG.
#[derive(Debug, Clone)]
pub struct SimEnv {
    elapsed: Arc<Mutex<Duration>>,
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl SimEnv {
    /// Create an environment whose RNG stream is fixed by `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
        }
    }

    /// Move virtual time forward.
    pub fn advance(&self, by: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(PoisonError::into_inner);
        *elapsed += by;
    }

    /// Virtual time since start.
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        SimInstant(self.elapsed())
    }

    fn wall_clock(&self) -> OffsetDateTime {
        EPOCH + self.elapsed()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        self.advance(duration);
        async {}
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }
}

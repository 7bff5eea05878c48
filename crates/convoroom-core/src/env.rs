//! Environment abstraction for deterministic testing.
//!
//! Decouples synchronization logic from system resources (time, randomness).
//! Enables deterministic simulation with a virtual clock and seeded RNG, and
//! production use with real system resources.

use std::time::Duration;

use time::OffsetDateTime;

/// Abstract environment providing time, randomness, and async primitives.
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - Methods are infallible except in exceptional circumstances (e.g., OS
///   entropy exhaustion, incorrect simulation setup)
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`, while simulation
    /// environments use virtual time.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current monotonic time. Drives timers (connect timeout, heartbeat,
    /// reconnect backoff).
    fn now(&self) -> Self::Instant;

    /// Current wall-clock time. Stamps messages and drives the dedupe window,
    /// which compares message timestamps.
    fn wall_clock(&self) -> OffsetDateTime;

    /// Sleeps for the specified duration.
    ///
    /// This is the ONLY async method in the trait, and it should only be used
    /// by driver code (not synchronization logic).
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    ///
    /// Given the same RNG seed, this produces the same sequence of bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}

//! Content-key duplicate filter.
//!
//! Decides whether a candidate message has been seen recently. A key seen
//! within the dedupe window of its last recorded instant is a duplicate; a
//! key seen after the window has elapsed is a new utterance. Duplicates do
//! not refresh the recorded instant.
//!
//! This is a heuristic: two genuinely distinct messages with the same sender
//! and text inside the window collapse into one.
//!
//! Instants are message timestamps, not arrival order, so the window applies
//! in both directions. A history record persisted slightly before a live
//! copy of the same message is inside the window; one persisted long before
//! it is a separate utterance.

use std::{collections::HashMap, time::Duration};

use time::OffsetDateTime;

use crate::message::ContentKey;

/// Two deliveries of one key closer than this are the same message.
pub const DEFAULT_DEDUPE_WINDOW: Duration = Duration::from_secs(5);

/// Entries older than this are evicted by [`Deduplicator::sweep`].
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(10);

/// Deduplicator configuration
#[derive(Debug, Clone)]
pub struct DedupConfig {
    /// Window inside which a repeated key is rejected
    pub window: Duration,
    /// Sweep cadence and eviction age
    pub cleanup_interval: Duration,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self { window: DEFAULT_DEDUPE_WINDOW, cleanup_interval: DEFAULT_CLEANUP_INTERVAL }
    }
}

/// Key/time-window store of recently seen content.
#[derive(Debug, Clone)]
pub struct Deduplicator {
    window: time::Duration,
    cleanup_interval: time::Duration,
    seen: HashMap<ContentKey, OffsetDateTime>,
    last_sweep: Option<OffsetDateTime>,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new(DedupConfig::default())
    }
}

impl Deduplicator {
    /// Create an empty deduplicator.
    pub fn new(config: DedupConfig) -> Self {
        Self {
            window: to_signed(config.window),
            cleanup_interval: to_signed(config.cleanup_interval),
            seen: HashMap::new(),
            last_sweep: None,
        }
    }

    /// Accept `key` at `now` unless it was accepted within the window.
    ///
    /// Accepting records the later of `now` and the previous instant, so an
    /// old history record never rewinds a key.
    pub fn should_accept(&mut self, key: &ContentKey, now: OffsetDateTime) -> bool {
        let latest = match self.seen.get(key) {
            Some(&last) if (now - last).abs() < self.window => return false,
            Some(&last) => last.max(now),
            None => now,
        };

        self.seen.insert(key.clone(), latest);
        true
    }

    /// Drop `key` so its next sighting is accepted.
    ///
    /// Used when the only displayed message with this key is withdrawn.
    pub fn forget(&mut self, key: &ContentKey) -> bool {
        self.seen.remove(key).is_some()
    }

    /// Evict entries last seen more than the cleanup interval before `now`.
    ///
    /// Returns the number of evicted entries.
    pub fn sweep(&mut self, now: OffsetDateTime) -> usize {
        let before = self.seen.len();
        let max_age = self.cleanup_interval;
        self.seen.retain(|_, last| now - *last <= max_age);
        self.last_sweep = Some(now);

        let evicted = before - self.seen.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.seen.len(), "dedupe sweep");
        }
        evicted
    }

    /// Sweep if a cleanup interval has passed since the last sweep.
    pub fn maybe_sweep(&mut self, now: OffsetDateTime) -> usize {
        match self.last_sweep {
            Some(last) if now - last < self.cleanup_interval => 0,
            Some(_) => self.sweep(now),
            None => {
                self.last_sweep = Some(now);
                0
            },
        }
    }

    /// Forget every key.
    pub fn clear(&mut self) {
        self.seen.clear();
        self.last_sweep = None;
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// True if no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

fn to_signed(duration: Duration) -> time::Duration {
    time::Duration::try_from(duration).unwrap_or(time::Duration::MAX)
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn t0() -> OffsetDateTime {
        datetime!(2024-05-01 10:00:00 UTC)
    }

    #[test]
    fn first_sighting_is_accepted() {
        let mut dedup = Deduplicator::default();
        assert!(dedup.should_accept(&ContentKey::new("bob", "hi"), t0()));
        assert_eq!(dedup.len(), 1);
    }

    #[test]
    fn repeat_within_window_is_rejected() {
        let mut dedup = Deduplicator::default();
        let key = ContentKey::new("bob", "hi");

        assert!(dedup.should_accept(&key, t0()));
        assert!(!dedup.should_accept(&key, t0() + Duration::from_secs(2)));
        assert!(!dedup.should_accept(&key, t0() + Duration::from_millis(4999)));
    }

    #[test]
    fn repeat_after_window_is_new_utterance() {
        let mut dedup = Deduplicator::default();
        let key = ContentKey::new("bob", "hi");

        assert!(dedup.should_accept(&key, t0()));
        assert!(dedup.should_accept(&key, t0() + Duration::from_secs(5)));
    }

    #[test]
    fn rejection_does_not_extend_window() {
        let mut dedup = Deduplicator::default();
        let key = ContentKey::new("bob", "hi");

        assert!(dedup.should_accept(&key, t0()));
        assert!(!dedup.should_accept(&key, t0() + Duration::from_secs(4)));
        assert!(dedup.should_accept(&key, t0() + Duration::from_secs(6)));
    }

    #[test]
    fn slightly_earlier_timestamp_is_inside_window() {
        let mut dedup = Deduplicator::default();
        let key = ContentKey::new("bob", "hi");

        assert!(dedup.should_accept(&key, t0()));
        assert!(!dedup.should_accept(&key, t0() - Duration::from_secs(1)));
        assert!(!dedup.should_accept(&key, t0() - Duration::from_millis(4999)));
    }

    #[test]
    fn much_earlier_timestamp_is_new_utterance() {
        let mut dedup = Deduplicator::default();
        let key = ContentKey::new("bob", "hi");

        assert!(dedup.should_accept(&key, t0()));
        assert!(dedup.should_accept(&key, t0() - Duration::from_secs(7 * 24 * 3600)));

        // The old record must not rewind the key behind the live copy.
        assert!(!dedup.should_accept(&key, t0() + Duration::from_secs(2)));
    }

    #[test]
    fn forgotten_key_is_accepted_again() {
        let mut dedup = Deduplicator::default();
        let key = ContentKey::new("alice", "hello");

        assert!(dedup.should_accept(&key, t0()));
        assert!(dedup.forget(&key));
        assert!(!dedup.forget(&key));
        assert!(dedup.should_accept(&key, t0() + Duration::from_secs(1)));
    }

    #[test]
    fn keys_are_independent() {
        let mut dedup = Deduplicator::default();
        assert!(dedup.should_accept(&ContentKey::new("bob", "hi"), t0()));
        assert!(dedup.should_accept(&ContentKey::new("carol", "hi"), t0()));
        assert!(dedup.should_accept(&ContentKey::new("bob", "hey"), t0()));
    }

    #[test]
    fn sweep_evicts_only_stale_entries() {
        let mut dedup = Deduplicator::default();
        dedup.should_accept(&ContentKey::new("bob", "old"), t0());
        dedup.should_accept(&ContentKey::new("bob", "new"), t0() + Duration::from_secs(8));

        let evicted = dedup.sweep(t0() + Duration::from_secs(11));
        assert_eq!(evicted, 1);
        assert_eq!(dedup.len(), 1);
    }

    #[test]
    fn maybe_sweep_runs_once_per_interval() {
        let mut dedup = Deduplicator::default();
        dedup.should_accept(&ContentKey::new("bob", "hi"), t0());

        assert_eq!(dedup.maybe_sweep(t0()), 0);
        assert_eq!(dedup.maybe_sweep(t0() + Duration::from_secs(9)), 0);
        assert_eq!(dedup.maybe_sweep(t0() + Duration::from_secs(11)), 1);
        assert!(dedup.is_empty());
    }
}

//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties that must always hold during execution. Unlike
//! example-based tests that check specific scenarios, invariants verify
//! behavioral properties across all possible event orderings.
//!
//! # Architecture
//!
//! The host projects the client's actions onto a model of the UI (displayed
//! messages, connection indicator, typing indicator) and pairs it with the
//! client's own state in a [`HostSnapshot`]. Registered [`Invariant`] checks
//! then run against the snapshot.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! registry.check_all(&host.snapshot())?;
//! ```

mod checks;
mod snapshot;

pub use checks::{
    ConnectionFlagMatches, DisplayMirrorsClient, ReconnectBounded, SendsTargetCurrentChannel,
    TypingMatchesInFlight, UniqueLiveContent,
};
pub use snapshot::HostSnapshot;

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// A property checked against host state.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against the current state.
    fn check(&self, state: &HostSnapshot) -> InvariantResult;
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InvariantRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.invariants.iter().map(|inv| inv.name()).collect();
        f.debug_struct("InvariantRegistry").field("invariants", &names).finish()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with the standard client invariants.
    ///
    /// Includes:
    /// - [`UniqueLiveContent`]: no live duplicate inside the dedupe window
    /// - [`DisplayMirrorsClient`]: UI projection equals the client sequence
    /// - [`ConnectionFlagMatches`]: indicator equals channel state
    /// - [`TypingMatchesInFlight`]: indicator equals pending compute call
    /// - [`ReconnectBounded`]: attempts never exceed the limit
    /// - [`SendsTargetCurrentChannel`]: frames only go to the newest handle
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(UniqueLiveContent);
        registry.add(DisplayMirrorsClient);
        registry.add(ConnectionFlagMatches);
        registry.add(TypingMatchesInFlight);
        registry.add(ReconnectBounded);
        registry.add(SendsTargetCurrentChannel);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against the given state.
    ///
    /// Returns `Ok(())` if all invariants hold, or all violations found.
    pub fn check_all(&self, state: &HostSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}

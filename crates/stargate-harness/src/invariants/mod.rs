//! Gate invariants.
//!
//! Properties of the protocol's observable state that hold after every input,
//! whatever sequence of glyphs, dials, aborts and timeouts led there. The
//! model-based tests check them after each operation; the simulation checks
//! them on each frame.
//!
//! # Architecture
//!
//! Checks run against a [`GateSnapshot`], the observable protocol state at
//! one instant. The [`crate::SimDriver`] runs the registry on every rendered
//! frame and records violations instead of panicking, so a test can report
//! every broken property at once.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! registry.check_all(&gate.snapshot())?;
//! ```

mod checks;

use std::fmt;

pub use checks::{
    AwaitingMatchesState, BufferWithinMode, DestinationMatchesState, IdleIsEmpty,
    LockedFollowsSequence,
};
use stargate_core::GateSnapshot;

/// Identifies an invariant in violation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvariantKind {
    /// Address length and glyph uniqueness.
    BufferWithinMode,
    /// Locked chevrons are a prefix of the mode's sequence.
    LockedFollowsSequence,
    /// Destination present exactly when a wormhole opened.
    DestinationMatchesState,
    /// Idle gate holds no attempt state.
    IdleIsEmpty,
    /// Outstanding ticket matches the state waiting on it.
    AwaitingMatchesState,
}

impl fmt::Display for InvariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Which invariant failed.
    pub invariant: InvariantKind,
    /// Description of what went wrong.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// A property of the gate that must always hold.
pub trait Invariant: Send + Sync {
    /// Invariant identity for error reporting.
    fn kind(&self) -> InvariantKind;

    /// Check the invariant against a snapshot.
    fn check(&self, state: &GateSnapshot) -> InvariantResult;
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

impl fmt::Debug for InvariantRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvariantRegistry").field("invariants", &self.kinds()).finish()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with every standard gate invariant.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(BufferWithinMode);
        registry.add(LockedFollowsSequence);
        registry.add(DestinationMatchesState);
        registry.add(IdleIsEmpty);
        registry.add(AwaitingMatchesState);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Run every invariant against `state`, collecting all violations
    /// rather than stopping at the first.
    pub fn check_all(&self, state: &GateSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<Violation> =
            self.invariants.iter().filter_map(|invariant| invariant.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Registered invariants, in check order.
    pub fn kinds(&self) -> Vec<InvariantKind> {
        self.invariants.iter().map(|invariant| invariant.kind()).collect()
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// No invariants registered.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}

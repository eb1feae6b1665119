//! Deterministic simulation harness for the Stargate gate.
//!
//! Virtual-time implementations of the app layer's [`stargate_app::Driver`]
//! for reproducible, fast end-to-end testing of the protocol, the ring and
//! the runtime wiring them together.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation for model-based
//! testing. Operations are applied to both the model and real implementation,
//! and their observable states are compared.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for every gate
//! invariant.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod fixtures;
pub mod invariants;
pub mod model;
pub mod scenario;
pub mod sim_clock;
pub mod sim_driver;

pub use invariants::{
    AwaitingMatchesState, BufferWithinMode, DestinationMatchesState, IdleIsEmpty, Invariant,
    InvariantKind, InvariantRegistry, InvariantResult, LockedFollowsSequence, Violation,
};
pub use model::{ModelGate, Operation, OperationResult, listed_destination};
pub use scenario::{RunOutcome, Simulation};
pub use sim_clock::SimInstant;
pub use sim_driver::SimDriver;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a test-friendly `tracing` subscriber.
///
/// Honors `RUST_LOG`, defaulting to `warn`. Safe to call from every test;
/// only the first call installs anything.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(filter)
        .try_init();
}

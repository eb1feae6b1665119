//! Time abstraction for deterministic testing.
//!
//! Decouples gate logic from the system clock. The state machines never read
//! time themselves: every time-dependent method takes `now` as a parameter.
//! Production drivers pass `std::time::Instant` (or `tokio::time::Instant`),
//! the simulation harness passes a virtual instant that only moves when the
//! test advances it.

use std::{
    ops::{Add, Sub},
    time::Duration,
};

/// Monotonic instant usable by the gate state machines.
///
/// # Invariants
///
/// - Values passed to a single state machine MUST never decrease. Subsequent
///   calls must pass times >= previous calls.
/// - `a + d - a == d` for any duration `d` the gate schedules.
pub trait Instant:
    Copy + Ord + Send + Sync + Sub<Output = Duration> + Add<Duration, Output = Self> + 'static
{
}

impl<T> Instant for T where
    T: Copy + Ord + Send + Sync + Sub<Output = Duration> + Add<Duration, Output = T> + 'static
{
}

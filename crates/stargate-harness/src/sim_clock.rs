//! Virtual time.
//!
//! [`SimInstant`] is an offset from an arbitrary epoch that only moves when
//! the simulation moves it, so a two-minute dial runs in microseconds and
//! every run sees the same timestamps.

use std::{
    ops::{Add, AddAssign, Sub},
    time::Duration,
};

use serde::Serialize;

/// Instant on the simulation clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// Start of simulated time.
    pub const EPOCH: Self = Self(Duration::ZERO);

    /// Instant `millis` after the epoch.
    pub const fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    /// Time since the epoch.
    pub const fn since_epoch(self) -> Duration {
        self.0
    }
}

impl Add<Duration> for SimInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs)
    }
}

impl AddAssign<Duration> for SimInstant {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs;
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    /// Saturates at zero, like `std::time::Instant`.
    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the host side of [`stargate_app::Runtime`] for
//! deterministic testing: a virtual clock that advances exactly one frame per
//! `next_frame`, commands scheduled at virtual instants, and every rendered
//! view recorded (and checked against the invariant registry).

use std::{
    collections::VecDeque,
    convert::Infallible,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use stargate_app::{Driver, GateCommand, GateView};

use crate::{
    SimInstant,
    invariants::{InvariantRegistry, Violation},
};

/// Default frame period: 60 Hz.
pub const FRAME: Duration = Duration::from_nanos(16_666_667);

/// Shared state for command injection and observation.
///
/// This allows injection from outside async contexts, and observation after
/// the driver has moved into a runtime.
#[derive(Debug, Default)]
struct SharedState {
    now: SimInstant,
    /// Commands sorted by due time, stable for equal times
    script: VecDeque<(SimInstant, GateCommand)>,
    views: Vec<GateView>,
    violations: Vec<(SimInstant, Violation)>,
    frames: u64,
    stopped: bool,
}

/// Simulation driver for deterministic testing.
///
/// Cloning yields another handle onto the same simulation.
#[derive(Debug, Clone)]
pub struct SimDriver {
    state: Arc<Mutex<SharedState>>,
    frame: Duration,
    invariants: Option<Arc<InvariantRegistry>>,
}

impl Default for SimDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDriver {
    /// Create a simulation driver at the epoch with a 60 Hz frame.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SharedState::default())),
            frame: FRAME,
            invariants: None,
        }
    }

    /// Use a different frame period.
    #[must_use]
    pub fn with_frame(mut self, frame: Duration) -> Self {
        self.frame = frame;
        self
    }

    /// Enable invariant checking on every rendered frame.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(Arc::new(registry));
        self
    }

    /// Queue `command` for the first frame at or after `at`.
    pub fn schedule(&self, at: SimInstant, command: GateCommand) {
        let mut state = self.lock();
        let position = state.script.partition_point(|(due, _)| *due <= at);
        state.script.insert(position, (at, command));
    }

    /// Queue `command` for the next frame.
    pub fn inject(&self, command: GateCommand) {
        let now = self.lock().now;
        self.schedule(now, command);
    }

    /// Current virtual time.
    pub fn current_time(&self) -> SimInstant {
        self.lock().now
    }

    /// Frame period.
    pub fn frame(&self) -> Duration {
        self.frame
    }

    /// Whether scripted commands remain.
    pub fn has_pending(&self) -> bool {
        !self.lock().script.is_empty()
    }

    /// Every view rendered so far.
    pub fn views(&self) -> Vec<GateView> {
        self.lock().views.clone()
    }

    /// Latest rendered view.
    pub fn last_view(&self) -> Option<GateView> {
        self.lock().views.last().cloned()
    }

    /// Invariant violations seen so far, with the frame time they were seen.
    pub fn violations(&self) -> Vec<(SimInstant, Violation)> {
        self.lock().violations.clone()
    }

    /// Frames advanced so far.
    pub fn frame_count(&self) -> u64 {
        self.lock().frames
    }

    /// Whether the runtime released the driver.
    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Driver for SimDriver {
    type Error = Infallible;
    type Instant = SimInstant;

    async fn poll_command(&mut self) -> Result<Option<GateCommand>, Self::Error> {
        let mut state = self.lock();
        let now = state.now;

        let due = state.script.front().is_some_and(|(at, _)| *at <= now);
        if !due {
            return Ok(None);
        }
        Ok(state.script.pop_front().map(|(_, command)| command))
    }

    async fn next_frame(&mut self) -> Result<(), Self::Error> {
        let mut state = self.lock();
        state.now += self.frame;
        state.frames += 1;
        Ok(())
    }

    fn now(&self) -> Self::Instant {
        self.lock().now
    }

    fn render(&mut self, view: &GateView) -> Result<(), Self::Error> {
        let mut state = self.lock();
        let now = state.now;

        if let Some(registry) = &self.invariants
            && let Err(violations) = registry.check_all(&view.gate)
        {
            for violation in violations {
                tracing::warn!(%violation, at = ?now.since_epoch(), "invariant violated");
                state.violations.push((now, violation));
            }
        }

        state.views.push(view.clone());
        Ok(())
    }

    fn stop(&mut self) {
        self.lock().stopped = true;
    }
}

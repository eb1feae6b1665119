//! Scripted end-to-end runs.
//!
//! A [`Simulation`] owns a [`Runtime`] over a [`SimDriver`] and steps it frame
//! by frame in virtual time. Commands are scheduled up front; the run stops
//! when a condition holds, a time limit passes, or a `Quit` is applied.

use std::time::Duration;

use stargate_app::{Driver, GateCommand, Runtime, Whitelist};
use stargate_core::{GateConfig, GateState, GlyphId, RingConfig};

use crate::{InvariantRegistry, SimDriver, SimInstant};

/// How a [`Simulation`] run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The condition held.
    Reached,
    /// The time limit passed first.
    TimedOut,
    /// A `Quit` command was applied.
    Quit,
}

/// Full runtime under virtual time.
pub struct Simulation {
    runtime: Runtime<SimDriver>,
    driver: SimDriver,
}

impl Simulation {
    /// Default configuration, standard invariants checked on every frame.
    pub fn new(whitelist: impl Whitelist + 'static) -> Self {
        let driver = SimDriver::new().with_invariants(InvariantRegistry::standard());
        Self::with_config(driver, whitelist, GateConfig::default(), RingConfig::default())
    }

    /// Explicit driver and configuration.
    pub fn with_config(
        driver: SimDriver,
        whitelist: impl Whitelist + 'static,
        gate_config: GateConfig,
        ring_config: RingConfig,
    ) -> Self {
        let runtime = Runtime::with_config(driver.clone(), whitelist, gate_config, ring_config);
        Self { runtime, driver }
    }

    /// Schedule a command `millis` after the epoch.
    pub fn at(&self, millis: u64, command: GateCommand) -> &Self {
        self.driver.schedule(SimInstant::from_millis(millis), command);
        self
    }

    /// Schedule entry of `address` followed by a dial, all at `millis`.
    pub fn dial(&self, millis: u64, address: &[GlyphId]) -> &Self {
        for &glyph in address {
            self.at(millis, GateCommand::AddGlyph(glyph));
        }
        self.at(millis, GateCommand::Dial)
    }

    /// Step frames until `done` holds, `limit` of virtual time has passed
    /// since the epoch, or a `Quit` is applied.
    pub async fn run_until(
        &mut self,
        limit: Duration,
        done: impl Fn(&Runtime<SimDriver>) -> bool,
    ) -> RunOutcome {
        let deadline = SimInstant::EPOCH + limit;

        loop {
            let Ok(quit) = self.runtime.process_cycle().await;
            if quit {
                return RunOutcome::Quit;
            }
            if done(&self.runtime) {
                return RunOutcome::Reached;
            }
            if self.driver.current_time() >= deadline {
                return RunOutcome::TimedOut;
            }
            let Ok(()) = self.runtime.driver_mut().next_frame().await;
        }
    }

    /// Step frames until the gate is in `state`.
    pub async fn run_until_state(&mut self, state: GateState, limit: Duration) -> RunOutcome {
        self.run_until(limit, |runtime| runtime.gate().state() == state).await
    }

    /// Runtime under test.
    pub fn runtime(&self) -> &Runtime<SimDriver> {
        &self.runtime
    }

    /// Observer handle onto the driver.
    pub fn driver(&self) -> &SimDriver {
        &self.driver
    }

    /// Gate states in the order they were rendered, consecutive repeats
    /// collapsed.
    pub fn state_history(&self) -> Vec<GateState> {
        let mut states: Vec<GateState> =
            self.driver.views().iter().map(|view| view.gate.state).collect();
        states.dedup();
        states
    }

    /// Last rendered view as pretty JSON, for assertion messages.
    pub fn report(&self) -> String {
        self.driver
            .last_view()
            .and_then(|view| serde_json::to_string_pretty(&view).ok())
            .unwrap_or_default()
    }
}

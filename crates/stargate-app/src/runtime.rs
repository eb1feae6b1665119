//! Generic runtime for gate orchestration.
//!
//! The Runtime drives the frame loop, coordinating between:
//! - [`GateProtocol`]: dialing rules and chevron sequencing
//! - [`RingController`]: ring physics
//! - [`Whitelist`]: destination lookup
//! - [`Driver`]: Platform-specific I/O
//!
//! Each frame: apply polled commands, integrate the ring, hand a finished
//! rotation or whitelist answer back to the protocol, fire protocol timers,
//! react to protocol events, render.
//!
//! Nothing in a frame waits. A whitelist lookup is kept as a pending future
//! and polled once per frame, so commands, ring physics and rendering keep
//! running while it is outstanding, and an abort can cancel it.

use std::sync::Arc;

use futures::{FutureExt, future::BoxFuture};
use stargate_core::{
    Arrival, ArrivalOutcome, Destination, EventReceiver, GateConfig, GateError, GateEvent,
    GateProtocol, GlyphId, POINT_OF_ORIGIN, RequestId, RingConfig, RingController,
};

use crate::{Driver, GateCommand, GateView, RingView, Whitelist, view::status_for};

/// Rotation the protocol is waiting on.
#[derive(Debug)]
struct InFlight {
    request: RequestId,
    arrival: Arrival,
}

/// Whitelist lookup the protocol is waiting on.
struct PendingLookup {
    request: RequestId,
    answer: BoxFuture<'static, Option<Destination>>,
}

/// Generic runtime that orchestrates the gate, the ring and the driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
pub struct Runtime<D>
where
    D: Driver,
{
    driver: D,
    gate: GateProtocol<D::Instant>,
    ring: RingController<RingView, D::Instant>,
    whitelist: Arc<dyn Whitelist>,
    events: EventReceiver,
    /// Glyph from the latest `ChevronEncoding`, consumed by `WaitForRing`
    encoding: Option<GlyphId>,
    in_flight: Option<InFlight>,
    lookup: Option<PendingLookup>,
    status: String,
}

impl<D: Driver> Runtime<D> {
    /// Create a runtime with default protocol and physics configuration.
    pub fn new(driver: D, whitelist: impl Whitelist + 'static) -> Self {
        Self::with_config(driver, whitelist, GateConfig::default(), RingConfig::default())
    }

    /// Create a runtime.
    pub fn with_config(
        driver: D,
        whitelist: impl Whitelist + 'static,
        gate_config: GateConfig,
        ring_config: RingConfig,
    ) -> Self {
        let mut gate = GateProtocol::new(gate_config);
        let events = gate.subscribe();
        let ring = RingController::with_config(RingView::default(), ring_config);

        Self {
            driver,
            gate,
            ring,
            whitelist: Arc::new(whitelist),
            events,
            encoding: None,
            in_flight: None,
            lookup: None,
            status: "IDLE".to_owned(),
        }
    }

    /// Run the frame loop until a [`GateCommand::Quit`].
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        self.driver.render(&self.view())?;

        loop {
            if self.process_cycle().await? {
                break;
            }
            self.driver.next_frame().await?;
        }

        self.ring.destroy();
        self.driver.stop();
        Ok(())
    }

    /// Process one frame.
    ///
    /// Returns `true` if the runtime should quit.
    ///
    /// # Errors
    ///
    /// Returns an error if polling or rendering fails.
    pub async fn process_cycle(&mut self) -> Result<bool, D::Error> {
        let now = self.driver.now();

        while let Some(command) = self.driver.poll_command().await? {
            if self.apply(command, now) {
                return Ok(true);
            }
        }

        self.ring.tick(now);
        self.poll_arrival(now);
        self.poll_lookup(now);
        self.gate.tick(now);
        self.process_gate_events(now);

        self.driver.render(&self.view())?;
        Ok(false)
    }

    /// Apply a user command. Returns `true` on quit.
    fn apply(&mut self, command: GateCommand, now: D::Instant) -> bool {
        tracing::debug!(?command, state = %self.gate.state(), "command");

        match command {
            GateCommand::SetMode(mode) => {
                self.gate.set_mode(mode);
            },
            GateCommand::AddGlyph(glyph) => {
                self.gate.add_glyph(glyph);
            },
            GateCommand::Dial => {
                if !self.gate.initiate_dial_sequence() {
                    tracing::debug!(buffer = ?self.gate.buffer(), "dial refused");
                }
            },
            GateCommand::Abort => self.gate.abort(now),
            GateCommand::Shutdown => self.gate.shutdown(now),
            GateCommand::Reset => self.gate.reset(),
            GateCommand::Quit => return true,
        }
        false
    }

    /// Hand a finished rotation back to the protocol.
    fn poll_arrival(&mut self, now: D::Instant) {
        let Some(in_flight) = self.in_flight.as_mut() else {
            return;
        };
        let Some(outcome) = in_flight.arrival.try_outcome() else {
            return;
        };
        let request = in_flight.request;
        self.in_flight = None;

        match outcome {
            ArrivalOutcome::Arrived => {
                if let Err(e) = self.gate.ring_arrived(request, now) {
                    log_ticket_error(&e, "ring arrival not accepted");
                }
            },
            ArrivalOutcome::Stopped | ArrivalOutcome::Superseded => {
                tracing::debug!(?request, ?outcome, "rotation ended without arrival");
            },
        }
    }

    /// Hand a finished whitelist lookup back to the protocol.
    fn poll_lookup(&mut self, now: D::Instant) {
        let Some(lookup) = self.lookup.as_mut() else {
            return;
        };
        let Some(destination) = (&mut lookup.answer).now_or_never() else {
            return;
        };
        let request = lookup.request;
        self.lookup = None;

        tracing::debug!(?request, found = destination.is_some(), "whitelist answered");
        if let Err(e) = self.gate.resolve_destination(request, destination, now) {
            log_ticket_error(&e, "lookup result not accepted");
        }
    }

    /// React to protocol events until the protocol goes quiet.
    fn process_gate_events(&mut self, now: D::Instant) {
        loop {
            let events = self.events.drain();
            if events.is_empty() {
                break;
            }

            for event in events {
                self.handle_gate_event(event, now);
            }
        }
    }

    fn handle_gate_event(&mut self, event: GateEvent, now: D::Instant) {
        if let Some(status) = status_for(&event) {
            self.status = status;
        }

        match event {
            GateEvent::ChevronEncoding { glyph, .. } => {
                self.encoding = Some(glyph);
            },
            GateEvent::WaitForRing { request } => {
                let glyph = self.encoding.take().unwrap_or(POINT_OF_ORIGIN);
                match self.ring.rotate_to_glyph(glyph, None) {
                    Ok(arrival) => self.in_flight = Some(InFlight { request, arrival }),
                    Err(e) => {
                        tracing::warn!(error = %e, glyph, "rotation failed, aborting dial");
                        self.gate.abort(now);
                    },
                }
            },
            GateEvent::ValidateAddress { buffer, request } => {
                tracing::debug!(?buffer, ?request, "whitelist lookup");
                let whitelist = Arc::clone(&self.whitelist);
                let answer = async move { whitelist.lookup(&buffer).await }.boxed();
                self.lookup = Some(PendingLookup { request, answer });
                // Fast whitelists answer within the frame that asked.
                self.poll_lookup(now);
            },
            GateEvent::Aborted { .. } | GateEvent::Shutdown | GateEvent::Reset => {
                self.ring.stop();
                self.in_flight = None;
                self.encoding = None;
                if let Some(lookup) = self.lookup.take() {
                    tracing::debug!(request = ?lookup.request, "whitelist lookup dropped");
                }
            },
            GateEvent::StateChange { .. }
            | GateEvent::ModeChange { .. }
            | GateEvent::GlyphAdded { .. }
            | GateEvent::Error(_)
            | GateEvent::ChevronLocked { .. }
            | GateEvent::WormholeEstablished { .. }
            | GateEvent::DialFailed { .. } => {},
        }
    }

    /// Render model for the current frame.
    pub fn view(&self) -> GateView {
        GateView {
            gate: self.gate.snapshot(),
            ring: *self.ring.surface(),
            glyph_under_marker: self.ring.current_glyph_index(),
            status: self.status.clone(),
        }
    }

    /// Get a reference to the protocol
    pub fn gate(&self) -> &GateProtocol<D::Instant> {
        &self.gate
    }

    /// Get a reference to the ring
    pub fn ring(&self) -> &RingController<RingView, D::Instant> {
        &self.ring
    }

    /// Get a reference to the driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a mutable reference to the driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Current status line
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Whether a whitelist lookup is outstanding.
    pub fn is_looking_up(&self) -> bool {
        self.lookup.is_some()
    }
}

/// Late tickets after a cancellation are routine; anything else is a wiring
/// bug.
fn log_ticket_error(error: &GateError, message: &str) {
    if error.is_cancellation() {
        tracing::debug!(%error, "{message}");
    } else {
        tracing::warn!(%error, "{message}");
    }
}

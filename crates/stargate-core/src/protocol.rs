//! Gate dialing protocol state machine.
//!
//! Encodes the dialing rules: address buffer limits, duplicate rejection,
//! criss-cross chevron order, validation with procedural fallback, and
//! abort/shutdown/reset semantics.
//!
//! This is a pure state machine: no I/O, no clock, no callbacks. Time is
//! passed in, notifications go out through the embedded [`EventChannel`], and
//! the two suspension points of a dial (ring travel, whitelist lookup) are
//! modelled as single-use [`RequestId`] tickets the orchestrator hands back.
//!
//! # State Machine
//!
//! ```text
//!            add_glyph               initiate_dial_sequence
//! ┌──────┐ ─────────────> ┌─────────┐ ──────────────────> (ring travel)
//! │ Idle │                │ Dialing │ <──────┐                  │ ring_arrived
//! └──────┘                └─────────┘  pause │                  ↓
//!    ↑                                       │          ┌──────────────┐
//!    │ reset (auto after delay)              └───────── │ ChevronLock  │
//!    │                                                  └──────────────┘
//! ┌─────────┐  ┌──────────┐     no match / miss         pause │ last chevron
//! │ Aborted │  │ Shutdown │ <──────────────────┐               ↓
//! └─────────┘  └──────────┘                    │        ┌────────────┐
//!   ↑ abort()    ↑ shutdown()                  └─────── │ Validating │
//!   (any state)  (any state)                            └────────────┘
//!                                      whitelist / procedural │
//!                                                             ↓
//!                                                     ┌────────────────┐
//!                                                     │ ActiveOutbound │
//!                                                     └────────────────┘
//! ```

use std::time::{Duration, Instant as StdInstant};

use serde::Serialize;

use crate::{
    clock::Instant,
    dial::{
        ChevronNumber, DEFAULT_PROCEDURAL_WINDOW, Destination, DialMode, GLYPH_COUNT, GateState,
        GlyphId, POINT_OF_ORIGIN, hash_address, procedural_destination,
    },
    error::GateError,
    event::{
        EventChannel, EventReceiver, FailureReason, GateEvent, InputRejection, RequestId,
        TransitionDetail,
    },
    timer::Timers,
};

/// Pause after each chevron locks before the ring moves on.
pub const DEFAULT_CHEVRON_PAUSE: Duration = Duration::from_millis(300);

/// Delay between an abort (or failed dial) and the automatic reset.
pub const DEFAULT_ABORT_RESET_DELAY: Duration = Duration::from_millis(1500);

/// Delay between a shutdown and the automatic reset.
pub const DEFAULT_SHUTDOWN_RESET_DELAY: Duration = Duration::from_secs(2);

/// Protocol configuration
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Pause after each chevron lock (also before validation)
    pub chevron_pause: Duration,
    /// Delay before reset after abort or failed validation
    pub abort_reset_delay: Duration,
    /// Delay before reset after shutdown
    pub shutdown_reset_delay: Duration,
    /// Procedural destination fires when `hash % 100 < procedural_window`
    pub procedural_window: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            chevron_pause: DEFAULT_CHEVRON_PAUSE,
            abort_reset_delay: DEFAULT_ABORT_RESET_DELAY,
            shutdown_reset_delay: DEFAULT_SHUTDOWN_RESET_DELAY,
            procedural_window: DEFAULT_PROCEDURAL_WINDOW,
        }
    }
}

/// What the protocol is suspended on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Awaiting {
    /// Ring travel to the current chevron's glyph.
    Ring,
    /// Whitelist answer for the assembled address.
    Lookup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateTimer {
    /// Post-lock pause; moves to the next chevron or to validation.
    ChevronPause,
    /// Return to idle after abort, failure or shutdown.
    AutoReset,
}

/// Point-in-time copy of the observable protocol state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateSnapshot {
    /// Current state.
    pub state: GateState,
    /// Current dial mode.
    pub mode: DialMode,
    /// Address glyphs in entry order.
    pub buffer: Vec<GlyphId>,
    /// Chevrons locked so far, in lock order.
    pub locked_chevrons: Vec<ChevronNumber>,
    /// Position in the lock sequence.
    pub chevron_index: usize,
    /// Resolved destination, if any.
    pub destination: Option<Destination>,
    /// Outstanding continuation, if any.
    pub awaiting: Option<Awaiting>,
}

/// Gate protocol state machine.
///
/// Long-lived: created once per gate and reset between dial attempts.
///
/// Generic over `I` to support both real time and virtual time for
/// deterministic testing.
#[derive(Debug)]
pub struct GateProtocol<I = StdInstant>
where
    I: Instant,
{
    /// Current state
    state: GateState,
    /// Dial mode; fixes chevron count and address length
    mode: DialMode,
    /// Address glyphs in entry order
    address: Vec<GlyphId>,
    /// Locked chevrons in lock order
    locked: Vec<ChevronNumber>,
    /// Position in the lock sequence
    chevron_index: usize,
    /// Resolved destination for this attempt
    destination: Option<Destination>,
    /// Configuration
    config: GateConfig,
    /// Subscribers
    events: EventChannel,
    /// Pause and auto-reset deadlines
    timers: Timers<I, GateTimer>,
    /// Outstanding continuation ticket
    pending: Option<(Awaiting, RequestId)>,
    /// Next ticket number
    next_request: u64,
}

impl<I: Instant> Default for GateProtocol<I> {
    fn default() -> Self {
        Self::new(GateConfig::default())
    }
}

impl<I: Instant> GateProtocol<I> {
    /// Create a gate in [`GateState::Idle`] with [`DialMode::Local`].
    pub fn new(config: GateConfig) -> Self {
        Self {
            state: GateState::Idle,
            mode: DialMode::default(),
            address: Vec::new(),
            locked: Vec::new(),
            chevron_index: 0,
            destination: None,
            config,
            events: EventChannel::new(),
            timers: Timers::new(),
            pending: None,
            next_request: 0,
        }
    }

    /// Subscribe to protocol events.
    pub fn subscribe(&mut self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Change the dial mode. Only allowed while idle.
    pub fn set_mode(&mut self, mode: DialMode) -> bool {
        if self.state != GateState::Idle {
            tracing::debug!(state = %self.state, ?mode, "set_mode ignored");
            return false;
        }

        self.mode = mode;
        self.events.publish(GateEvent::ModeChange { mode });
        true
    }

    /// Append a glyph to the address.
    ///
    /// Duplicate glyphs and glyphs past `mode - 1` are rejected with an
    /// [`GateEvent::Error`]. Calls outside idle/dialing, and glyph ids past
    /// the ring, are rejected silently.
    pub fn add_glyph(&mut self, glyph: GlyphId) -> bool {
        if !self.state.accepts_glyphs() || glyph >= GLYPH_COUNT {
            return false;
        }

        if self.address.contains(&glyph) {
            self.events.publish(GateEvent::Error(InputRejection::DuplicateGlyph { glyph }));
            return false;
        }

        if self.address.len() >= self.mode.max_glyphs() {
            self.events.publish(GateEvent::Error(InputRejection::BufferFull));
            return false;
        }

        self.address.push(glyph);

        if self.state == GateState::Idle {
            self.transition(GateState::Dialing, TransitionDetail::None);
        }

        self.events.publish(GateEvent::GlyphAdded { glyph, buffer: self.address.clone() });
        true
    }

    /// Start locking chevrons.
    ///
    /// Requires [`GateState::Dialing`], a complete address, and no sequence
    /// already running. Emits the first [`GateEvent::ChevronEncoding`] and
    /// [`GateEvent::WaitForRing`]; the rest of the sequence advances through
    /// [`Self::ring_arrived`] and [`Self::tick`].
    pub fn initiate_dial_sequence(&mut self) -> bool {
        if self.state != GateState::Dialing
            || self.pending.is_some()
            || !self.locked.is_empty()
            || self.address.len() != self.mode.max_glyphs()
        {
            return false;
        }

        tracing::debug!(mode = ?self.mode, address = ?self.address, "dial sequence started");
        self.encode_chevron(0);
        true
    }

    /// Complete a [`GateEvent::WaitForRing`] ticket: the ring reached the
    /// glyph for the current chevron.
    ///
    /// Locks the chevron and schedules the post-lock pause.
    ///
    /// # Errors
    ///
    /// - `GateError::StaleRequest` if `request` is not the outstanding ring
    ///   ticket (already answered, or cancelled by abort/shutdown/reset).
    pub fn ring_arrived(&mut self, request: RequestId, now: I) -> Result<(), GateError> {
        self.take_pending(Awaiting::Ring, request)?;

        let (chevron, is_last) = self.current_chevron();
        self.transition(GateState::ChevronLock, TransitionDetail::Chevron { chevron, is_last });

        self.locked.push(chevron);
        self.events.publish(GateEvent::ChevronLocked { chevron, total: self.locked.len() });

        self.timers.schedule(GateTimer::ChevronPause, now + self.config.chevron_pause);
        Ok(())
    }

    /// Complete a [`GateEvent::ValidateAddress`] ticket with the whitelist
    /// answer.
    ///
    /// A miss falls back to a procedural destination derived from the
    /// address hash; if that misses too, the attempt fails and an automatic
    /// reset is scheduled.
    ///
    /// # Errors
    ///
    /// - `GateError::StaleRequest` if `request` is not the outstanding lookup
    ///   ticket.
    pub fn resolve_destination(
        &mut self,
        request: RequestId,
        destination: Option<Destination>,
        now: I,
    ) -> Result<(), GateError> {
        self.take_pending(Awaiting::Lookup, request)?;

        let destination = destination.or_else(|| {
            let hash = hash_address(&self.address);
            procedural_destination(hash, self.config.procedural_window)
        });

        match destination {
            Some(destination) => {
                self.destination = Some(destination.clone());
                self.transition(
                    GateState::ActiveOutbound,
                    TransitionDetail::Destination(destination.clone()),
                );
                self.events.publish(GateEvent::WormholeEstablished { destination });
            },
            None => {
                let reason = FailureReason::InvalidAddress;
                self.transition(GateState::Aborted, TransitionDetail::Failure(reason));
                self.events.publish(GateEvent::DialFailed { reason });
                self.schedule_reset(now + self.config.abort_reset_delay);
            },
        }

        Ok(())
    }

    /// Fire expired timers: post-lock pauses and automatic resets.
    pub fn tick(&mut self, now: I) {
        for timer in self.timers.pop_expired(now) {
            match timer {
                GateTimer::ChevronPause => self.finish_chevron(),
                GateTimer::AutoReset => self.reset(),
            }
        }
    }

    /// Abort from any state.
    ///
    /// Cancels the outstanding ticket and any pending pause, then schedules
    /// an automatic reset.
    pub fn abort(&mut self, now: I) {
        let was_active = self.state.is_active();

        self.cancel_attempt();
        self.transition(GateState::Aborted, TransitionDetail::None);
        self.events.publish(GateEvent::Aborted { was_active });
        self.schedule_reset(now + self.config.abort_reset_delay);
    }

    /// Shut the gate down from any state, then reset automatically.
    pub fn shutdown(&mut self, now: I) {
        self.cancel_attempt();
        self.transition(GateState::Shutdown, TransitionDetail::None);
        self.events.publish(GateEvent::Shutdown);
        self.schedule_reset(now + self.config.shutdown_reset_delay);
    }

    /// Return to idle with an empty address. Cancels every timer and ticket.
    pub fn reset(&mut self) {
        if self.state != GateState::Idle {
            tracing::debug!(from = %self.state, "reset");
        }

        self.state = GateState::Idle;
        self.address.clear();
        self.locked.clear();
        self.chevron_index = 0;
        self.destination = None;
        self.pending = None;
        self.timers.clear();

        self.events.publish(GateEvent::Reset);
    }

    /// Current state
    pub fn state(&self) -> GateState {
        self.state
    }

    /// Current dial mode
    pub fn mode(&self) -> DialMode {
        self.mode
    }

    /// Copy of the address buffer.
    pub fn buffer(&self) -> Vec<GlyphId> {
        self.address.clone()
    }

    /// Copy of the locked chevrons, in lock order.
    pub fn locked_chevrons(&self) -> Vec<ChevronNumber> {
        self.locked.clone()
    }

    /// Position in the lock sequence.
    pub fn current_chevron_index(&self) -> usize {
        self.chevron_index
    }

    /// Destination of the current attempt. `None` until validation succeeds.
    pub fn destination(&self) -> Option<&Destination> {
        self.destination.as_ref()
    }

    /// Outstanding continuation ticket. `None` if nothing is awaited.
    pub fn pending_request(&self) -> Option<(Awaiting, RequestId)> {
        self.pending
    }

    /// Earliest deadline [`Self::tick`] needs to see. `None` if no timer is
    /// scheduled.
    pub fn next_deadline(&self) -> Option<I> {
        self.timers.next_deadline()
    }

    /// Observable state for rendering and invariant checks.
    pub fn snapshot(&self) -> GateSnapshot {
        GateSnapshot {
            state: self.state,
            mode: self.mode,
            buffer: self.address.clone(),
            locked_chevrons: self.locked.clone(),
            chevron_index: self.chevron_index,
            destination: self.destination.clone(),
            awaiting: self.pending.map(|(awaiting, _)| awaiting),
        }
    }

    fn transition(&mut self, to: GateState, detail: TransitionDetail) {
        let from = self.state;
        self.state = to;
        tracing::debug!(%from, %to, ?detail, "state transition");
        self.events.publish(GateEvent::StateChange { from, to, detail });
    }

    /// Chevron number at the current index, and whether it is the last.
    fn current_chevron(&self) -> (ChevronNumber, bool) {
        let sequence = self.mode.sequence();
        (sequence[self.chevron_index], self.chevron_index + 1 == sequence.len())
    }

    fn encode_chevron(&mut self, index: usize) {
        self.chevron_index = index;
        let (chevron, is_last) = self.current_chevron();

        // Address length == mode - 1, so every non-final index is in bounds.
        let glyph = if is_last { POINT_OF_ORIGIN } else { self.address[index] };

        self.events.publish(GateEvent::ChevronEncoding { chevron, index, is_last, glyph });

        let request = self.issue(Awaiting::Ring);
        self.events.publish(GateEvent::WaitForRing { request });
    }

    /// Post-lock pause elapsed.
    fn finish_chevron(&mut self) {
        if self.state != GateState::ChevronLock {
            return;
        }

        let (_, is_last) = self.current_chevron();
        if is_last {
            self.transition(GateState::Validating, TransitionDetail::None);
            self.validate_address();
        } else {
            self.transition(GateState::Dialing, TransitionDetail::None);
            self.encode_chevron(self.chevron_index + 1);
        }
    }

    /// Ask the whitelist collaborator for the destination.
    fn validate_address(&mut self) {
        let request = self.issue(Awaiting::Lookup);
        self.events.publish(GateEvent::ValidateAddress { buffer: self.address.clone(), request });
    }

    fn issue(&mut self, awaiting: Awaiting) -> RequestId {
        debug_assert!(self.pending.is_none(), "one continuation at a time");

        let request = RequestId::new(self.next_request);
        self.next_request += 1;
        self.pending = Some((awaiting, request));
        request
    }

    fn take_pending(&mut self, awaiting: Awaiting, request: RequestId) -> Result<(), GateError> {
        if self.pending != Some((awaiting, request)) {
            return Err(GateError::StaleRequest { request, state: self.state });
        }

        self.pending = None;
        Ok(())
    }

    fn cancel_attempt(&mut self) {
        if let Some((awaiting, request)) = self.pending.take() {
            tracing::debug!(?awaiting, ?request, "continuation cancelled");
        }
        self.timers.cancel_kind(GateTimer::ChevronPause);
    }

    fn schedule_reset(&mut self, deadline: I) {
        self.timers.cancel_kind(GateTimer::AutoReset);
        self.timers.schedule(GateTimer::AutoReset, deadline);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABYDOS: [GlyphId; 6] = [27, 7, 15, 32, 12, 30];

    fn abydos() -> Destination {
        Destination::new("Abydos", "planet", "Desert world")
    }

    fn gate_with(address: &[GlyphId]) -> (GateProtocol, EventReceiver) {
        let mut gate = GateProtocol::default();
        let rx = gate.subscribe();
        for &glyph in address {
            assert!(gate.add_glyph(glyph));
        }
        (gate, rx)
    }

    /// Answer every ring ticket and wait out every pause until the lookup
    /// request shows up.
    fn lock_all_chevrons(
        gate: &mut GateProtocol,
        rx: &mut EventReceiver,
        now: &mut StdInstant,
    ) -> (RequestId, Vec<GateEvent>) {
        let mut seen = Vec::new();
        loop {
            let events = rx.drain();
            assert!(!events.is_empty(), "dial stalled in {:?}", gate.state());
            for event in events {
                seen.push(event.clone());
                match event {
                    GateEvent::WaitForRing { request } => {
                        gate.ring_arrived(request, *now).unwrap();
                    },
                    GateEvent::ValidateAddress { request, .. } => return (request, seen),
                    _ => {},
                }
            }
            *now += DEFAULT_CHEVRON_PAUSE;
            gate.tick(*now);
        }
    }

    #[test]
    fn set_mode_only_while_idle() {
        let (mut gate, mut rx) = gate_with(&[]);
        assert!(gate.set_mode(DialMode::Destiny));
        assert_eq!(rx.drain(), vec![GateEvent::ModeChange { mode: DialMode::Destiny }]);

        assert!(gate.add_glyph(1));
        assert!(!gate.set_mode(DialMode::Local));
        assert_eq!(gate.mode(), DialMode::Destiny);
    }

    #[test]
    fn first_glyph_starts_dialing() {
        let (mut gate, mut rx) = gate_with(&[]);
        assert!(gate.add_glyph(12));

        assert_eq!(gate.state(), GateState::Dialing);
        assert_eq!(rx.drain(), vec![
            GateEvent::StateChange {
                from: GateState::Idle,
                to: GateState::Dialing,
                detail: TransitionDetail::None,
            },
            GateEvent::GlyphAdded { glyph: 12, buffer: vec![12] },
        ]);
    }

    #[test]
    fn duplicate_glyph_rejected() {
        let (mut gate, mut rx) = gate_with(&[4, 9]);
        rx.drain();

        assert!(!gate.add_glyph(4));
        assert_eq!(gate.buffer(), vec![4, 9]);
        assert_eq!(rx.drain(), vec![GateEvent::Error(InputRejection::DuplicateGlyph {
            glyph: 4
        })]);
    }

    #[test]
    fn full_buffer_rejected() {
        let (mut gate, mut rx) = gate_with(&ABYDOS);
        rx.drain();

        assert!(!gate.add_glyph(1));
        assert_eq!(gate.buffer(), ABYDOS.to_vec());
        assert_eq!(rx.drain(), vec![GateEvent::Error(InputRejection::BufferFull)]);
    }

    #[test]
    fn glyph_past_ring_rejected_silently() {
        let (mut gate, mut rx) = gate_with(&[]);
        assert!(!gate.add_glyph(GLYPH_COUNT));
        assert_eq!(gate.state(), GateState::Idle);
        assert!(rx.drain().is_empty());
    }

    #[test]
    fn dial_requires_complete_address() {
        let (mut gate, _rx) = gate_with(&[1, 2, 3]);
        assert!(!gate.initiate_dial_sequence());
        assert_eq!(gate.pending_request(), None);
    }

    #[test]
    fn dial_requires_dialing_state() {
        let (mut gate, _rx) = gate_with(&[]);
        assert!(!gate.initiate_dial_sequence());
    }

    #[test]
    fn whitelisted_dial_opens_wormhole() {
        let (mut gate, mut rx) = gate_with(&ABYDOS);
        let mut now = StdInstant::now();

        assert!(gate.initiate_dial_sequence());
        assert!(!gate.initiate_dial_sequence(), "second start must be refused");

        let (request, events) = lock_all_chevrons(&mut gate, &mut rx, &mut now);

        let encoded: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                GateEvent::ChevronEncoding { chevron, glyph, .. } => Some((*chevron, *glyph)),
                _ => None,
            })
            .collect();
        assert_eq!(encoded, vec![(1, 27), (8, 7), (2, 15), (7, 32), (3, 12), (6, 30), (9, 0)]);
        assert_eq!(gate.locked_chevrons(), vec![1, 8, 2, 7, 3, 6, 9]);
        assert_eq!(gate.state(), GateState::Validating);

        gate.resolve_destination(request, Some(abydos()), now).unwrap();
        assert_eq!(gate.state(), GateState::ActiveOutbound);
        assert_eq!(gate.destination(), Some(&abydos()));
        assert!(
            rx.drain()
                .contains(&GateEvent::WormholeEstablished { destination: abydos() })
        );
    }

    #[test]
    fn ring_ticket_is_single_use() {
        let (mut gate, mut rx) = gate_with(&ABYDOS);
        let now = StdInstant::now();
        gate.initiate_dial_sequence();

        let request = rx
            .drain()
            .into_iter()
            .find_map(|e| match e {
                GateEvent::WaitForRing { request } => Some(request),
                _ => None,
            })
            .unwrap();

        assert!(gate.ring_arrived(request, now).is_ok());
        assert!(matches!(gate.ring_arrived(request, now), Err(GateError::StaleRequest { .. })));
        assert_eq!(gate.locked_chevrons(), vec![1]);
    }

    #[test]
    fn unknown_address_fails_then_resets() {
        // hash % 100 == 24: no procedural destination
        let (mut gate, mut rx) = gate_with(&[1, 8, 2, 7, 3, 6]);
        let mut now = StdInstant::now();
        gate.initiate_dial_sequence();

        let (request, _) = lock_all_chevrons(&mut gate, &mut rx, &mut now);
        gate.resolve_destination(request, None, now).unwrap();

        assert_eq!(gate.state(), GateState::Aborted);
        assert_eq!(gate.destination(), None);
        assert!(rx.drain().contains(&GateEvent::DialFailed {
            reason: FailureReason::InvalidAddress
        }));

        gate.tick(now + Duration::from_millis(1499));
        assert_eq!(gate.state(), GateState::Aborted);

        gate.tick(now + DEFAULT_ABORT_RESET_DELAY);
        assert_eq!(gate.state(), GateState::Idle);
        assert!(gate.buffer().is_empty());
    }

    #[test]
    fn procedural_destination_on_hash_hit() {
        let (mut gate, mut rx) = gate_with(&[3, 9, 11, 36, 7, 30]);
        let mut now = StdInstant::now();
        gate.initiate_dial_sequence();

        let (request, _) = lock_all_chevrons(&mut gate, &mut rx, &mut now);
        gate.resolve_destination(request, None, now).unwrap();

        assert_eq!(gate.state(), GateState::ActiveOutbound);
        assert_eq!(gate.destination().map(|d| d.name.as_str()), Some("P8X-332"));
    }

    #[test]
    fn abort_during_chevron_lock_stops_sequence() {
        let (mut gate, mut rx) = gate_with(&ABYDOS);
        let now = StdInstant::now();
        gate.initiate_dial_sequence();

        let request = rx
            .drain()
            .into_iter()
            .find_map(|e| match e {
                GateEvent::WaitForRing { request } => Some(request),
                _ => None,
            })
            .unwrap();
        gate.ring_arrived(request, now).unwrap();
        assert_eq!(gate.state(), GateState::ChevronLock);

        gate.abort(now);
        assert_eq!(gate.state(), GateState::Aborted);
        assert!(rx.drain().contains(&GateEvent::Aborted { was_active: false }));

        // The pause that would have advanced to chevron 8 is gone.
        gate.tick(now + DEFAULT_CHEVRON_PAUSE);
        assert_eq!(gate.locked_chevrons(), vec![1]);
        assert!(
            !rx.drain()
                .iter()
                .any(|e| matches!(e, GateEvent::ChevronEncoding { .. }))
        );

        gate.tick(now + DEFAULT_ABORT_RESET_DELAY);
        assert_eq!(gate.state(), GateState::Idle);
        assert!(gate.buffer().is_empty());
        assert!(gate.locked_chevrons().is_empty());
    }

    #[test]
    fn late_lookup_after_abort_is_stale() {
        let (mut gate, mut rx) = gate_with(&ABYDOS);
        let mut now = StdInstant::now();
        gate.initiate_dial_sequence();

        let (request, _) = lock_all_chevrons(&mut gate, &mut rx, &mut now);
        gate.abort(now);

        let result = gate.resolve_destination(request, Some(abydos()), now);
        assert!(matches!(result, Err(GateError::StaleRequest { .. })));
        assert_eq!(gate.state(), GateState::Aborted);
        assert_eq!(gate.destination(), None);
    }

    #[test]
    fn ring_ticket_from_cancelled_attempt_stays_stale() {
        let (mut gate, _rx) = gate_with(&ABYDOS);
        let now = StdInstant::now();
        gate.initiate_dial_sequence();

        let (awaiting, old) = gate.pending_request().unwrap();
        assert_eq!(awaiting, Awaiting::Ring);
        gate.abort(now);

        let err = gate.ring_arrived(old, now).unwrap_err();
        assert_eq!(err, GateError::StaleRequest { request: old, state: GateState::Aborted });
        assert!(err.is_cancellation());
        assert!(gate.locked_chevrons().is_empty());

        gate.reset();
        for &glyph in &ABYDOS {
            assert!(gate.add_glyph(glyph));
        }
        assert!(gate.initiate_dial_sequence());
        let (_, fresh) = gate.pending_request().unwrap();
        assert_ne!(fresh, old);

        let err = gate.ring_arrived(old, now).unwrap_err();
        assert_eq!(err, GateError::StaleRequest { request: old, state: GateState::Dialing });
        assert!(gate.locked_chevrons().is_empty());
        assert_eq!(gate.pending_request(), Some((Awaiting::Ring, fresh)));

        gate.ring_arrived(fresh, now).unwrap();
        assert_eq!(gate.locked_chevrons(), vec![1]);
    }

    #[test]
    fn abort_while_active_reports_it() {
        let (mut gate, mut rx) = gate_with(&ABYDOS);
        let mut now = StdInstant::now();
        gate.initiate_dial_sequence();
        let (request, _) = lock_all_chevrons(&mut gate, &mut rx, &mut now);
        gate.resolve_destination(request, Some(abydos()), now).unwrap();
        rx.drain();

        gate.abort(now);
        assert!(rx.drain().contains(&GateEvent::Aborted { was_active: true }));
    }

    #[test]
    fn shutdown_resets_after_delay() {
        let (mut gate, mut rx) = gate_with(&[5]);
        let now = StdInstant::now();

        gate.shutdown(now);
        assert_eq!(gate.state(), GateState::Shutdown);
        assert!(rx.drain().contains(&GateEvent::Shutdown));
        assert_eq!(gate.next_deadline(), Some(now + DEFAULT_SHUTDOWN_RESET_DELAY));

        gate.tick(now + DEFAULT_SHUTDOWN_RESET_DELAY);
        assert_eq!(gate.state(), GateState::Idle);
        assert_eq!(rx.drain(), vec![GateEvent::Reset]);
    }

    #[test]
    fn explicit_reset_cancels_auto_reset() {
        let (mut gate, _rx) = gate_with(&[5]);
        let now = StdInstant::now();

        gate.abort(now);
        gate.reset();
        assert!(gate.add_glyph(6));

        gate.tick(now + DEFAULT_ABORT_RESET_DELAY);
        assert_eq!(gate.state(), GateState::Dialing);
        assert_eq!(gate.buffer(), vec![6]);
    }

    #[test]
    fn reset_is_idempotent() {
        let (mut gate, _rx) = gate_with(&[1, 2]);
        gate.reset();
        let first = gate.snapshot();
        gate.reset();
        assert_eq!(gate.snapshot(), first);
        assert_eq!(first.state, GateState::Idle);
        assert!(first.buffer.is_empty());
    }
}

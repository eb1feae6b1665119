//! Reference gate.

use stargate_core::{
    Awaiting, Destination, DialMode, GLYPH_COUNT, GateSnapshot, GateState, GlyphId,
    hash_address, procedural_destination,
};

use super::{Operation, OperationResult};

const CHEVRON_PAUSE_MS: u64 = 300;
const ABORT_RESET_MS: u64 = 1500;
const SHUTDOWN_RESET_MS: u64 = 2000;
const PROCEDURAL_WINDOW: u64 = 5;

/// Destination both sides use for a [`Operation::Lookup`] with
/// `listed: true`.
pub fn listed_destination() -> Destination {
    Destination::new("Listed", "planet", "Whitelisted world")
}

/// Reference gate: the oracle the real protocol is checked against.
#[derive(Debug, Clone)]
pub struct ModelGate {
    state: GateState,
    mode: DialMode,
    buffer: Vec<GlyphId>,
    locked: Vec<u8>,
    index: usize,
    destination: Option<Destination>,
    awaiting: Option<Awaiting>,
    /// Deadline of the post-lock pause (ms)
    pause_at: Option<u64>,
    /// Deadline of the automatic reset (ms)
    reset_at: Option<u64>,
    /// Current time (ms)
    now: u64,
}

impl Default for ModelGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelGate {
    /// Idle gate in local mode at time zero.
    pub fn new() -> Self {
        Self {
            state: GateState::Idle,
            mode: DialMode::Local,
            buffer: Vec::new(),
            locked: Vec::new(),
            index: 0,
            destination: None,
            awaiting: None,
            pause_at: None,
            reset_at: None,
            now: 0,
        }
    }

    /// Current model time in milliseconds.
    pub fn now_millis(&self) -> u64 {
        self.now
    }

    /// Apply an operation.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        let accepted = match *op {
            Operation::SetMode { selector } => self.set_mode(Operation::mode_for(selector)),
            Operation::AddGlyph { glyph } => self.add_glyph(glyph),
            Operation::Dial => self.dial(),
            Operation::RingArrives => self.ring_arrives(),
            Operation::Lookup { listed } => self.lookup(listed),
            Operation::AdvanceTime { millis } => {
                self.advance(u64::from(millis));
                true
            },
            Operation::Abort => {
                self.cancel_attempt();
                self.state = GateState::Aborted;
                self.reset_at = Some(self.now + ABORT_RESET_MS);
                true
            },
            Operation::Shutdown => {
                self.cancel_attempt();
                self.state = GateState::Shutdown;
                self.reset_at = Some(self.now + SHUTDOWN_RESET_MS);
                true
            },
            Operation::Reset => {
                self.reset();
                true
            },
        };
        OperationResult::from_accepted(accepted)
    }

    /// Observable state, in the real protocol's snapshot shape.
    pub fn observable_state(&self) -> GateSnapshot {
        GateSnapshot {
            state: self.state,
            mode: self.mode,
            buffer: self.buffer.clone(),
            locked_chevrons: self.locked.clone(),
            chevron_index: self.index,
            destination: self.destination.clone(),
            awaiting: self.awaiting,
        }
    }

    fn set_mode(&mut self, mode: DialMode) -> bool {
        if self.state != GateState::Idle {
            return false;
        }
        self.mode = mode;
        true
    }

    fn add_glyph(&mut self, glyph: GlyphId) -> bool {
        let can_edit = matches!(self.state, GateState::Idle | GateState::Dialing);
        if !can_edit
            || glyph >= GLYPH_COUNT
            || self.buffer.contains(&glyph)
            || self.buffer.len() >= self.mode.max_glyphs()
        {
            return false;
        }

        self.buffer.push(glyph);
        self.state = GateState::Dialing;
        true
    }

    fn dial(&mut self) -> bool {
        let ready = self.state == GateState::Dialing
            && self.awaiting.is_none()
            && self.locked.is_empty()
            && self.buffer.len() == self.mode.max_glyphs();
        if ready {
            self.index = 0;
            self.awaiting = Some(Awaiting::Ring);
        }
        ready
    }

    fn ring_arrives(&mut self) -> bool {
        if self.awaiting != Some(Awaiting::Ring) {
            return false;
        }
        self.awaiting = None;
        self.state = GateState::ChevronLock;
        self.locked.push(self.mode.sequence()[self.index]);
        self.pause_at = Some(self.now + CHEVRON_PAUSE_MS);
        true
    }

    fn lookup(&mut self, listed: bool) -> bool {
        if self.awaiting != Some(Awaiting::Lookup) {
            return false;
        }
        self.awaiting = None;

        let destination = if listed {
            Some(listed_destination())
        } else {
            procedural_destination(hash_address(&self.buffer), PROCEDURAL_WINDOW)
        };

        if destination.is_some() {
            self.state = GateState::ActiveOutbound;
            self.destination = destination;
        } else {
            self.state = GateState::Aborted;
            self.reset_at = Some(self.now + ABORT_RESET_MS);
        }
        true
    }

    fn advance(&mut self, millis: u64) {
        self.now += millis;

        if self.pause_at.is_some_and(|at| at <= self.now) {
            self.pause_at = None;
            if self.state == GateState::ChevronLock {
                if self.index + 1 == self.mode.chevron_count() {
                    self.state = GateState::Validating;
                    self.awaiting = Some(Awaiting::Lookup);
                } else {
                    self.state = GateState::Dialing;
                    self.index += 1;
                    self.awaiting = Some(Awaiting::Ring);
                }
            }
        }

        if self.reset_at.is_some_and(|at| at <= self.now) {
            self.reset();
        }
    }

    fn cancel_attempt(&mut self) {
        self.awaiting = None;
        self.pause_at = None;
    }

    fn reset(&mut self) {
        self.state = GateState::Idle;
        self.buffer.clear();
        self.locked.clear();
        self.index = 0;
        self.destination = None;
        self.awaiting = None;
        self.pause_at = None;
        self.reset_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_dials_listed_address() {
        let mut model = ModelGate::new();
        for glyph in [27, 7, 15, 32, 12, 30] {
            model.apply(&Operation::AddGlyph { glyph });
        }
        assert_eq!(model.apply(&Operation::Dial), OperationResult::Accepted);

        for _ in 0..7 {
            assert_eq!(model.apply(&Operation::RingArrives), OperationResult::Accepted);
            model.apply(&Operation::AdvanceTime { millis: 300 });
        }
        assert_eq!(model.apply(&Operation::Lookup { listed: true }), OperationResult::Accepted);

        let state = model.observable_state();
        assert_eq!(state.state, GateState::ActiveOutbound);
        assert_eq!(state.locked_chevrons, vec![1, 8, 2, 7, 3, 6, 9]);
    }

    #[test]
    fn model_abort_resets_later() {
        let mut model = ModelGate::new();
        model.apply(&Operation::AddGlyph { glyph: 3 });
        model.apply(&Operation::Abort);
        model.apply(&Operation::AdvanceTime { millis: 1499 });
        assert_eq!(model.observable_state().state, GateState::Aborted);
        model.apply(&Operation::AdvanceTime { millis: 1 });
        assert_eq!(model.observable_state().state, GateState::Idle);
    }
}

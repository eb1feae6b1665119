//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use stargate_core::{Awaiting, GLYPH_COUNT, GateSnapshot, GateState};

use super::{Invariant, InvariantKind, InvariantResult, Violation};

/// Address never exceeds `mode - 1` glyphs, never repeats one, and never
/// holds a glyph off the ring.
pub struct BufferWithinMode;

impl Invariant for BufferWithinMode {
    fn kind(&self) -> InvariantKind {
        InvariantKind::BufferWithinMode
    }

    fn check(&self, state: &GateSnapshot) -> InvariantResult {
        let violation = |message| Err(Violation { invariant: self.kind(), message });
        let buffer = &state.buffer;

        if buffer.len() > state.mode.max_glyphs() {
            return violation(format!(
                "buffer {buffer:?} longer than {} for {:?}",
                state.mode.max_glyphs(),
                state.mode
            ));
        }
        if let Some(glyph) = buffer.iter().find(|&&g| g >= GLYPH_COUNT) {
            return violation(format!("glyph {glyph} off the ring in {buffer:?}"));
        }
        for (i, glyph) in buffer.iter().enumerate() {
            if buffer[..i].contains(glyph) {
                return violation(format!("glyph {glyph} repeated in {buffer:?}"));
            }
        }
        Ok(())
    }
}

/// Locked chevrons are always a prefix of the mode's lock order, and only
/// exist once the address is complete.
pub struct LockedFollowsSequence;

impl Invariant for LockedFollowsSequence {
    fn kind(&self) -> InvariantKind {
        InvariantKind::LockedFollowsSequence
    }

    fn check(&self, state: &GateSnapshot) -> InvariantResult {
        let sequence = state.mode.sequence();
        let locked = &state.locked_chevrons;

        if !sequence.starts_with(locked) {
            return Err(Violation {
                invariant: self.kind(),
                message: format!("locked {locked:?} is not a prefix of {sequence:?}"),
            });
        }
        if !locked.is_empty() && state.buffer.len() != state.mode.max_glyphs() {
            return Err(Violation {
                invariant: self.kind(),
                message: format!(
                    "{} chevrons locked with incomplete address {:?}",
                    locked.len(),
                    state.buffer
                ),
            });
        }
        Ok(())
    }
}

/// An open wormhole always has a destination; a destination outlives the
/// wormhole only until the next reset.
pub struct DestinationMatchesState;

impl Invariant for DestinationMatchesState {
    fn kind(&self) -> InvariantKind {
        InvariantKind::DestinationMatchesState
    }

    fn check(&self, state: &GateSnapshot) -> InvariantResult {
        let allowed = matches!(
            state.state,
            GateState::ActiveOutbound | GateState::Aborted | GateState::Shutdown
        );

        match (&state.destination, state.state) {
            (None, GateState::ActiveOutbound) => Err(Violation {
                invariant: self.kind(),
                message: "active_outbound without destination".to_owned(),
            }),
            (Some(destination), current) if !allowed => Err(Violation {
                invariant: self.kind(),
                message: format!("destination {} retained in {current}", destination.name),
            }),
            _ => Ok(()),
        }
    }
}

/// Idle means no attempt in progress: empty buffer, nothing locked, nothing
/// awaited.
pub struct IdleIsEmpty;

impl Invariant for IdleIsEmpty {
    fn kind(&self) -> InvariantKind {
        InvariantKind::IdleIsEmpty
    }

    fn check(&self, state: &GateSnapshot) -> InvariantResult {
        if state.state != GateState::Idle {
            return Ok(());
        }

        if !state.buffer.is_empty() || !state.locked_chevrons.is_empty() || state.awaiting.is_some()
        {
            return Err(Violation {
                invariant: self.kind(),
                message: format!(
                    "idle with buffer {:?}, locked {:?}, awaiting {:?}",
                    state.buffer, state.locked_chevrons, state.awaiting
                ),
            });
        }
        Ok(())
    }
}

/// Ring tickets are only outstanding while dialing, lookups only while
/// validating.
pub struct AwaitingMatchesState;

impl Invariant for AwaitingMatchesState {
    fn kind(&self) -> InvariantKind {
        InvariantKind::AwaitingMatchesState
    }

    fn check(&self, state: &GateSnapshot) -> InvariantResult {
        let expected = match state.awaiting {
            None => return Ok(()),
            Some(Awaiting::Ring) => GateState::Dialing,
            Some(Awaiting::Lookup) => GateState::Validating,
        };

        if state.state != expected {
            return Err(Violation {
                invariant: self.kind(),
                message: format!("awaiting {:?} in {}", state.awaiting, state.state),
            });
        }
        Ok(())
    }
}

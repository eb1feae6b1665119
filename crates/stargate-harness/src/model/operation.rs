//! Operations for model-based testing.
//!
//! Operations represent every input the gate can see: user commands,
//! collaborator answers, and the passage of time. They are generated randomly
//! and applied to both the model and real implementation.

use arbitrary::{Arbitrary, Unstructured};
use stargate_core::{DialMode, GlyphId};

/// Operations that can be applied to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// Switch dial mode.
    SetMode {
        /// Selects a mode modulo 3.
        selector: u8,
    },

    /// Enter a glyph.
    AddGlyph {
        /// Raw glyph id; 39 is off the ring.
        glyph: GlyphId,
    },

    /// Start the chevron sequence.
    Dial,

    /// The ring reaches the requested glyph.
    ///
    /// With no ring ticket outstanding, a stale ticket is presented instead.
    RingArrives,

    /// The whitelist answers.
    Lookup {
        /// Whether the address is listed.
        listed: bool,
    },

    /// Advance simulation time.
    ///
    /// Fires chevron pauses and automatic resets in both model and real
    /// system.
    AdvanceTime {
        /// Milliseconds to advance.
        millis: u16,
    },

    /// Abort the attempt.
    Abort,

    /// Shut the gate down.
    Shutdown,

    /// Reset to idle.
    Reset,
}

impl Operation {
    /// Mode selected by a [`Operation::SetMode`] selector.
    pub fn mode_for(selector: u8) -> DialMode {
        DialMode::ALL[usize::from(selector) % DialMode::ALL.len()]
    }

    /// Decode as many operations as `bytes` supports.
    ///
    /// Glyph ids are folded into `0..=39` so entry has a realistic chance of
    /// completing an address.
    pub fn decode_all(bytes: &[u8]) -> Vec<Operation> {
        let mut u = Unstructured::new(bytes);
        let mut ops = Vec::new();
        while !u.is_empty() {
            match Operation::arbitrary(&mut u) {
                Ok(Operation::AddGlyph { glyph }) => {
                    ops.push(Operation::AddGlyph { glyph: glyph % 40 });
                },
                Ok(op) => ops.push(op),
                Err(_) => break,
            }
        }
        ops
    }
}

/// Result of applying an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    /// The gate accepted the input.
    Accepted,
    /// The gate refused the input; nothing changed.
    Refused,
}

impl OperationResult {
    /// Result for a boolean acceptance.
    pub fn from_accepted(accepted: bool) -> Self {
        if accepted { Self::Accepted } else { Self::Refused }
    }
}

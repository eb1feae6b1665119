//! Error types for the gate core.
//!
//! Expected dialing failures (duplicate glyph, full buffer, unknown address)
//! are not errors: they are reported through boolean results and
//! [`crate::GateEvent`]s. The types here cover collaborator misuse: stale
//! continuation tickets, out-of-range ring input, invalid mode values.

use thiserror::Error;

use crate::{
    dial::{GLYPH_COUNT, GateState},
    event::RequestId,
};

/// Errors from the gate protocol state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// Integer is not a dial mode (7, 8 or 9).
    #[error("invalid dial mode: {0} (expected 7, 8 or 9)")]
    InvalidMode(u8),

    /// Ticket does not match the outstanding request.
    ///
    /// Happens when a continuation is completed twice, or after the attempt
    /// it belonged to was aborted, shut down or reset.
    #[error("stale request {request:?} in state {state}")]
    StaleRequest {
        /// Ticket that was presented.
        request: RequestId,
        /// State when it was presented.
        state: GateState,
    },
}

impl GateError {
    /// Returns true if this error is the expected fallout of a cancellation.
    ///
    /// Stale tickets after an abort are routine: the orchestrator's ring or
    /// whitelist lookup simply finished late. Everything else is a bug in
    /// the caller.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::StaleRequest { .. })
    }
}

/// Errors from the ring physics controller.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum RingError {
    /// Glyph index outside the ring.
    #[error("glyph index {0} out of range (ring has {count} glyphs)", count = GLYPH_COUNT)]
    GlyphOutOfRange(u8),

    /// Current angle is NaN or infinite; the controller must be reset.
    #[error("ring angle is not finite: {0}")]
    NonFiniteAngle(f64),
}

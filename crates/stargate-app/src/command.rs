//! User intents.

use stargate_core::{DialMode, GlyphId};

/// Input the [`crate::Runtime`] applies to the gate.
///
/// Produced by the [`crate::Driver`] from whatever the host offers: clicks on
/// the glyph ring, key presses, scripted input in simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateCommand {
    /// Switch dial mode (idle only).
    SetMode(DialMode),
    /// Append a glyph to the address.
    AddGlyph(GlyphId),
    /// Start locking chevrons.
    Dial,
    /// Cancel the attempt or close the wormhole.
    Abort,
    /// Shut the gate down.
    Shutdown,
    /// Clear everything and return to idle now.
    Reset,
    /// Leave the run loop.
    Quit,
}

//! Render model.

use serde::Serialize;
use stargate_core::{GateEvent, GateSnapshot, GateState, GlyphId, InputRejection, RingSurface};

/// Ring rendering state, kept current by the ring controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RingView {
    /// Rotation in degrees, unbounded.
    pub rotation: f64,
    /// Whether the ring is moving.
    pub spinning: bool,
}

impl RingSurface for RingView {
    fn rotation_changed(&mut self, degrees: f64) {
        self.rotation = degrees;
    }

    fn spinning_changed(&mut self, spinning: bool) {
        self.spinning = spinning;
    }
}

/// Everything a host needs to draw the gate for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateView {
    /// Protocol state.
    #[serde(flatten)]
    pub gate: GateSnapshot,
    /// Ring state.
    pub ring: RingView,
    /// Glyph under the top marker.
    pub glyph_under_marker: GlyphId,
    /// One-line status text.
    pub status: String,
}

/// Status line for an event, if it changes the status.
pub fn status_for(event: &GateEvent) -> Option<String> {
    let status = match event {
        GateEvent::ModeChange { mode } => format!("{}-CHEVRON MODE", mode.chevron_count()),
        GateEvent::GlyphAdded { buffer, .. } => {
            let glyphs: Vec<String> = buffer.iter().map(ToString::to_string).collect();
            format!("ADDRESS {}", glyphs.join("-"))
        },
        GateEvent::Error(InputRejection::DuplicateGlyph { glyph }) => {
            format!("GLYPH {glyph} ALREADY IN ADDRESS")
        },
        GateEvent::Error(InputRejection::BufferFull) => "ADDRESS BUFFER FULL".to_owned(),
        GateEvent::ChevronEncoding { index, .. } => format!("ENCODING CHEVRON {}...", index + 1),
        GateEvent::ChevronLocked { total, .. } => format!("CHEVRON {total} LOCKED"),
        GateEvent::StateChange { to: GateState::Validating, .. } => "VALIDATING...".to_owned(),
        GateEvent::WormholeEstablished { destination } => {
            format!("WORMHOLE ACTIVE: {}", destination.name)
        },
        GateEvent::DialFailed { reason } => reason.to_string().to_uppercase(),
        GateEvent::Aborted { .. } => "ABORTED".to_owned(),
        GateEvent::Shutdown => "SHUTDOWN".to_owned(),
        GateEvent::Reset => "IDLE".to_owned(),
        GateEvent::StateChange { .. }
        | GateEvent::ValidateAddress { .. }
        | GateEvent::WaitForRing { .. } => return None,
    };
    Some(status)
}

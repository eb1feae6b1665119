//! Gate events and the channel that carries them.
//!
//! Every notification the protocol makes goes through [`EventChannel`]:
//! state changes, progress, input rejections, and the two continuation
//! requests ([`GateEvent::WaitForRing`], [`GateEvent::ValidateAddress`]) that
//! the orchestrator must answer.
//!
//! Subscribers pattern-match on [`GateEvent`]. Payloads are owned copies, so
//! a subscriber can never reach back into protocol state.

use std::fmt;

use tokio::sync::mpsc;

use crate::dial::{ChevronNumber, Destination, DialMode, GateState, GlyphId};

/// Single-use ticket for a continuation the protocol is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    /// Wrap a raw ticket number.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw ticket number.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Why [`crate::GateProtocol::add_glyph`] refused a glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRejection {
    /// Glyph is already part of the address.
    DuplicateGlyph {
        /// The rejected glyph.
        glyph: GlyphId,
    },
    /// Address already has `mode - 1` glyphs.
    BufferFull,
}

impl fmt::Display for InputRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateGlyph { glyph } => write!(f, "duplicate_glyph: {glyph}"),
            Self::BufferFull => f.write_str("buffer_full"),
        }
    }
}

/// Why a dial attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// No whitelist match and no procedural destination.
    InvalidAddress,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddress => f.write_str("No connection - address unknown"),
        }
    }
}

/// Extra context attached to a state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionDetail {
    /// Nothing to add.
    None,
    /// Chevron that just locked.
    Chevron {
        /// Physical chevron number.
        chevron: ChevronNumber,
        /// Whether this is the final (point of origin) chevron.
        is_last: bool,
    },
    /// Destination the wormhole connected to.
    Destination(Destination),
    /// Reason the attempt failed.
    Failure(FailureReason),
}

/// Notifications published by [`crate::GateProtocol`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateEvent {
    /// State machine moved between states.
    StateChange {
        /// Previous state.
        from: GateState,
        /// New state.
        to: GateState,
        /// Transition context.
        detail: TransitionDetail,
    },

    /// Dial mode changed.
    ModeChange {
        /// New mode.
        mode: DialMode,
    },

    /// Glyph appended to the address.
    GlyphAdded {
        /// The glyph.
        glyph: GlyphId,
        /// Address after the append.
        buffer: Vec<GlyphId>,
    },

    /// Glyph refused.
    Error(InputRejection),

    /// Ring should travel to `glyph` for the next chevron.
    ChevronEncoding {
        /// Physical chevron number.
        chevron: ChevronNumber,
        /// Position in the lock sequence (0-based).
        index: usize,
        /// Whether this is the final chevron.
        is_last: bool,
        /// Glyph to encode. Always the point of origin on the final chevron.
        glyph: GlyphId,
    },

    /// Chevron engaged.
    ChevronLocked {
        /// Physical chevron number.
        chevron: ChevronNumber,
        /// Chevrons locked so far in this attempt.
        total: usize,
    },

    /// Whitelist lookup request.
    ///
    /// The listener must answer exactly once with
    /// [`crate::GateProtocol::resolve_destination`].
    ValidateAddress {
        /// Address to look up.
        buffer: Vec<GlyphId>,
        /// Ticket for the answer.
        request: RequestId,
    },

    /// Outgoing wormhole open.
    WormholeEstablished {
        /// Where it leads.
        destination: Destination,
    },

    /// Dial attempt failed after all chevrons locked.
    DialFailed {
        /// Why.
        reason: FailureReason,
    },

    /// Attempt aborted. Reset follows automatically.
    Aborted {
        /// Whether a wormhole was open when the abort happened.
        was_active: bool,
    },

    /// Gate shutting down. Reset follows automatically.
    Shutdown,

    /// Gate returned to idle with an empty address.
    Reset,

    /// Ring rotation request.
    ///
    /// Follows the matching [`GateEvent::ChevronEncoding`]. The listener must
    /// rotate the ring and, on arrival, call
    /// [`crate::GateProtocol::ring_arrived`] with this ticket.
    WaitForRing {
        /// Ticket for the arrival.
        request: RequestId,
    },
}

impl GateEvent {
    /// Short event name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StateChange { .. } => "stateChange",
            Self::ModeChange { .. } => "modeChange",
            Self::GlyphAdded { .. } => "glyphAdded",
            Self::Error(_) => "error",
            Self::ChevronEncoding { .. } => "chevronEncoding",
            Self::ChevronLocked { .. } => "chevronLocked",
            Self::ValidateAddress { .. } => "validateAddress",
            Self::WormholeEstablished { .. } => "wormholeEstablished",
            Self::DialFailed { .. } => "dialFailed",
            Self::Aborted { .. } => "aborted",
            Self::Shutdown => "shutdown",
            Self::Reset => "reset",
            Self::WaitForRing { .. } => "waitForRing",
        }
    }
}

/// Publish/subscribe registry for [`GateEvent`]s.
///
/// Each subscriber gets its own unbounded queue, so publishing never blocks
/// and never re-enters subscriber code. Subscribers that dropped their
/// receiver are pruned on the next publish.
#[derive(Debug, Default)]
pub struct EventChannel {
    subscribers: Vec<mpsc::UnboundedSender<GateEvent>>,
}

impl EventChannel {
    /// Create a channel with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber. It sees events published from now on.
    pub fn subscribe(&mut self) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        EventReceiver { rx }
    }

    /// Deliver `event` to every live subscriber.
    pub fn publish(&mut self, event: GateEvent) {
        tracing::trace!(event = event.name(), ?event, "publish");
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers as of the last publish.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Receiving end of an [`EventChannel`] subscription.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<GateEvent>,
}

impl EventReceiver {
    /// Next queued event, without waiting.
    pub fn try_next(&mut self) -> Option<GateEvent> {
        self.rx.try_recv().ok()
    }

    /// Take every queued event.
    pub fn drain(&mut self) -> Vec<GateEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_next() {
            events.push(event);
        }
        events
    }

    /// Wait for the next event. `None` once the channel is dropped.
    pub async fn recv(&mut self) -> Option<GateEvent> {
        self.rx.recv().await
    }
}

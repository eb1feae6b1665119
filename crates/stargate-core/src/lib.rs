//! Core state machines for the Stargate dialing widget
//!
//! Pure logic, no I/O: the dialing protocol, the ring physics integrator, and
//! the event channel that connects them to an orchestrator. Every
//! time-dependent method takes `now` as a parameter, so the same code runs
//! against the system clock in production and a virtual clock in simulation.
//!
//! # Components
//!
//! - [`GateProtocol`]: dialing rules, chevron sequencing, validation, abort and
//!   reset
//! - [`RingController`]: ring rotation physics with damped overshoot
//! - [`EventChannel`]: typed publish/subscribe for [`GateEvent`]s
//! - [`Timers`]: deadline table behind the protocol's pauses and auto-reset

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod clock;
mod dial;
mod error;
mod event;
mod protocol;
mod ring;
mod timer;

pub use clock::Instant;
pub use dial::{
    ChevronNumber, DEFAULT_PROCEDURAL_WINDOW, Destination, DialMode, GLYPH_COUNT, GateState,
    GlyphId, POINT_OF_ORIGIN, hash_address, procedural_destination,
};
pub use error::{GateError, RingError};
pub use event::{
    EventChannel, EventReceiver, FailureReason, GateEvent, InputRejection, RequestId,
    TransitionDetail,
};
pub use protocol::{
    Awaiting, DEFAULT_ABORT_RESET_DELAY, DEFAULT_CHEVRON_PAUSE, DEFAULT_SHUTDOWN_RESET_DELAY,
    GateConfig, GateProtocol, GateSnapshot,
};
pub use ring::{
    Arrival, ArrivalOutcome, DEGREES_PER_GLYPH, Direction, RingConfig, RingController, RingSurface,
};
pub use timer::{TimerHandle, Timers};

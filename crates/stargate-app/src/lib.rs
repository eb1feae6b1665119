//! Application layer for the Stargate widget
//!
//! Wires the pure state machines from `stargate-core` to the outside world:
//! user commands in, rendered views out, ring rotations and whitelist lookups
//! in between. The same [`Runtime`] runs against a host frame loop in
//! production and against a virtual clock in simulation.
//!
//! # Components
//!
//! - [`Driver`]: Trait for platform-specific input, time, frames and rendering
//! - [`Runtime`]: Generic orchestration loop using Driver
//! - [`Whitelist`]: Destination lookup collaborator, with [`StaticWhitelist`]
//! - [`GateView`]: Render model handed to the driver each frame

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod command;
mod driver;
mod error;
mod runtime;
mod view;
mod whitelist;

pub use command::GateCommand;
pub use driver::Driver;
pub use error::WhitelistError;
pub use runtime::Runtime;
pub use view::{GateView, RingView, status_for};
pub use whitelist::{StaticWhitelist, Whitelist, WhitelistEntry};

//! Terminal console for the Stargate gate
//!
//! A thin shell over [`stargate_app::Driver`] that provides terminal-specific
//! I/O. All orchestration logic lives in the generic [`stargate_app::Runtime`].
//!
//! This crate only handles key input and terminal rendering.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod input;
pub mod terminal;
pub mod ui;

pub use input::{InputState, KeyInput};
pub use stargate_app::{Driver, GateCommand, GateView, Runtime};
pub use terminal::{TerminalDriver, TerminalError};

/// Whitelist shipped with the console.
pub const DEFAULT_WHITELIST_JSON: &str = include_str!("../whitelist.json");

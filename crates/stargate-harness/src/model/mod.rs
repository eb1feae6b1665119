//! Model-based testing framework.
//!
//! A reference implementation of the gate protocol, written for obviousness
//! rather than structure: plain fields, millisecond integers for time, one
//! `match` per operation. Operations are applied to both the model and the
//! real [`stargate_core::GateProtocol`], and their observable states are
//! compared.

mod gate;
mod operation;

pub use gate::{ModelGate, listed_destination};
pub use operation::{Operation, OperationResult};

//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the runtime from the host. Each host
//! implements it to provide input, a clock, frame pacing and rendering, while
//! the generic [`crate::Runtime`] handles all orchestration.

use std::future::Future;

use crate::{GateCommand, GateView};

/// Abstracts I/O operations for the runtime.
///
/// # Implementations
///
/// - **Browser / game engine**: frame callback paces `next_frame`, pointer
///   events become commands, `render` writes the view to the scene
/// - **Simulation**: virtual clock advanced one frame per `next_frame`,
///   scripted commands, rendered views recorded for assertions
///
/// # Associated Types
///
/// - [`Error`](Driver::Error): Platform-specific error type
/// - [`Instant`](Driver::Instant): Time representation (real or virtual)
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Time instant type. Enables virtual time in simulation.
    type Instant: stargate_core::Instant;

    /// Poll for the next user command.
    ///
    /// Returns `None` if no command is ready.
    fn poll_command(
        &mut self,
    ) -> impl Future<Output = Result<Option<GateCommand>, Self::Error>> + Send;

    /// Wait for the next display refresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the host's frame source is gone.
    fn next_frame(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Current time instant.
    fn now(&self) -> Self::Instant;

    /// Render the gate.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, view: &GateView) -> Result<(), Self::Error>;

    /// Release host resources.
    fn stop(&mut self);
}

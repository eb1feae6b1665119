//! UI rendering
//!
//! Rendering functions that convert a [`GateView`] into terminal output using
//! ratatui widgets. All functions are pure (no I/O), taking state and
//! returning widget trees.

mod address;
mod chevrons;
mod ring;
mod status;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};
pub use ring::tape;

use crate::{GateView, InputState};

/// Render the entire console.
pub fn render(frame: &mut Frame, view: &GateView, input: &InputState) {
    const RING_HEIGHT: u16 = 4;
    const CHEVRON_HEIGHT: u16 = 3;
    const ADDRESS_HEIGHT: u16 = 3;
    const STATUS_HEIGHT: u16 = 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(RING_HEIGHT),
            Constraint::Length(CHEVRON_HEIGHT),
            Constraint::Length(ADDRESS_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let [ring_area, chevron_area, address_area, _, status_area] = chunks.as_ref() else {
        return;
    };

    ring::render(frame, view, *ring_area);
    chevrons::render(frame, view, *chevron_area);
    address::render(frame, view, input, *address_area);
    status::render(frame, view, *status_area);
}

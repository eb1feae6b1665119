//! Status bar
//!
//! Displays the gate state, mode and the latest status line.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use stargate_core::GateState;

use crate::GateView;

fn state_color(state: GateState) -> Color {
    match state {
        GateState::Idle => Color::Gray,
        GateState::Dialing | GateState::ChevronLock => Color::Yellow,
        GateState::Validating => Color::Cyan,
        GateState::ActiveOutbound | GateState::ActiveIncoming => Color::Green,
        GateState::IrisCheck => Color::Blue,
        GateState::Shutdown => Color::Magenta,
        GateState::Aborted => Color::Red,
    }
}

/// Render the status bar.
pub fn render(frame: &mut Frame, view: &GateView, area: Rect) {
    let gate = &view.gate;

    let state = Span::styled(
        gate.state.to_string(),
        Style::default().fg(state_color(gate.state)).add_modifier(Modifier::BOLD),
    );
    let mode = format!(" | {}-chevron | ", gate.mode.chevron_count());

    let status_line = Line::from(vec![
        Span::raw(" "),
        state,
        Span::styled(mode, Style::default().fg(Color::Gray)),
        Span::raw(view.status.clone()),
    ]);

    let paragraph =
        Paragraph::new(status_line).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(paragraph, area);
}

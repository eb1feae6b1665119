//! Chevron row
//!
//! One slot per chevron of the current mode, lit once locked.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::GateView;

/// Render the chevron row.
pub fn render(frame: &mut Frame, view: &GateView, area: Rect) {
    let gate = &view.gate;
    let count = gate.mode.chevron_count();

    let slots: Vec<Span> = (1..=count as u8)
        .map(|chevron| {
            if gate.locked_chevrons.contains(&chevron) {
                Span::styled(
                    format!(" ◆{chevron} "),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )
            } else {
                Span::styled(format!(" ◇{chevron} "), Style::default().fg(Color::DarkGray))
            }
        })
        .collect();

    let title = format!(" Chevrons {}/{count} ", gate.locked_chevrons.len());
    let paragraph = Paragraph::new(Line::from(slots).centered())
        .block(Block::default().borders(Borders::ALL).title(title));

    frame.render_widget(paragraph, area);
}

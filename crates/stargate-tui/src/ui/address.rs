//! Address line
//!
//! Displays the committed glyphs and the number being typed, with cursor.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::{GateView, InputState};

const INPUT_LINE_OFFSET_Y: u16 = 1; // inside top border
const LEFT_PADDING: u16 = 1; // inside left border
const RIGHT_PADDING: u16 = 1; // inside right border

/// Render the address line.
pub fn render(frame: &mut Frame, view: &GateView, input: &InputState, area: Rect) {
    let gate = &view.gate;
    let committed: Vec<String> = gate.buffer.iter().map(ToString::to_string).collect();
    let mut committed = committed.join("-");
    if !committed.is_empty() && !input.entry().is_empty() {
        committed.push('-');
    }

    let typed = (committed.len() + input.entry().len()) as u16;

    let line = Line::from(vec![
        Span::styled(committed, Style::default().fg(Color::White)),
        Span::styled(input.entry().to_owned(), Style::default().fg(Color::Cyan)),
    ]);

    let title = format!(" Address {}/{} ", gate.buffer.len(), gate.mode.max_glyphs());
    let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title(title));

    frame.render_widget(paragraph, area);

    let cursor_x = area.x.saturating_add(LEFT_PADDING).saturating_add(typed);
    let cursor_y = area.y.saturating_add(INPUT_LINE_OFFSET_Y);
    let max_x = area.x.saturating_add(area.width).saturating_sub(RIGHT_PADDING);

    frame.set_cursor_position((cursor_x.min(max_x), cursor_y));
}

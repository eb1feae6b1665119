//! Ring strip
//!
//! Glyphs on either side of the top marker, with the ring's angle.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use stargate_core::{GLYPH_COUNT, GlyphId};

use crate::GateView;

/// Columns per glyph cell, including the separator.
const CELL_WIDTH: u16 = 4;

/// Glyphs visible on the strip, `radius` on each side of `center`.
pub fn tape(center: GlyphId, radius: usize) -> Vec<GlyphId> {
    let count = i64::from(GLYPH_COUNT);
    let radius = radius as i64;
    (-radius..=radius)
        .map(|offset| (i64::from(center) + offset).rem_euclid(count) as GlyphId)
        .collect()
}

/// Render the ring strip.
pub fn render(frame: &mut Frame, view: &GateView, area: Rect) {
    let inner_width = area.width.saturating_sub(2);
    let radius = usize::from(inner_width / CELL_WIDTH).saturating_sub(1) / 2;
    let center = view.glyph_under_marker;

    let glyphs: Vec<Span> = tape(center, radius)
        .into_iter()
        .map(|glyph| {
            let style = if glyph == center {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Span::styled(format!("{glyph:^3} "), style)
        })
        .collect();

    let marker = Line::from(Span::styled("▼", Style::default().fg(Color::Red))).centered();
    let strip = Line::from(glyphs).centered();

    let spin = if view.ring.spinning { "spinning" } else { "at rest" };
    let title = format!(" Ring {:6.1}° {spin} ", view.ring.rotation.rem_euclid(360.0));

    let paragraph = Paragraph::new(vec![marker, strip])
        .block(Block::default().borders(Borders::ALL).title(title));

    frame.render_widget(paragraph, area);
}

//! Transient notice shown after a save or load.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget},
};

const MAX_WIDTH: u16 = 60;
const MAX_BODY_LINES: u16 = 2;

pub struct Toast<'a> {
    message: &'a str,
}

impl<'a> Toast<'a> {
    pub fn new(message: &'a str) -> Self {
        Self { message }
    }

    /// Bottom-right placement, sized to the message. Long messages take a
    /// second row before they get cut.
    pub fn area(&self, screen: Rect) -> Rect {
        let wanted = self.message.chars().count() as u16 + 4;
        let width = wanted
            .min(MAX_WIDTH)
            .min(screen.width.saturating_sub(4))
            .max(10.min(screen.width));
        let inner = width.saturating_sub(2).max(1);
        let lines = (self.message.chars().count() as u16)
            .div_ceil(inner)
            .clamp(1, MAX_BODY_LINES);
        let height = (lines + 2).min(screen.height);
        let x = screen.width.saturating_sub(width + 2);
        let y = screen.height.saturating_sub(height + 1);
        Rect::new(x, y, width, height)
    }

    /// Splits the message into rows of `inner.width` chars, ending in `…`
    /// when it does not fit.
    fn body(&self, inner: Rect) -> Vec<String> {
        let width = (inner.width as usize).max(1);
        let budget = width * inner.height as usize;
        let mut chars: Vec<char> = self.message.chars().collect();
        if chars.len() > budget {
            chars.truncate(budget.saturating_sub(1));
            chars.push('…');
        }
        chars.chunks(width).map(|row| row.iter().collect()).collect()
    }
}

impl Widget for Toast<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Green))
            .style(Style::default().bg(Color::Black));
        let inner = block.inner(area);
        block.render(area, buf);

        let style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
        let lines: Vec<Line> = self
            .body(inner)
            .into_iter()
            .map(|row| Line::styled(row, style))
            .collect();
        Paragraph::new(lines).render(inner, buf);
    }
}

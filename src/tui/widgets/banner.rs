//! Error banner shown above the results.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

/// Maximum banner height, borders included.
pub const MAX_HEIGHT: u16 = 5;

pub struct ErrorBanner<'a> {
    message: &'a str,
}

impl<'a> ErrorBanner<'a> {
    pub fn new(message: &'a str) -> Self {
        Self { message }
    }

    /// Height needed to show the message at `width`, capped at [`MAX_HEIGHT`].
    pub fn height(&self, width: u16) -> u16 {
        let inner = width.saturating_sub(2).max(1) as usize;
        let lines: usize = self
            .message
            .lines()
            .map(|line| line.chars().count().div_ceil(inner).max(1))
            .sum();
        (lines.max(1) as u16 + 2).min(MAX_HEIGHT)
    }
}

impl Widget for ErrorBanner<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().fg(Color::Red);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(style)
            .title(Span::styled(" Error ", style.add_modifier(Modifier::BOLD)));

        let lines: Vec<Line> = self
            .message
            .lines()
            .map(|line| Line::from(Span::styled(line.to_string(), style)))
            .collect();

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

//! SQL editor widget.
//!
//! Multi-line text area with line numbers. Scrolls to keep the cursor
//! visible and reports where the terminal cursor belongs.

use crate::tui::app::EditorState;
use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Calculates the scroll offset needed to keep the cursor visible.
///
/// Returns the number of lines (or characters) to skip from the start.
pub fn calculate_scroll_offset(cursor: usize, available: usize) -> usize {
    if available == 0 {
        cursor
    } else if cursor < available {
        0
    } else {
        cursor + 1 - available
    }
}

/// Editor pane widget.
pub struct Editor<'a> {
    state: &'a EditorState,
    focused: bool,
}

impl<'a> Editor<'a> {
    pub fn new(state: &'a EditorState, focused: bool) -> Self {
        Self { state, focused }
    }

    fn gutter_width(&self) -> usize {
        self.state.lines().len().to_string().len() + 1
    }

    /// Terminal cursor position inside `area`, when the editor is focused.
    pub fn cursor_position(&self, area: Rect) -> Option<Position> {
        if !self.focused || area.width < 3 || area.height < 3 {
            return None;
        }
        let inner_width = area.width.saturating_sub(2) as usize;
        let inner_height = area.height.saturating_sub(2) as usize;
        let gutter = self.gutter_width();
        let text_width = inner_width.saturating_sub(gutter);

        let (row, col) = self.state.cursor();
        let row_offset = calculate_scroll_offset(row, inner_height);
        let col_offset = calculate_scroll_offset(col, text_width);

        Some(Position::new(
            area.x + 1 + (gutter + col - col_offset) as u16,
            area.y + 1 + (row - row_offset) as u16,
        ))
    }
}

impl Widget for Editor<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" SQL ")
            .title_bottom(Line::from(" Ctrl-Enter/F5 run · Ctrl-S save · Ctrl-O open ").right_aligned());

        let inner = block.inner(area);
        let gutter = self.gutter_width();
        let text_width = (inner.width as usize).saturating_sub(gutter);

        let (row, col) = self.state.cursor();
        let row_offset = calculate_scroll_offset(row, inner.height as usize);
        let col_offset = if self.focused {
            calculate_scroll_offset(col, text_width)
        } else {
            0
        };

        let lines: Vec<Line> = self
            .state
            .lines()
            .iter()
            .enumerate()
            .skip(row_offset)
            .take(inner.height as usize)
            .map(|(i, text)| {
                // Horizontal scroll follows the cursor line only.
                let skip = if i == row { col_offset } else { 0 };
                let visible: String = text.chars().skip(skip).collect();
                Line::from(vec![
                    Span::styled(
                        format!("{:>width$} ", i + 1, width = gutter - 1),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::raw(visible),
                ])
            })
            .collect();

        Paragraph::new(lines).block(block).render(area, buf);
    }
}

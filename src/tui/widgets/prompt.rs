//! Open-file prompt: asks for the path of a database file to load.

use super::confirm::center_rect;
use crate::tui::app::PromptState;
use ratatui::{
    layout::{Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Renders the prompt and places the terminal cursor in it.
pub fn render_open_prompt(frame: &mut Frame, prompt: &PromptState) {
    let area = frame.area();
    let width = area.width.saturating_sub(4).clamp(20, 70).min(area.width);
    let dialog = center_rect(width, 4.min(area.height), area);

    frame.render_widget(Clear, dialog);

    let text_width = dialog.width.saturating_sub(4) as usize;
    let skip = prompt.cursor.saturating_sub(text_width);
    let visible: String = prompt.text.chars().skip(skip).collect();

    let lines = vec![
        Line::from(vec![
            Span::styled(
                "> ",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(visible),
        ]),
        Line::from(Span::styled(
            "Enter load · Esc cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default()
        .title(" Open database file ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .style(Style::default().bg(Color::Black));

    frame.render_widget(Paragraph::new(lines).block(block), dialog);

    if let Some(position) = cursor_position(dialog, prompt.cursor - skip) {
        frame.set_cursor_position(position);
    }
}

fn cursor_position(dialog: Rect, column: usize) -> Option<Position> {
    if dialog.height < 3 {
        return None;
    }
    Some(Position::new(dialog.x + 3 + column as u16, dialog.y + 1))
}

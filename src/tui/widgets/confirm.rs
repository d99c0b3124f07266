//! Large-result confirmation dialog.
//!
//! Shown when the first result has more rows than the display threshold:
//! the user picks between rendering everything and rendering the first
//! `threshold` rows of each result.

use ratatui::{
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Renders the confirmation dialog centered on the frame.
pub fn render_confirmation_dialog(frame: &mut Frame, row_count: usize, threshold: usize) {
    let area = frame.area();

    let dialog_width = (area.width as f32 * 0.6).clamp(30.0, 70.0) as u16;
    let dialog_area = center_rect(dialog_width.min(area.width), 8.min(area.height), area);

    frame.render_widget(Clear, dialog_area);

    let lines = vec![
        Line::from(Span::styled(
            format!("⚠ The query returned {row_count} rows."),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Rendering all of them may take a while."),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "[y/Enter]",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" Show all  "),
            Span::styled(
                "[n/Esc]",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(" First {threshold}")),
        ]),
    ];

    let block = Block::default()
        .title("Large Result")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, dialog_area);
}

/// Centers a rectangle of the given size within the parent area.
pub fn center_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([Constraint::Length(width)]).flex(Flex::Center);
    let vertical = Layout::vertical([Constraint::Length(height)]).flex(Flex::Center);

    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}

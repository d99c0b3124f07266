//! UI rendering for the TUI.
//!
//! Defines the layout and renders all UI components.

use super::app::{App, Focus};
use super::widgets::{banner, confirm, editor, header, prompt, results, toast};
use crate::console::{Console, Output};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

/// Editor height as a percentage of the content area.
const EDITOR_PERCENT: u16 = 35;

/// Renders the entire UI.
pub fn render(frame: &mut Frame, app: &App, console: &Console) {
    let area = frame.area();

    let banner_height = console
        .error()
        .map(|message| banner::ErrorBanner::new(message).height(area.width))
        .unwrap_or(0);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Percentage(EDITOR_PERCENT),
            Constraint::Length(banner_height),
            Constraint::Min(3),
        ])
        .split(area);

    render_header(frame, layout[0], app, console);
    render_editor(frame, layout[1], app);
    if let Some(message) = console.error() {
        frame.render_widget(banner::ErrorBanner::new(message), layout[2]);
    }
    render_results(frame, layout[3], app, console);

    // Overlays, topmost last.
    if let Output::AwaitingConfirmation {
        row_count,
        threshold,
    } = console.output()
    {
        confirm::render_confirmation_dialog(frame, *row_count, *threshold);
    }

    if let Some(state) = &app.prompt {
        prompt::render_open_prompt(frame, state);
    }

    if let Some((message, _)) = &app.toast {
        let notice = toast::Toast::new(message);
        let notice_area = notice.area(area);
        frame.render_widget(notice, notice_area);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App, console: &Console) {
    let widget = header::Header::new(console.database_label(), app.spinner.as_ref());
    frame.render_widget(widget, area);
}

fn render_editor(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Editor && app.prompt.is_none();
    let widget = editor::Editor::new(&app.editor, focused);
    let cursor = widget.cursor_position(area);
    frame.render_widget(widget, area);

    if let Some(position) = cursor {
        frame.set_cursor_position(position);
    }
}

fn render_results(frame: &mut Frame, area: Rect, app: &App, console: &Console) {
    let focused = app.focus == Focus::Results;
    let widget = results::ResultsPanel::new(console.output(), app.results_scroll, focused);
    frame.render_widget(widget, area);
}

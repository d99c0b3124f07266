//! Application state for the TUI.
//!
//! Holds everything the terminal front-end owns itself (editor buffer, focus,
//! scroll, prompts). Console state (output, error banner) lives in
//! [`crate::console::Console`]; key handling here only decides which console
//! operation a key maps to.

use super::events::Event;
use super::widgets::spinner::Spinner;
use crate::console::{Confirmation, RequestKind};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// How long a toast stays on screen.
const TOAST_DURATION: Duration = Duration::from_secs(3);

/// Lines scrolled by PageUp/PageDown.
const PAGE_SCROLL: usize = 10;

/// Which panel currently has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Editor,
    Results,
}

impl Focus {
    /// Cycles to the next focus panel.
    pub fn next(self) -> Self {
        match self {
            Self::Editor => Self::Results,
            Self::Results => Self::Editor,
        }
    }
}

/// What the event loop should do after a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    /// Run the editor contents.
    Execute,
    /// Export the database to the configured file.
    Save,
    /// Load the database file at this path.
    Load(PathBuf),
    /// Answer the large-result prompt.
    Confirm(Confirmation),
    /// The editor text changed.
    QueryEdited,
}

/// Multi-line editor buffer. The cursor is a (line, character) position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorState {
    lines: Vec<String>,
    row: usize,
    col: usize,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new("")
    }
}

fn byte_index(line: &str, col: usize) -> usize {
    line.char_indices()
        .nth(col)
        .map(|(i, _)| i)
        .unwrap_or(line.len())
}

fn char_len(line: &str) -> usize {
    line.chars().count()
}

impl EditorState {
    /// Creates an editor holding `text`, cursor at the end.
    pub fn new(text: &str) -> Self {
        let mut editor = Self {
            lines: vec![String::new()],
            row: 0,
            col: 0,
        };
        editor.set_text(text);
        editor
    }

    /// Replaces the contents and moves the cursor to the end.
    pub fn set_text(&mut self, text: &str) {
        self.lines = text.split('\n').map(str::to_string).collect();
        self.row = self.lines.len() - 1;
        self.col = char_len(&self.lines[self.row]);
    }

    /// Full editor text, lines joined with `\n`.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Cursor as (line, character).
    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    fn current(&self) -> &str {
        &self.lines[self.row]
    }

    pub fn insert(&mut self, c: char) {
        if c == '\n' {
            self.newline();
            return;
        }
        let at = byte_index(self.current(), self.col);
        self.lines[self.row].insert(at, c);
        self.col += 1;
    }

    /// Inserts pasted text; `\r\n` and `\r` become line breaks.
    pub fn insert_str(&mut self, text: &str) {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        for c in normalized.chars() {
            self.insert(c);
        }
    }

    /// Splits the current line at the cursor.
    pub fn newline(&mut self) {
        let at = byte_index(self.current(), self.col);
        let rest = self.lines[self.row].split_off(at);
        self.row += 1;
        self.lines.insert(self.row, rest);
        self.col = 0;
    }

    /// Deletes the character before the cursor, joining lines at column 0.
    pub fn backspace(&mut self) {
        if self.col > 0 {
            self.col -= 1;
            let at = byte_index(self.current(), self.col);
            self.lines[self.row].remove(at);
        } else if self.row > 0 {
            let line = self.lines.remove(self.row);
            self.row -= 1;
            self.col = char_len(self.current());
            self.lines[self.row].push_str(&line);
        }
    }

    /// Deletes the character at the cursor, joining with the next line at
    /// the end of a line.
    pub fn delete(&mut self) {
        if self.col < char_len(self.current()) {
            let at = byte_index(self.current(), self.col);
            self.lines[self.row].remove(at);
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
        }
    }

    /// Deletes the word before the cursor on the current line.
    pub fn delete_word_backward(&mut self) {
        if self.col == 0 {
            self.backspace();
            return;
        }
        let chars: Vec<char> = self.current().chars().collect();
        let mut start = self.col;
        while start > 0 && chars[start - 1].is_whitespace() {
            start -= 1;
        }
        while start > 0 && !chars[start - 1].is_whitespace() {
            start -= 1;
        }
        let from = byte_index(self.current(), start);
        let to = byte_index(self.current(), self.col);
        self.lines[self.row].replace_range(from..to, "");
        self.col = start;
    }

    pub fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = char_len(self.current());
        }
    }

    pub fn move_right(&mut self) {
        if self.col < char_len(self.current()) {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn move_up(&mut self) {
        if self.row > 0 {
            self.row -= 1;
            self.col = self.col.min(char_len(self.current()));
        }
    }

    pub fn move_down(&mut self) {
        if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = self.col.min(char_len(self.current()));
        }
    }

    pub fn move_home(&mut self) {
        self.col = 0;
    }

    pub fn move_end(&mut self) {
        self.col = char_len(self.current());
    }
}

/// Single-line input for the open-file prompt.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PromptState {
    pub text: String,
    /// Cursor position (character index).
    pub cursor: usize,
}

impl PromptState {
    pub fn insert(&mut self, c: char) {
        let at = byte_index(&self.text, self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = byte_index(&self.text, self.cursor);
            self.text.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(char_len(&self.text));
    }
}

/// Main application state.
pub struct App {
    /// Whether the application is still running.
    pub running: bool,
    /// Current focus panel.
    pub focus: Focus,
    pub editor: EditorState,
    /// Results scroll offset (lines from the top).
    pub results_scroll: usize,
    /// Open-file prompt, when shown.
    pub prompt: Option<PromptState>,
    /// Toast message and when it was shown.
    pub toast: Option<(String, Instant)>,
    /// Spinner for the request in flight.
    pub spinner: Option<Spinner>,
}

impl App {
    /// Creates the app with the editor holding `query`.
    pub fn new(query: &str) -> Self {
        Self {
            running: true,
            focus: Focus::default(),
            editor: EditorState::new(query),
            results_scroll: 0,
            prompt: None,
            toast: None,
            spinner: None,
        }
    }

    /// Shows a toast notification.
    pub fn show_toast(&mut self, message: impl Into<String>) {
        self.toast = Some((message.into(), Instant::now()));
    }

    /// Drops the toast once it has been visible long enough.
    pub fn clear_expired_toast(&mut self) {
        if let Some((_, shown)) = &self.toast {
            if shown.elapsed() >= TOAST_DURATION {
                self.toast = None;
            }
        }
    }

    /// Keeps the spinner in step with the console's in-flight request.
    pub fn sync_spinner(&mut self, busy: Option<&RequestKind>) {
        match busy {
            Some(kind) => {
                let stale = self
                    .spinner
                    .as_ref()
                    .map_or(true, |spinner| spinner.label() != kind.label());
                if stale {
                    self.spinner = Some(Spinner::executing(kind.label()));
                }
            }
            None => self.spinner = None,
        }
    }

    /// Handles an event and returns what the event loop should do.
    ///
    /// `awaiting_confirmation` routes keys to the large-result prompt.
    pub fn handle_event(&mut self, event: Event, awaiting_confirmation: bool) -> Action {
        match event {
            Event::Key(key) => self.handle_key(key, awaiting_confirmation),
            Event::Paste(text) => {
                if let Some(prompt) = self.prompt.as_mut() {
                    for c in text.chars().filter(|c| !c.is_control()) {
                        prompt.insert(c);
                    }
                    Action::None
                } else if self.focus == Focus::Editor && !awaiting_confirmation {
                    self.editor.insert_str(&text);
                    Action::QueryEdited
                } else {
                    Action::None
                }
            }
            Event::Resize(_, _) | Event::Tick => Action::None,
        }
    }

    fn handle_key(&mut self, key: KeyEvent, awaiting_confirmation: bool) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
            self.running = false;
            return Action::Quit;
        }

        if awaiting_confirmation {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    Action::Confirm(Confirmation::ShowAll)
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    Action::Confirm(Confirmation::ShowPartial)
                }
                _ => Action::None,
            };
        }

        if self.prompt.is_some() {
            return self.handle_prompt_key(key);
        }

        match key.code {
            KeyCode::Enter if ctrl => return Action::Execute,
            KeyCode::F(5) => return Action::Execute,
            KeyCode::Char('s') if ctrl => return Action::Save,
            KeyCode::Char('o') if ctrl => {
                self.prompt = Some(PromptState::default());
                return Action::None;
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = self.focus.next();
                return Action::None;
            }
            _ => {}
        }

        match self.focus {
            Focus::Editor => self.handle_editor_key(key),
            Focus::Results => {
                self.handle_results_key(key);
                Action::None
            }
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> Action {
        let Some(prompt) = self.prompt.as_mut() else {
            return Action::None;
        };

        match key.code {
            KeyCode::Esc => self.prompt = None,
            KeyCode::Enter => {
                let path = prompt.text.trim().to_string();
                self.prompt = None;
                if !path.is_empty() {
                    return Action::Load(PathBuf::from(path));
                }
            }
            KeyCode::Char(c) => prompt.insert(c),
            KeyCode::Backspace => prompt.backspace(),
            KeyCode::Left => prompt.move_left(),
            KeyCode::Right => prompt.move_right(),
            _ => {}
        }
        Action::None
    }

    fn handle_editor_key(&mut self, key: KeyEvent) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let before = self.editor.clone();

        match key.code {
            KeyCode::Char('w') if ctrl => self.editor.delete_word_backward(),
            KeyCode::Char(_) if ctrl => {}
            KeyCode::Char(c) => self.editor.insert(c),
            KeyCode::Enter => self.editor.newline(),
            KeyCode::Backspace => self.editor.backspace(),
            KeyCode::Delete => self.editor.delete(),
            KeyCode::Left => self.editor.move_left(),
            KeyCode::Right => self.editor.move_right(),
            KeyCode::Up => self.editor.move_up(),
            KeyCode::Down => self.editor.move_down(),
            KeyCode::Home => self.editor.move_home(),
            KeyCode::End => self.editor.move_end(),
            _ => {}
        }

        if self.editor.lines() != before.lines() {
            Action::QueryEdited
        } else {
            Action::None
        }
    }

    fn handle_results_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.results_scroll = self.results_scroll.saturating_sub(1),
            KeyCode::Down => self.results_scroll = self.results_scroll.saturating_add(1),
            KeyCode::PageUp => {
                self.results_scroll = self.results_scroll.saturating_sub(PAGE_SCROLL)
            }
            KeyCode::PageDown => {
                self.results_scroll = self.results_scroll.saturating_add(PAGE_SCROLL)
            }
            KeyCode::Home => self.results_scroll = 0,
            // Clamped during render.
            KeyCode::End => self.results_scroll = usize::MAX,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::CONTROL))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_event(key(KeyCode::Char(c)), false);
        }
    }

    #[test]
    fn test_editor_new_places_cursor_at_end() {
        let editor = EditorState::new("SELECT 1\nFROM t");
        assert_eq!(editor.lines(), &["SELECT 1".to_string(), "FROM t".to_string()]);
        assert_eq!(editor.cursor(), (1, 6));
        assert_eq!(editor.text(), "SELECT 1\nFROM t");
    }

    #[test]
    fn test_editor_newline_splits_line() {
        let mut editor = EditorState::new("SELECT 1 FROM t");
        for _ in 0..7 {
            editor.move_left();
        }
        editor.newline();
        assert_eq!(editor.text(), "SELECT 1\n FROM t");
        assert_eq!(editor.cursor(), (1, 0));
    }

    #[test]
    fn test_editor_backspace_joins_lines() {
        let mut editor = EditorState::new("a\nb");
        editor.move_home();
        editor.backspace();
        assert_eq!(editor.text(), "ab");
        assert_eq!(editor.cursor(), (0, 1));
    }

    #[test]
    fn test_editor_delete_joins_next_line() {
        let mut editor = EditorState::new("a\nb");
        editor.move_up();
        editor.move_end();
        editor.delete();
        assert_eq!(editor.text(), "ab");
    }

    #[test]
    fn test_editor_multibyte_characters() {
        let mut editor = EditorState::new("'héllo'");
        editor.move_left();
        editor.backspace();
        assert_eq!(editor.text(), "'héll'");
        editor.move_home();
        editor.move_right();
        editor.move_right();
        editor.delete();
        assert_eq!(editor.text(), "'hll'");
    }

    #[test]
    fn test_editor_vertical_movement_clamps_column() {
        let mut editor = EditorState::new("SELECT *\nFROM t");
        editor.move_up();
        assert_eq!(editor.cursor(), (0, 6));
        editor.move_end();
        editor.move_down();
        assert_eq!(editor.cursor(), (1, 6));
    }

    #[test]
    fn test_editor_delete_word_backward() {
        let mut editor = EditorState::new("SELECT name  ");
        editor.delete_word_backward();
        assert_eq!(editor.text(), "SELECT ");
        editor.delete_word_backward();
        assert_eq!(editor.text(), "");
    }

    #[test]
    fn test_editor_paste_normalizes_line_breaks() {
        let mut editor = EditorState::new("");
        editor.insert_str("SELECT 1\r\nFROM t");
        assert_eq!(editor.lines().len(), 2);
        assert_eq!(editor.text(), "SELECT 1\nFROM t");
    }

    #[test]
    fn test_focus_cycle() {
        assert_eq!(Focus::Editor.next(), Focus::Results);
        assert_eq!(Focus::Results.next(), Focus::Editor);
    }

    #[test]
    fn test_typing_reports_edit() {
        let mut app = App::new("");
        assert_eq!(app.handle_event(key(KeyCode::Char('x')), false), Action::QueryEdited);
        assert_eq!(app.handle_event(key(KeyCode::Left), false), Action::None);
        assert_eq!(app.editor.text(), "x");
    }

    #[test]
    fn test_execute_save_and_quit_keys() {
        let mut app = App::new("SELECT 1");
        assert_eq!(app.handle_event(ctrl(KeyCode::Enter), false), Action::Execute);
        assert_eq!(app.handle_event(key(KeyCode::F(5)), false), Action::Execute);
        assert_eq!(app.handle_event(ctrl(KeyCode::Char('s')), false), Action::Save);
        assert!(app.running);
        assert_eq!(app.handle_event(ctrl(KeyCode::Char('q')), false), Action::Quit);
        assert!(!app.running);
    }

    #[test]
    fn test_plain_enter_inserts_newline() {
        let mut app = App::new("SELECT 1");
        assert_eq!(app.handle_event(key(KeyCode::Enter), false), Action::QueryEdited);
        assert_eq!(app.editor.text(), "SELECT 1\n");
    }

    #[test]
    fn test_confirmation_keys() {
        let mut app = App::new("");
        assert_eq!(
            app.handle_event(key(KeyCode::Char('y')), true),
            Action::Confirm(Confirmation::ShowAll)
        );
        assert_eq!(
            app.handle_event(key(KeyCode::Enter), true),
            Action::Confirm(Confirmation::ShowAll)
        );
        assert_eq!(
            app.handle_event(key(KeyCode::Char('n')), true),
            Action::Confirm(Confirmation::ShowPartial)
        );
        assert_eq!(
            app.handle_event(key(KeyCode::Esc), true),
            Action::Confirm(Confirmation::ShowPartial)
        );
        assert_eq!(app.handle_event(key(KeyCode::Char('x')), true), Action::None);
        assert!(app.editor.is_empty());
    }

    #[test]
    fn test_open_prompt_returns_path() {
        let mut app = App::new("");
        app.handle_event(ctrl(KeyCode::Char('o')), false);
        assert!(app.prompt.is_some());

        type_text(&mut app, "data/chinook.db");
        assert!(app.editor.is_empty());

        let action = app.handle_event(key(KeyCode::Enter), false);
        assert_eq!(action, Action::Load(PathBuf::from("data/chinook.db")));
        assert!(app.prompt.is_none());
    }

    #[test]
    fn test_open_prompt_escape_and_empty_path() {
        let mut app = App::new("");
        app.handle_event(ctrl(KeyCode::Char('o')), false);
        assert_eq!(app.handle_event(key(KeyCode::Enter), false), Action::None);
        assert!(app.prompt.is_none());

        app.handle_event(ctrl(KeyCode::Char('o')), false);
        type_text(&mut app, "x.db");
        app.handle_event(key(KeyCode::Esc), false);
        assert!(app.prompt.is_none());
    }

    #[test]
    fn test_results_scrolling_when_focused() {
        let mut app = App::new("");
        app.handle_event(key(KeyCode::Tab), false);
        assert_eq!(app.focus, Focus::Results);

        app.handle_event(key(KeyCode::PageDown), false);
        app.handle_event(key(KeyCode::Down), false);
        assert_eq!(app.results_scroll, 11);
        app.handle_event(key(KeyCode::Up), false);
        assert_eq!(app.results_scroll, 10);
        app.handle_event(key(KeyCode::Home), false);
        assert_eq!(app.results_scroll, 0);
        assert_eq!(app.handle_event(key(KeyCode::Char('a')), false), Action::None);
    }

    #[test]
    fn test_toast_expiry() {
        let mut app = App::new("");
        app.show_toast("Saved");
        app.clear_expired_toast();
        assert!(app.toast.is_some());

        app.toast = Some(("Saved".to_string(), Instant::now() - TOAST_DURATION));
        app.clear_expired_toast();
        assert!(app.toast.is_none());
    }

    #[test]
    fn test_sync_spinner() {
        let mut app = App::new("");
        app.sync_spinner(Some(&RequestKind::Execute));
        assert_eq!(app.spinner.as_ref().map(|s| s.label()), Some("Executing"));
        app.sync_spinner(Some(&RequestKind::Save));
        assert_eq!(app.spinner.as_ref().map(|s| s.label()), Some("Saving"));
        app.sync_spinner(None);
        assert!(app.spinner.is_none());
    }
}

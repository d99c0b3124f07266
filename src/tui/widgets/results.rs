//! Result table widgets for the TUI.
//!
//! Draws rendered tables with column headers, auto-sized columns and styled
//! NULL values, and the results panel around them.

use crate::console::{Cell, Output, RenderedTable, FETCHING_PLACEHOLDER};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Maximum width for any column.
const MAX_COLUMN_WIDTH: usize = 40;

/// Minimum width for any column.
const MIN_COLUMN_WIDTH: usize = 4;

fn text_width(s: &str) -> usize {
    s.chars().count()
}

/// Draws one rendered table as box-drawn lines.
pub struct ResultTable<'a> {
    table: &'a RenderedTable,
}

impl<'a> ResultTable<'a> {
    pub fn new(table: &'a RenderedTable) -> Self {
        Self { table }
    }

    /// Calculates the optimal width for each column.
    fn calculate_column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self
            .table
            .header
            .iter()
            .map(|name| text_width(name).max(MIN_COLUMN_WIDTH))
            .collect();

        for row in &self.table.body {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(text_width(&cell.text));
            }
        }

        widths.iter().map(|&w| w.min(MAX_COLUMN_WIDTH)).collect()
    }

    /// Truncates a string to fit within the given width, adding ellipsis if needed.
    /// Line breaks inside a value are shown as spaces.
    fn truncate(s: &str, max_width: usize) -> String {
        let flat: String = s
            .chars()
            .map(|c| if c == '\n' || c == '\r' || c == '\t' { ' ' } else { c })
            .collect();
        if text_width(&flat) <= max_width {
            flat
        } else if max_width <= 3 {
            flat.chars().take(max_width).collect()
        } else {
            let kept: String = flat.chars().take(max_width - 3).collect();
            format!("{kept}...")
        }
    }

    /// Footer line text.
    fn footer(&self) -> String {
        let total = self.table.total_rows;
        let plural = if total == 1 { "" } else { "s" };
        if self.table.is_truncated() {
            format!("showing {} of {} row{}", self.table.shown_rows(), total, plural)
        } else {
            format!("{} row{}", total, plural)
        }
    }

    /// Number of lines the table occupies: borders, header, rows and footer.
    pub fn line_count(&self) -> usize {
        if self.table.header.is_empty() {
            1
        } else {
            self.table.body.len() + 5
        }
    }

    /// Renders the table to a vector of Lines for embedding in other widgets.
    pub fn render_to_lines(&self, available_width: usize) -> Vec<Line<'static>> {
        self.render_window(available_width, 0, self.line_count())
    }

    /// Renders `len` lines starting at line `start`. Only rows inside the
    /// window are formatted.
    pub fn render_window(&self, available_width: usize, start: usize, len: usize) -> Vec<Line<'static>> {
        let end = start.saturating_add(len).min(self.line_count());
        if start >= end {
            return Vec::new();
        }

        if self.table.header.is_empty() {
            return vec![Line::from(Span::styled(
                "(empty result)",
                Style::default().fg(Color::DarkGray),
            ))];
        }

        let widths = self.calculate_column_widths();

        // Borders and padding: " x │" per column plus the left border.
        let total_width: usize = widths.iter().sum::<usize>() + widths.len() * 3 + 1;
        let scale_factor = if total_width > available_width && available_width > 0 {
            available_width as f64 / total_width as f64
        } else {
            1.0
        };

        let adjusted_widths: Vec<usize> = widths
            .iter()
            .map(|&w| ((w as f64 * scale_factor) as usize).max(MIN_COLUMN_WIDTH))
            .collect();

        let rows = self.table.body.len();
        (start..end)
            .map(|index| match index {
                0 => Self::render_border(&adjusted_widths, '┌', '┬', '┐'),
                1 => self.render_header_row(&adjusted_widths),
                2 => Self::render_border(&adjusted_widths, '├', '┼', '┤'),
                i if i < rows + 3 => Self::render_data_row(&self.table.body[i - 3], &adjusted_widths),
                i if i == rows + 3 => Self::render_border(&adjusted_widths, '└', '┴', '┘'),
                _ => Line::from(Span::styled(
                    self.footer(),
                    Style::default().fg(Color::DarkGray),
                )),
            })
            .collect()
    }

    fn render_border(widths: &[usize], left: char, mid: char, right: char) -> Line<'static> {
        let mut border = String::new();
        border.push(left);

        for (i, &width) in widths.iter().enumerate() {
            border.push_str(&"─".repeat(width + 2));
            if i < widths.len() - 1 {
                border.push(mid);
            }
        }

        border.push(right);

        Line::from(Span::styled(border, Style::default().fg(Color::DarkGray)))
    }

    fn render_header_row(&self, widths: &[usize]) -> Line<'static> {
        let mut spans = vec![Span::styled("│", Style::default().fg(Color::DarkGray))];

        for (name, &width) in self.table.header.iter().zip(widths) {
            let padded = format!(" {:width$} ", Self::truncate(name, width), width = width);
            spans.push(Span::styled(
                padded,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
        }

        Line::from(spans)
    }

    fn render_data_row(row: &[Cell], widths: &[usize]) -> Line<'static> {
        let mut spans = vec![Span::styled("│", Style::default().fg(Color::DarkGray))];

        for (i, &width) in widths.iter().enumerate() {
            let (text, null) = row
                .get(i)
                .map(|cell| (cell.text.as_str(), cell.null))
                .unwrap_or(("", false));
            let padded = format!(" {:width$} ", Self::truncate(text, width), width = width);

            let style = if null {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC)
            } else {
                Style::default()
            };

            spans.push(Span::styled(padded, style));
            spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
        }

        Line::from(spans)
    }
}

impl Widget for ResultTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = self.render_to_lines(area.width as usize);

        for (i, line) in lines.iter().take(area.height as usize).enumerate() {
            buf.set_line(area.x, area.y + i as u16, line, area.width);
        }
    }
}

/// Renders a table as plain text, one line per table line.
pub fn render_plain(table: &RenderedTable, available_width: usize) -> String {
    ResultTable::new(table)
        .render_to_lines(available_width)
        .iter()
        .map(|line| {
            line.spans
                .iter()
                .map(|span| span.content.as_ref())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The output area: placeholder text or the rendered tables.
pub struct ResultsPanel<'a> {
    output: &'a Output,
    scroll: usize,
    focused: bool,
}

impl<'a> ResultsPanel<'a> {
    pub fn new(output: &'a Output, scroll: usize, focused: bool) -> Self {
        Self {
            output,
            scroll,
            focused,
        }
    }

    /// Lines of the output area for the given width.
    pub fn lines(&self, available_width: usize) -> Vec<Line<'static>> {
        self.window(available_width, 0, usize::MAX)
    }

    /// Total line count of the output area.
    pub fn line_count(&self) -> usize {
        match self.output {
            Output::Tables(tables) if !tables.is_empty() => {
                let body: usize = tables.iter().map(|t| ResultTable::new(t).line_count()).sum();
                body + tables.len() - 1
            }
            _ => 1,
        }
    }

    /// The lines `start..start + len` of the output area.
    pub fn window(&self, available_width: usize, start: usize, len: usize) -> Vec<Line<'static>> {
        let dim = Style::default().fg(Color::DarkGray);
        match self.output {
            Output::Empty => vec![Line::from(Span::styled(
                "Press Ctrl-Enter or F5 to execute the query.",
                dim,
            ))],
            Output::Fetching => vec![Line::from(FETCHING_PLACEHOLDER)],
            Output::AwaitingConfirmation {
                row_count,
                threshold,
            } => vec![Line::from(Span::styled(
                format!("{row_count} rows returned, more than the {threshold} row limit."),
                dim,
            ))],
            Output::Tables(tables) if tables.is_empty() => {
                vec![Line::from(Span::styled("No rows returned.", dim))]
            }
            Output::Tables(tables) => {
                let end = start.saturating_add(len);
                let mut lines = Vec::new();
                // First line of the current table within the whole area.
                let mut top = 0;
                for (i, table) in tables.iter().enumerate() {
                    if i > 0 {
                        if (start..end).contains(&top) {
                            lines.push(Line::from(""));
                        }
                        top += 1;
                    }
                    let table = ResultTable::new(table);
                    let count = table.line_count();
                    if top + count > start && top < end {
                        let from = start.saturating_sub(top);
                        let to = (end - top).min(count);
                        lines.extend(table.render_window(available_width, from, to - from));
                    }
                    top += count;
                    if top >= end {
                        break;
                    }
                }
                lines
            }
        }
    }
}

impl Widget for ResultsPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Results ");

        let inner = block.inner(area);
        let height = inner.height as usize;
        let max_scroll = self.line_count().saturating_sub(height);
        let offset = self.scroll.min(max_scroll);
        let visible = self.window(inner.width as usize, offset, height);

        Paragraph::new(visible).block(block).render(area, buf);
    }
}

//! Screen drawing for the library, book and topic screens

use std::time::Instant;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::state::{ReaderState, TopicView, Viewport};
use crate::error::Result;
use crate::highlight::{Color, Highlighter, Style};
use crate::navigation::Route;
use crate::render::{RenderOptions, StyledLine, TopicRenderer};
use crate::terminal::Terminal;

/// Rows taken by the mode line and the message line
const CHROME_ROWS: usize = 2;

/// Layout settings taken from the config
#[derive(Debug, Clone)]
pub struct ViewOptions {
    pub line_numbers: bool,
    pub tab_width: usize,
    /// Maximum text width, 0 for the full terminal
    pub wrap_width: usize,
}

/// Display state
pub struct Display {
    highlighter: Highlighter,
    options: ViewOptions,
    /// Whether a full clear is needed before the next frame
    needs_redraw: bool,
    /// First visible row of the library and book lists
    list_top: usize,
}

impl Display {
    pub fn new(highlighter: Highlighter, options: ViewOptions) -> Self {
        Self {
            highlighter,
            options,
            needs_redraw: true,
            list_top: 0,
        }
    }

    /// Mark that the screen must be cleared (resize, route change)
    pub fn force_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// New screen: clear and start lists from the top
    pub fn route_changed(&mut self) {
        self.needs_redraw = true;
        self.list_top = 0;
    }

    fn text_width(&self, cols: usize) -> usize {
        match self.options.wrap_width {
            0 => cols,
            w => w.min(cols),
        }
    }

    /// Draw a frame and return its geometry
    pub fn render(
        &mut self,
        terminal: &mut Terminal,
        state: &ReaderState,
        previous: &Viewport,
        now: Instant,
    ) -> Result<Viewport> {
        let cols = terminal.cols() as usize;
        let rows = terminal.rows() as usize;
        let height = rows.saturating_sub(CHROME_ROWS);

        if self.needs_redraw {
            terminal.clear_screen()?;
        }

        let (lines, viewport) = match state.route() {
            Route::Topic { .. } => self.topic_lines(state, previous, cols, height, now),
            Route::Library => {
                let (lines, cursor_line) = self.library_lines(state, cols);
                (self.scroll_list(lines, cursor_line, height), Viewport::default())
            }
            Route::Book { .. } => {
                let (lines, cursor_line) = self.book_lines(state, cols);
                (self.scroll_list(lines, cursor_line, height), Viewport::default())
            }
        };

        for row in 0..height {
            terminal.move_cursor(row as u16, 0)?;
            if let Some(line) = lines.get(row) {
                draw_line(terminal, line, cols)?;
            }
            terminal.clear_to_eol()?;
        }

        self.render_mode_line(terminal, state, &viewport, height, cols)?;
        self.render_minibuffer(terminal, state, rows.saturating_sub(1), cols)?;
        terminal.flush()?;

        self.needs_redraw = false;
        Ok(Viewport { height, ..viewport })
    }

    /// Keep the list cursor on screen and cut the visible window
    fn scroll_list(
        &mut self,
        lines: Vec<StyledLine>,
        cursor_line: Option<usize>,
        height: usize,
    ) -> Vec<StyledLine> {
        if let Some(cursor) = cursor_line {
            if cursor < self.list_top {
                self.list_top = cursor;
            } else if height > 0 && cursor >= self.list_top + height {
                self.list_top = cursor + 1 - height;
            }
        }
        self.list_top = self.list_top.min(lines.len().saturating_sub(1));
        lines.into_iter().skip(self.list_top).collect()
    }

    fn topic_lines(
        &self,
        state: &ReaderState,
        previous: &Viewport,
        cols: usize,
        height: usize,
        now: Instant,
    ) -> (Vec<StyledLine>, Viewport) {
        match state.topic() {
            TopicView::Loading => (vec![StyledLine::styled("Загрузка…", dim())], Viewport::default()),
            TopicView::Failed(message) => (
                vec![StyledLine::styled(
                    message.clone(),
                    Style::fg(Color::BrightRed).with_bold(),
                )],
                Viewport::default(),
            ),
            TopicView::Loaded(topic) => {
                let options = RenderOptions {
                    width: self.text_width(cols),
                    line_numbers: self.options.line_numbers,
                    tab_width: self.options.tab_width,
                    copied: state.copied(now),
                    selected: state.selected_block(previous),
                };
                let rendered = TopicRenderer::new(&self.highlighter, options).render(topic);
                let viewport = Viewport {
                    height,
                    total_lines: rendered.lines.len(),
                    code_blocks: rendered.code_blocks,
                };
                let visible = rendered
                    .lines
                    .into_iter()
                    .skip(state.scroll())
                    .take(height)
                    .collect();
                (visible, viewport)
            }
        }
    }

    /// Library lines and the line holding the cursor
    fn library_lines(&self, state: &ReaderState, cols: usize) -> (Vec<StyledLine>, Option<usize>) {
        let mut lines = Vec::new();
        let mut cursor_line = None;
        let mut position = 0;

        lines.push(StyledLine::styled("Учебники", Style::fg(Color::BrightWhite).with_bold()));
        for category in state.categories() {
            lines.push(StyledLine::default());
            lines.push(StyledLine::styled(
                category.name.clone(),
                Style::fg(Color::BrightCyan).with_bold(),
            ));
            if !category.description.is_empty() {
                lines.push(StyledLine::styled(
                    truncate_to_width(&category.description, cols),
                    dim(),
                ));
            }

            for book in state.books_in(&category.id) {
                let selected = position == state.cursor();
                if selected {
                    cursor_line = Some(lines.len());
                }
                let mut line = StyledLine::default();
                let label = format!("[{}]", state.progress_label(&book.id));
                line.push(if selected { "> " } else { "  " }, Style::default());
                line.push(&label, Style::fg(Color::BrightGreen));
                line.push(" ", Style::default());
                let title_style = if selected {
                    Style::default().with_reverse()
                } else {
                    Style::default().with_bold()
                };
                line.push(&book.title, title_style);
                if !book.description.is_empty() {
                    line.push(&format!("  {}", book.description), dim());
                }
                lines.push(line);
                position += 1;
            }
        }

        if state.categories().is_empty() {
            lines.push(StyledLine::default());
            lines.push(StyledLine::styled("Загрузка…", dim()));
        }
        (lines, cursor_line)
    }

    /// Book page lines and the line holding the cursor
    fn book_lines(&self, state: &ReaderState, cols: usize) -> (Vec<StyledLine>, Option<usize>) {
        let Some(book) = state.textbook().filter(|b| Some(b.id.as_str()) == state.route().textbook_id())
        else {
            return (vec![StyledLine::styled("Загрузка…", dim())], None);
        };

        let mut lines = vec![StyledLine::styled(
            book.title.clone(),
            Style::fg(Color::BrightWhite).with_bold(),
        )];
        if !book.description.is_empty() {
            lines.push(StyledLine::styled(truncate_to_width(&book.description, cols), dim()));
        }

        let rating = state.rating().unwrap_or(0);
        let mut stars = StyledLine::default();
        for star in 1..=5u8 {
            let style = if star <= rating {
                Style::fg(Color::BrightYellow)
            } else {
                dim()
            };
            stars.push("★", style);
        }
        stars.push("  1-5: оценить", dim());
        lines.push(stars);
        lines.push(StyledLine::default());

        let mut cursor_line = None;
        for (i, topic) in book.topics.iter().enumerate() {
            let selected = i == state.cursor();
            if selected {
                cursor_line = Some(lines.len());
            }
            let mut line = StyledLine::default();
            line.push(if selected { "> " } else { "  " }, Style::default());
            line.push(&format!("{:>2}. ", i + 1), dim());
            let style = if selected {
                Style::default().with_reverse()
            } else {
                Style::default()
            };
            line.push(&topic.title, style);
            lines.push(line);
        }
        (lines, cursor_line)
    }

    fn render_mode_line(
        &self,
        terminal: &mut Terminal,
        state: &ReaderState,
        viewport: &Viewport,
        row: usize,
        cols: usize,
    ) -> Result<()> {
        terminal.move_cursor(row as u16, 0)?;

        let position = match state.route() {
            Route::Topic { index, .. } => {
                let total = state
                    .textbook()
                    .map(|b| b.topics.len().to_string())
                    .unwrap_or_else(|| "?".to_string());
                format!(
                    "Тема {}/{} {}",
                    index + 1,
                    total,
                    percent(state.scroll(), viewport)
                )
            }
            _ => String::new(),
        };

        let mode_line = format!("-- tbread: {} {} ", state.route(), position);
        let padded = if mode_line.width() < cols {
            format!("{}{}", mode_line, "-".repeat(cols - mode_line.width()))
        } else {
            truncate_to_width(&mode_line, cols)
        };

        terminal.write_styled(&padded, Style::default().with_reverse())?;
        Ok(())
    }

    fn render_minibuffer(
        &self,
        terminal: &mut Terminal,
        state: &ReaderState,
        row: usize,
        cols: usize,
    ) -> Result<()> {
        terminal.move_cursor(row as u16, 0)?;

        match state.status() {
            Some(message) => terminal.write_str(&truncate_to_width(message, cols))?,
            None => {
                let hint = match state.route() {
                    Route::Library => "Enter: открыть  r: обновить  q: выход",
                    Route::Book { .. } => "Enter: открыть тему  1-5: оценка  b: назад  q: выход",
                    Route::Topic { .. } => {
                        "n/p: тема  Tab: блок кода  c: копировать  b: к учебнику  q: выход"
                    }
                };
                terminal.write_styled(&truncate_to_width(hint, cols), dim())?;
            }
        }

        terminal.clear_to_eol()?;
        Ok(())
    }
}

fn dim() -> Style {
    Style::fg(Color::BrightBlack)
}

/// Top/Bot/All or a percentage, as a pager shows it
fn percent(scroll: usize, viewport: &Viewport) -> String {
    let max = viewport.total_lines.saturating_sub(viewport.height);
    if max == 0 {
        "All".to_string()
    } else if scroll == 0 {
        "Top".to_string()
    } else if scroll >= max {
        "Bot".to_string()
    } else {
        format!("{}%", scroll * 100 / max)
    }
}

/// Write a styled line, clipped to `max_cols`
fn draw_line(terminal: &mut Terminal, line: &StyledLine, max_cols: usize) -> Result<()> {
    let mut used = 0;
    let mut pos = 0;
    let mut pieces: Vec<(&str, Style)> = Vec::new();
    for span in &line.spans {
        if span.start > pos {
            pieces.push((&line.text[pos..span.start], Style::default()));
        }
        pieces.push((&line.text[span.start.max(pos)..span.end], span.style));
        pos = span.end;
    }
    if pos < line.text.len() {
        pieces.push((&line.text[pos..], Style::default()));
    }

    for (text, style) in pieces {
        let remaining = max_cols.saturating_sub(used);
        if remaining == 0 {
            break;
        }
        let clipped = truncate_to_width(text, remaining);
        used += clipped.width();
        terminal.write_styled(&clipped, style)?;
    }
    Ok(())
}

/// Truncate a string to fit within a display width
///
/// Control characters never reach the terminal: tabs become a space and
/// the rest are dropped.
fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut result = String::new();
    let mut width = 0;

    for ch in s.chars() {
        let ch = match ch {
            '\t' => ' ',
            c if c.is_control() => continue,
            c => c,
        };
        let ch_width = ch.width().unwrap_or(1);
        if width + ch_width > max_width {
            break;
        }
        result.push(ch);
        width += ch_width;
    }

    result
}

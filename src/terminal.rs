//! Terminal abstraction using crossterm

use std::io::{self, Write};
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, Event},
    execute, queue,
    style::{Print, PrintStyledContent},
    terminal::{self, ClearType},
};

use crate::error::Result;
use crate::highlight::Style;
use crate::input::Key;

/// What woke the event loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermEvent {
    Key(Key),
    Resize,
}

/// Raw-mode, alternate-screen terminal; restored on drop
pub struct Terminal {
    cols: u16,
    rows: u16,
}

impl Terminal {
    /// Enter raw mode and the alternate screen
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode()?;
        let (cols, rows) = terminal::size()?;

        execute!(io::stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        Ok(Self { cols, rows })
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn clear_screen(&mut self) -> Result<()> {
        queue!(io::stdout(), terminal::Clear(ClearType::All))?;
        Ok(())
    }

    pub fn clear_to_eol(&mut self) -> Result<()> {
        queue!(io::stdout(), terminal::Clear(ClearType::UntilNewLine))?;
        Ok(())
    }

    /// Move cursor to position (0-indexed)
    pub fn move_cursor(&mut self, row: u16, col: u16) -> Result<()> {
        queue!(io::stdout(), cursor::MoveTo(col, row))?;
        Ok(())
    }

    pub fn write_str(&mut self, s: &str) -> Result<()> {
        queue!(io::stdout(), Print(s))?;
        Ok(())
    }

    /// Write text in a style, resetting afterwards
    pub fn write_styled(&mut self, s: &str, style: Style) -> Result<()> {
        if style.is_default() {
            return self.write_str(s);
        }
        queue!(io::stdout(), PrintStyledContent(style.to_crossterm().apply(s)))?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        io::stdout().flush()?;
        Ok(())
    }

    /// Wait up to `timeout` for a key or resize
    ///
    /// Returns `None` on timeout or for events the reader ignores.
    pub fn next_event(&mut self, timeout: Duration) -> Result<Option<TermEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        Ok(match event::read()? {
            Event::Key(key_event) => Key::from_event(key_event).map(TermEvent::Key),
            Event::Resize(cols, rows) => {
                self.cols = cols;
                self.rows = rows;
                Some(TermEvent::Resize)
            }
            _ => None,
        })
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

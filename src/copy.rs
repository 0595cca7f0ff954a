//! Copy-to-clipboard for code blocks and the transient "copied" indicator

use std::time::{Duration, Instant};

use crate::error::{ReaderError, Result};

/// Default time the "copied" indicator stays on
pub const DEFAULT_FEEDBACK: Duration = Duration::from_millis(2000);

/// Which code block was copied most recently, until its timer runs out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyState {
    #[default]
    Idle,
    Active { index: usize, expires_at: Instant },
}

/// Copy-feedback state machine
///
/// A new copy replaces the previous activation outright, so an older
/// timer can never clear a newer index.
#[derive(Debug, Clone)]
pub struct CopyFeedback {
    state: CopyState,
    duration: Duration,
}

impl CopyFeedback {
    pub fn new(duration: Duration) -> Self {
        Self {
            state: CopyState::Idle,
            duration,
        }
    }

    /// Mark block `index` as just copied
    pub fn trigger(&mut self, index: usize, now: Instant) {
        self.state = CopyState::Active {
            index,
            expires_at: now + self.duration,
        };
    }

    /// Return to idle if the current activation has run out
    ///
    /// Returns true when the state changed.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.state {
            CopyState::Active { expires_at, .. } if now >= expires_at => {
                self.state = CopyState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Index showing the "copied" indicator at `now`
    pub fn active(&self, now: Instant) -> Option<usize> {
        match self.state {
            CopyState::Active { index, expires_at } if now < expires_at => Some(index),
            _ => None,
        }
    }

    /// Time left until the current activation expires
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        match self.state {
            CopyState::Active { expires_at, .. } => Some(expires_at.saturating_duration_since(now)),
            CopyState::Idle => None,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Default for CopyFeedback {
    fn default() -> Self {
        Self::new(DEFAULT_FEEDBACK)
    }
}

/// Destination for copied code
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// The system clipboard via `arboard`
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        arboard::Clipboard::new()
            .map(|inner| Self { inner })
            .map_err(|e| ReaderError::Clipboard(e.to_string()))
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        self.inner
            .set_text(text.to_string())
            .map_err(|e| ReaderError::Clipboard(e.to_string()))
    }
}

/// Stand-in used when no system clipboard is reachable (e.g. over SSH)
#[derive(Debug, Default)]
pub struct DetachedClipboard {
    pub last: Option<String>,
}

impl Clipboard for DetachedClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        self.last = Some(text.to_string());
        Ok(())
    }
}

/// Open the system clipboard, falling back to a detached one
pub fn open_clipboard() -> Box<dyn Clipboard> {
    match SystemClipboard::new() {
        Ok(clipboard) => Box::new(clipboard),
        Err(e) => {
            tracing::warn!(error = %e, "system clipboard unavailable");
            Box::new(DetachedClipboard::default())
        }
    }
}

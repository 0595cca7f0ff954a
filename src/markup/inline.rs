//! Inline highlighter for picked terms and line breaks

use std::sync::OnceLock;

use regex::Regex;

/// A run of text within a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Plain(String),
    /// Backtick-delimited term, backticks removed
    Picked(String),
    LineBreak,
}

impl Inline {
    /// Whether this run occupies no display width
    pub fn is_empty(&self) -> bool {
        matches!(self, Inline::Plain(text) if text.is_empty())
    }
}

/// A backtick pair on one line (non-greedy) or a single newline
///
/// A picked term also stops at `\r` and the Unicode line and paragraph
/// separators.
fn inline_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new("`[^\n\r\u{2028}\u{2029}]*?`|\n").expect("inline pattern is a valid regex")
    })
}

/// Split text into runs, keeping delimiters as `Picked`/`LineBreak`
///
/// Plain fragments are emitted even when empty, so the output always
/// alternates plain text with delimiter runs.
pub fn highlight_inline(text: &str) -> Vec<Inline> {
    let mut runs = Vec::new();
    let mut last = 0;

    for m in inline_pattern().find_iter(text) {
        runs.push(Inline::Plain(text[last..m.start()].to_string()));
        let raw = m.as_str();
        if raw == "\n" {
            runs.push(Inline::LineBreak);
        } else {
            runs.push(Inline::Picked(raw[1..raw.len() - 1].to_string()));
        }
        last = m.end();
    }

    runs.push(Inline::Plain(text[last..].to_string()));
    runs
}

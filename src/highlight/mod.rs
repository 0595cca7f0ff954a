//! Code highlighting
//!
//! Regex rule-based highlighter for code panels. Multiline constructs
//! (block comments, template strings) carry their state across the lines
//! of one code block.

mod language;
mod languages;
mod rules;
mod style;
mod tokens;

use language::LanguageDefinition;
use rules::LineState;
pub use style::{Color, Span, Style};

/// Highlighter over the built-in languages
pub struct Highlighter {
    languages: Vec<LanguageDefinition>,
    /// Index into `languages` used for code blocks
    current: Option<usize>,
}

impl Highlighter {
    /// Create a highlighter using the named language (name or alias)
    ///
    /// An unknown name disables highlighting rather than failing.
    pub fn new(language: &str) -> Self {
        let mut highlighter = Self {
            languages: languages::all_languages(),
            current: None,
        };
        highlighter.set_language(language);
        highlighter
    }

    /// Select a language by name or alias, returns false if unknown
    pub fn set_language(&mut self, name: &str) -> bool {
        let wanted = name.to_lowercase();
        self.current = self.languages.iter().position(|lang| {
            lang.name.to_lowercase() == wanted || lang.aliases.iter().any(|a| *a == wanted)
        });
        if self.current.is_none() {
            tracing::warn!(
                language = name,
                available = ?self.language_names(),
                "unknown code language, highlighting disabled"
            );
        }
        self.current.is_some()
    }

    /// Name of the active language
    pub fn language(&self) -> Option<&str> {
        self.current.map(|i| self.languages[i].name.as_str())
    }

    /// List available languages
    pub fn language_names(&self) -> Vec<&str> {
        self.languages.iter().map(|l| l.name.as_str()).collect()
    }

    /// Highlight a code block, one span list per `\n`-separated line
    pub fn highlight(&self, code: &str) -> Vec<Vec<Span>> {
        let Some(lang) = self.current.map(|i| &self.languages[i]) else {
            return code.split('\n').map(|_| Vec::new()).collect();
        };

        let mut state = LineState::Normal;
        code.split('\n')
            .map(|line| {
                let (spans, next) = lang.highlight_line(line, state);
                state = next;
                spans
            })
            .collect()
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new("JavaScript")
    }
}

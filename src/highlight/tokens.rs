//! Token types for code highlighting

use super::style::{Color, Style};

/// Semantic token types recognized in code blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Comment,
    String,
    Number,
    Keyword,
    /// Built-in types and global objects
    Type,
    Function,
    Operator,
    /// Literal constants (true, null, None)
    Constant,
    /// self/this and similar
    Special,
    /// Decorators
    Attribute,
    Default,
}

impl TokenType {
    /// Default style for this token type, tuned for a dark code panel
    pub fn default_style(&self) -> Style {
        match self {
            TokenType::Comment => Style::fg(Color::BrightBlack).with_italic(),
            TokenType::String => Style::fg(Color::Green),
            TokenType::Number => Style::fg(Color::BrightYellow),
            TokenType::Keyword => Style::fg(Color::Magenta).with_bold(),
            TokenType::Type => Style::fg(Color::Yellow),
            TokenType::Function => Style::fg(Color::Blue),
            TokenType::Operator => Style::fg(Color::Cyan),
            TokenType::Constant => Style::fg(Color::BrightRed),
            TokenType::Special => Style::fg(Color::BrightMagenta).with_italic(),
            TokenType::Attribute => Style::fg(Color::BrightBlue),
            TokenType::Default => Style::default(),
        }
    }
}

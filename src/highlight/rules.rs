//! Pattern rules for code highlighting

use regex::Regex;

use super::tokens::TokenType;

/// A single-line pattern rule; higher priority wins ties at one position
pub struct PatternRule {
    pub name: &'static str,
    pub pattern: Regex,
    pub token_type: TokenType,
    pub priority: i32,
}

impl PatternRule {
    /// Create a new pattern rule, `None` if the regex does not compile
    pub fn new(name: &'static str, pattern: &str, token_type: TokenType, priority: i32) -> Option<Self> {
        Regex::new(pattern).ok().map(|pattern| Self {
            name,
            pattern,
            token_type,
            priority,
        })
    }

    /// First match at or after `start`, as byte offsets into `text`
    ///
    /// Searching the whole line (not a suffix) keeps `\b` correct at `start`.
    pub fn find_at(&self, text: &str, start: usize) -> Option<(usize, usize)> {
        if start >= text.len() {
            return None;
        }
        self.pattern
            .find_at(text, start)
            .map(|m| (m.start(), m.end()))
    }
}

/// A construct that may span lines (block comments, template strings)
pub struct MultilineRule {
    pub name: &'static str,
    pub start: Regex,
    pub end: Regex,
    pub token_type: TokenType,
    /// Character that escapes the end delimiter
    pub escape_char: Option<char>,
    /// Identifies this rule in `LineState::Inside`
    pub state_id: u8,
}

impl MultilineRule {
    pub fn new(
        name: &'static str,
        start_pattern: &str,
        end_pattern: &str,
        token_type: TokenType,
        state_id: u8,
        escape_char: Option<char>,
    ) -> Option<Self> {
        Some(Self {
            name,
            start: Regex::new(start_pattern).ok()?,
            end: Regex::new(end_pattern).ok()?,
            token_type,
            escape_char,
            state_id,
        })
    }

    /// Find start of this construct at or after `start`
    pub fn find_start(&self, text: &str, start: usize) -> Option<(usize, usize)> {
        if start >= text.len() {
            return None;
        }
        self.start.find_at(text, start).map(|m| (m.start(), m.end()))
    }

    /// Find the byte offset just past the closing delimiter, skipping escaped ones
    pub fn find_end(&self, text: &str, start: usize) -> Option<usize> {
        let mut from = start;
        while from <= text.len() {
            let m = self.end.find_at(text, from)?;
            if !self.is_escaped(&text[..m.start()]) {
                return Some(m.end());
            }
            from = m.end().max(m.start() + 1);
        }
        None
    }

    /// An odd run of escape characters right before the delimiter escapes it
    fn is_escaped(&self, preceding: &str) -> bool {
        match self.escape_char {
            Some(escape) => preceding.chars().rev().take_while(|&c| c == escape).count() % 2 == 1,
            None => false,
        }
    }
}

/// Highlighting state carried from one line to the next
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineState {
    #[default]
    Normal,
    /// Inside the multiline rule with this state id
    Inside(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_rule() {
        let rule = PatternRule::new("number", r"\d+", TokenType::Number, 50).unwrap();
        assert_eq!(rule.find_at("abc 123 def", 0), Some((4, 7)));
        assert_eq!(rule.find_at("abc 123 def", 5), Some((5, 7)));
        assert_eq!(rule.find_at("no numbers", 0), None);
    }

    #[test]
    fn test_word_boundary_uses_line_context() {
        let rule = PatternRule::new("kw", r"\blet\b", TokenType::Keyword, 80).unwrap();
        // "outlet" must not match at offset 3
        assert_eq!(rule.find_at("outlet", 3), None);
    }

    #[test]
    fn test_multiline_rule() {
        let rule = MultilineRule::new("block_comment", r"/\*", r"\*/", TokenType::Comment, 1, None)
            .unwrap();
        assert_eq!(rule.find_start("/* comment */", 0), Some((0, 2)));
        assert_eq!(rule.find_end("/* comment */", 2), Some(13));
        assert_eq!(rule.find_end("/* open", 2), None);
    }

    #[test]
    fn test_multiline_with_escape() {
        let rule = MultilineRule::new("template", "`", "`", TokenType::String, 2, Some('\\')).unwrap();
        assert_eq!(rule.find_end(r"hello`", 0), Some(6));
        assert_eq!(rule.find_end(r"hello\`world`", 0), Some(13));
        assert_eq!(rule.find_end(r"a\\`", 0), Some(4));
    }
}

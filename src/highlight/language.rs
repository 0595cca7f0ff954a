//! Language definitions for code highlighting
//!
//! A language is a set of single-line pattern rules plus multiline rules.
//! Each line is scanned left to right; at every step the earliest match
//! wins, with multiline starts beating patterns and higher priority
//! beating lower priority when two candidates start at the same offset.

use super::rules::{LineState, MultilineRule, PatternRule};
use super::style::Span;
use super::tokens::TokenType;

/// A complete language definition
pub struct LanguageDefinition {
    /// Language name (e.g., "JavaScript")
    pub name: String,
    /// Alternate names accepted in config (e.g., "js")
    pub aliases: Vec<String>,
    /// Sorted by priority, highest first
    patterns: Vec<PatternRule>,
    multiline_rules: Vec<MultilineRule>,
}

/// Candidate token found while scanning a line
enum Candidate<'a> {
    Multiline(usize, usize, &'a MultilineRule),
    Pattern(usize, usize, &'a PatternRule),
}

impl Candidate<'_> {
    fn start(&self) -> usize {
        match self {
            Candidate::Multiline(start, ..) | Candidate::Pattern(start, ..) => *start,
        }
    }
}

impl LanguageDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            patterns: Vec::new(),
            multiline_rules: Vec::new(),
        }
    }

    pub fn add_alias(&mut self, alias: &str) {
        self.aliases.push(alias.to_string());
    }

    pub fn add_pattern(&mut self, rule: PatternRule) {
        self.patterns.push(rule);
        self.patterns.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    pub fn add_multiline(&mut self, rule: MultilineRule) {
        self.multiline_rules.push(rule);
    }

    fn multiline_rule(&self, state_id: u8) -> Option<&MultilineRule> {
        self.multiline_rules.iter().find(|r| r.state_id == state_id)
    }

    /// Earliest candidate at or after `pos`
    fn next_candidate(&self, text: &str, pos: usize) -> Option<Candidate<'_>> {
        let mut best: Option<Candidate<'_>> = None;

        for rule in &self.multiline_rules {
            if let Some((start, end)) = rule.find_start(text, pos) {
                if best.as_ref().map_or(true, |b| start < b.start()) {
                    best = Some(Candidate::Multiline(start, end, rule));
                }
            }
        }

        for rule in &self.patterns {
            if let Some((start, end)) = rule.find_at(text, pos) {
                if best.as_ref().map_or(true, |b| start < b.start()) {
                    best = Some(Candidate::Pattern(start, end, rule));
                }
            }
        }

        best
    }

    /// Highlight one line given the state left by the previous line
    ///
    /// Returns the styled spans and the state for the next line.
    pub fn highlight_line(&self, text: &str, state: LineState) -> (Vec<Span>, LineState) {
        let mut spans = Vec::new();
        let mut pos = 0;

        if let LineState::Inside(id) = state {
            if let Some(rule) = self.multiline_rule(id) {
                let style = rule.token_type.default_style();
                match rule.find_end(text, 0) {
                    Some(end) => {
                        spans.push(Span::new(0, end, style));
                        pos = end;
                    }
                    None => {
                        if !text.is_empty() {
                            spans.push(Span::new(0, text.len(), style));
                        }
                        return (spans, state);
                    }
                }
            }
        }

        while pos < text.len() {
            let Some(candidate) = self.next_candidate(text, pos) else {
                break;
            };

            match candidate {
                Candidate::Multiline(start, open_end, rule) => {
                    let style = rule.token_type.default_style();
                    match rule.find_end(text, open_end) {
                        Some(end) => {
                            spans.push(Span::new(start, end, style));
                            pos = end;
                        }
                        None => {
                            spans.push(Span::new(start, text.len(), style));
                            return (spans, LineState::Inside(rule.state_id));
                        }
                    }
                }
                Candidate::Pattern(start, end, rule) => {
                    if end > start {
                        if rule.token_type != TokenType::Default {
                            spans.push(Span::new(start, end, rule.token_type.default_style()));
                        }
                        pos = end;
                    } else {
                        // Zero-width match; step over one character
                        pos = start + text[start..].chars().next().map_or(1, char::len_utf8);
                    }
                }
            }
        }

        (spans, LineState::Normal)
    }
}

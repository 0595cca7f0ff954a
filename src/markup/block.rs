//! Block tokenizer
//!
//! Splits topic content on the tag pairs `{code}…{/code}`, `{info}…{/info}`,
//! `{warn}…{/warn}` and `{subtitle}…{/subtitle}`. Text outside any tag pair
//! becomes a paragraph. An opening tag with no closing tag is not a match and
//! stays in the surrounding paragraph as literal text.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

/// A contiguous segment of topic content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Code(String),
    Info(String),
    Warn(String),
    Subtitle(String),
    Paragraph(String),
}

/// Severity of an info/warn callout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callout {
    Note,
    Warning,
}

impl Callout {
    /// Label shown in the callout header
    pub fn label(&self) -> &'static str {
        match self {
            Callout::Note => "На заметку",
            Callout::Warning => "Предупреждение",
        }
    }
}

impl Block {
    /// Callout severity for info/warn blocks
    pub fn callout(&self) -> Option<Callout> {
        match self {
            Block::Info(_) => Some(Callout::Note),
            Block::Warn(_) => Some(Callout::Warning),
            _ => None,
        }
    }
}

/// A block together with the byte range of its raw text in the content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub block: Block,
    /// Raw range in the source, tags included
    pub span: Range<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Code,
    Info,
    Warn,
    Subtitle,
}

impl Tag {
    const ALL: [Tag; 4] = [Tag::Code, Tag::Info, Tag::Warn, Tag::Subtitle];

    fn name(self) -> &'static str {
        match self {
            Tag::Code => "code",
            Tag::Info => "info",
            Tag::Warn => "warn",
            Tag::Subtitle => "subtitle",
        }
    }

    fn open(self) -> String {
        format!("{{{}}}", self.name())
    }

    fn close(self) -> String {
        format!("{{/{}}}", self.name())
    }

    fn wrap(self, text: String) -> Block {
        match self {
            Tag::Code => Block::Code(text),
            Tag::Info => Block::Info(text),
            Tag::Warn => Block::Warn(text),
            Tag::Subtitle => Block::Subtitle(text),
        }
    }

    /// Identify which tag pair a raw match is wrapped in
    fn of_match(raw: &str) -> Option<Tag> {
        Tag::ALL
            .into_iter()
            .find(|tag| raw.starts_with(&tag.open()) && raw.ends_with(&tag.close()))
    }
}

/// Alternation over all tag pairs, non-greedy and dot-matches-newline
fn block_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let alternatives: Vec<String> = Tag::ALL
            .iter()
            .map(|tag| {
                format!(
                    "{}.*?{}",
                    regex::escape(&tag.open()),
                    regex::escape(&tag.close())
                )
            })
            .collect();
        Regex::new(&format!("(?s){}", alternatives.join("|")))
            .expect("block tag pattern is a valid regex")
    })
}

/// Split content into ordered segments covering the whole input
///
/// Zero-length paragraphs (between adjacent tags, or at either end) are
/// not emitted.
pub fn tokenize(content: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for m in block_pattern().find_iter(content) {
        push_paragraph(&mut segments, content, last..m.start());

        let raw = m.as_str();
        if let Some(tag) = Tag::of_match(raw) {
            let inner = &raw[tag.open().len()..raw.len() - tag.close().len()];
            segments.push(Segment {
                block: tag.wrap(inner.trim().to_string()),
                span: m.range(),
            });
        } else {
            push_paragraph(&mut segments, content, m.range());
        }
        last = m.end();
    }

    push_paragraph(&mut segments, content, last..content.len());
    segments
}

fn push_paragraph(segments: &mut Vec<Segment>, content: &str, span: Range<usize>) {
    if span.is_empty() {
        return;
    }
    segments.push(Segment {
        block: Block::Paragraph(content[span.clone()].to_string()),
        span,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn blocks(content: &str) -> Vec<Block> {
        tokenize(content).into_iter().map(|s| s.block).collect()
    }

    #[test]
    fn test_code_tag_stripped() {
        assert_eq!(blocks("{code}x=1{/code}"), vec![Block::Code("x=1".into())]);
    }

    #[test]
    fn test_info_outer_whitespace_trimmed() {
        assert_eq!(
            blocks("{info}  hello  {/info}"),
            vec![Block::Info("hello".into())]
        );
    }

    #[test]
    fn test_subtitle_tag_lengths() {
        assert_eq!(
            blocks("{subtitle}\nLoops\n{/subtitle}"),
            vec![Block::Subtitle("Loops".into())]
        );
    }

    #[test]
    fn test_unterminated_tag_is_paragraph() {
        assert_eq!(
            blocks("{code}x=1"),
            vec![Block::Paragraph("{code}x=1".into())]
        );
    }

    #[test]
    fn test_plain_text_verbatim() {
        let text = "  just words\n with spacing  ";
        assert_eq!(blocks(text), vec![Block::Paragraph(text.into())]);
    }

    #[test]
    fn test_empty_content() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_mixed_order_preserved() {
        let content = "Intro\n{subtitle}Vars{/subtitle}{code}let a = 1;\nlet b = 2;{/code}\
                       Between{warn}careful{/warn}{info}note{/info}Outro";
        assert_eq!(
            blocks(content),
            vec![
                Block::Paragraph("Intro\n".into()),
                Block::Subtitle("Vars".into()),
                Block::Code("let a = 1;\nlet b = 2;".into()),
                Block::Paragraph("Between".into()),
                Block::Warn("careful".into()),
                Block::Info("note".into()),
                Block::Paragraph("Outro".into()),
            ]
        );
    }

    #[test]
    fn test_non_greedy_match() {
        let content = "{code}a{/code} mid {code}b{/code}";
        assert_eq!(
            blocks(content),
            vec![
                Block::Code("a".into()),
                Block::Paragraph(" mid ".into()),
                Block::Code("b".into()),
            ]
        );
    }

    #[test]
    fn test_mismatched_close_not_matched() {
        // `{code}` closed by `{/info}` is not a pair
        let content = "{code}x{/info}";
        assert_eq!(blocks(content), vec![Block::Paragraph(content.into())]);
    }

    #[test]
    fn test_unterminated_then_complete() {
        let content = "{warn}open {info}inside{/info}";
        assert_eq!(
            blocks(content),
            vec![
                Block::Paragraph("{warn}open ".into()),
                Block::Info("inside".into()),
            ]
        );
    }

    #[test]
    fn test_spans_cover_content() {
        let content = "a{code}b{/code}c";
        let spans: Vec<_> = tokenize(content).into_iter().map(|s| s.span).collect();
        assert_eq!(spans, vec![0..1, 1..15, 15..16]);
    }

    #[test]
    fn test_callout_labels() {
        assert_eq!(Block::Info(String::new()).callout(), Some(Callout::Note));
        assert_eq!(Block::Warn(String::new()).callout(), Some(Callout::Warning));
        assert_eq!(Block::Code(String::new()).callout(), None);
        assert_eq!(Callout::Note.label(), "На заметку");
        assert_eq!(Callout::Warning.label(), "Предупреждение");
    }

    proptest! {
        #[test]
        fn prop_segments_reconstruct_content(content in tagged_text()) {
            let segments = tokenize(&content);
            let rebuilt: String = segments
                .iter()
                .map(|s| &content[s.span.clone()])
                .collect();
            prop_assert_eq!(rebuilt, content.clone());
            prop_assert!(segments.iter().all(|s| !s.span.is_empty()));
        }

        #[test]
        fn prop_untagged_text_is_single_paragraph(content in "[a-z \n`{}]{1,40}") {
            prop_assume!(!content.contains("{code}") && !content.contains("{info}")
                && !content.contains("{warn}") && !content.contains("{subtitle}"));
            prop_assert_eq!(blocks(&content), vec![Block::Paragraph(content.clone())]);
        }
    }
}

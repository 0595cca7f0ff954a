//! Topic rendering
//!
//! Lays a topic out as styled terminal lines: code panels with a line
//! number gutter and copy button, note/warning callouts, subtitles and
//! word-wrapped paragraphs with picked terms.

use std::ops::Range;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::api::Topic;
use crate::highlight::{Color, Highlighter, Span, Style};
use crate::markup::{self, Block, Callout, Inline};

/// Copy button label
pub const COPY_LABEL: &str = "Копировать код";
/// Copy button label while the "copied" indicator is on
pub const COPIED_LABEL: &str = "Скопировано!";

/// A line of text with styled byte ranges
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledLine {
    pub text: String,
    pub spans: Vec<Span>,
}

impl StyledLine {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            spans: Vec::new(),
        }
    }

    pub fn styled(text: impl Into<String>, style: Style) -> Self {
        let mut line = Self::default();
        line.push(&text.into(), style);
        line
    }

    /// Append text; default-styled text gets no span
    pub fn push(&mut self, text: &str, style: Style) {
        let start = self.text.len();
        self.text.push_str(text);
        if !style.is_default() && !text.is_empty() {
            self.spans.push(Span::new(start, self.text.len(), style));
        }
    }

    pub fn width(&self) -> usize {
        self.text.width()
    }

    /// Render with ANSI escapes
    pub fn to_ansi(&self) -> String {
        let mut out = String::new();
        let mut pos = 0;
        for span in &self.spans {
            if span.start > pos {
                out.push_str(&self.text[pos..span.start]);
            }
            let content = &self.text[span.start.max(pos)..span.end];
            out.push_str(&span.style.to_crossterm().apply(content).to_string());
            pos = span.end;
        }
        out.push_str(&self.text[pos.min(self.text.len())..]);
        out
    }
}

/// Where a code block landed in the rendered output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRegion {
    /// Position of the block in the tokenized content; the copy-feedback key
    pub block_index: usize,
    /// Output lines occupied, header included
    pub lines: Range<usize>,
    /// Exact text placed on the clipboard
    pub code: String,
}

/// A laid-out topic
#[derive(Debug, Clone, Default)]
pub struct RenderedTopic {
    pub lines: Vec<StyledLine>,
    pub code_blocks: Vec<CodeRegion>,
}

impl RenderedTopic {
    pub fn to_plain(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_ansi(&self) -> String {
        self.lines
            .iter()
            .map(StyledLine::to_ansi)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Layout settings for one render pass
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Available columns; 0 disables wrapping
    pub width: usize,
    pub line_numbers: bool,
    pub tab_width: usize,
    /// Block index whose copy button shows the "copied" label
    pub copied: Option<usize>,
    /// Block index whose copy button is focused
    pub selected: Option<usize>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 80,
            line_numbers: true,
            tab_width: 4,
            copied: None,
            selected: None,
        }
    }
}

fn title_style() -> Style {
    Style::fg(Color::BrightWhite).with_bold()
}

fn subtitle_style() -> Style {
    Style::fg(Color::BrightCyan).with_bold().with_underline()
}

fn pick_style() -> Style {
    Style::fg(Color::BrightYellow).with_bg(Color::BrightBlack)
}

fn gutter_style() -> Style {
    Style::fg(Color::BrightBlack).with_dim()
}

fn callout_style(callout: Callout) -> Style {
    match callout {
        Callout::Note => Style::fg(Color::BrightBlue),
        Callout::Warning => Style::fg(Color::BrightYellow),
    }
}

fn callout_icon(callout: Callout) -> &'static str {
    match callout {
        Callout::Note => "ⓘ",
        Callout::Warning => "⚠",
    }
}

/// Greedy word wrapper over styled text pieces
struct LineBuilder {
    lines: Vec<StyledLine>,
    current: StyledLine,
    prefix: Option<(String, Style)>,
    /// Columns available after the prefix
    avail: usize,
    used: usize,
    /// Current line was started by wrapping, so leading spaces are dropped
    soft_break: bool,
    tab_width: usize,
}

impl LineBuilder {
    fn new(width: usize, prefix: Option<(String, Style)>, tab_width: usize) -> Self {
        let prefix_width = prefix.as_ref().map_or(0, |(p, _)| p.width());
        let avail = if width == 0 {
            usize::MAX
        } else {
            width.saturating_sub(prefix_width).max(1)
        };
        let mut builder = Self {
            lines: Vec::new(),
            current: StyledLine::default(),
            prefix,
            avail,
            used: 0,
            soft_break: false,
            tab_width: tab_width.max(1),
        };
        builder.start_line(false);
        builder
    }

    fn start_line(&mut self, soft: bool) {
        self.current = StyledLine::default();
        if let Some((prefix, style)) = &self.prefix {
            self.current.push(prefix, *style);
        }
        self.used = 0;
        self.soft_break = soft;
    }

    fn break_line(&mut self, soft: bool) {
        let line = std::mem::take(&mut self.current);
        self.lines.push(line);
        self.start_line(soft);
    }

    fn push_text(&mut self, text: &str, style: Style) {
        let text = printable_prose(text, self.tab_width);
        for piece in split_words(&text) {
            self.push_piece(piece, style);
        }
    }

    fn push_piece(&mut self, piece: &str, style: Style) {
        let width = piece.width();
        let is_space = piece.chars().all(char::is_whitespace);

        if is_space && self.soft_break && self.used == 0 {
            return;
        }

        if self.used.saturating_add(width) <= self.avail {
            self.current.push(piece, style);
            self.used += width;
            return;
        }

        if is_space {
            self.break_line(true);
            return;
        }

        if self.used > 0 {
            self.break_line(true);
        }

        if width <= self.avail {
            self.current.push(piece, style);
            self.used += width;
            return;
        }

        // Longer than a whole line; split by characters
        let mut chunk = String::new();
        for ch in piece.chars() {
            let cw = ch.width().unwrap_or(0);
            if self.used + cw > self.avail && self.used > 0 {
                self.current.push(&chunk, style);
                chunk.clear();
                self.break_line(true);
            }
            chunk.push(ch);
            self.used += cw;
        }
        self.current.push(&chunk, style);
    }

    fn finish(mut self) -> Vec<StyledLine> {
        self.lines.push(self.current);
        self.lines
    }
}

/// Split into alternating runs of whitespace and non-whitespace
fn split_words(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;
    for (i, ch) in text.char_indices() {
        let space = ch.is_whitespace();
        if let Some(prev) = in_space {
            if prev != space {
                pieces.push(&text[start..i]);
                start = i;
            }
        }
        in_space = Some(space);
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

/// Lay out inline runs; line breaks are hard breaks, empty runs are skipped
///
/// A break that ends the text adds no empty line; blocks are already
/// separated by a blank line.
fn wrap_inline(
    runs: &[Inline],
    width: usize,
    prefix: Option<(String, Style)>,
    tab_width: usize,
) -> Vec<StyledLine> {
    let mut builder = LineBuilder::new(width, prefix, tab_width);
    for run in runs {
        match run {
            Inline::Plain(text) if text.is_empty() => {}
            Inline::Plain(text) => builder.push_text(text, Style::default()),
            Inline::Picked(text) => builder.push_text(text, pick_style()),
            Inline::LineBreak => builder.break_line(false),
        }
    }
    let trailing_break = matches!(
        runs.iter().rev().find(|run| !run.is_empty()),
        Some(Inline::LineBreak)
    );

    let mut lines = builder.finish();
    if trailing_break && lines.len() > 1 {
        lines.pop();
    }
    lines
}

/// CRLF line endings become LF
fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Prose text safe to put on one terminal row
///
/// Tabs become `tab_width` spaces, other whitespace controls a single space,
/// remaining control characters are dropped.
fn printable_prose(text: &str, tab_width: usize) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\t' => out.extend(std::iter::repeat(' ').take(tab_width)),
            c if c.is_control() && c.is_whitespace() => out.push(' '),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

/// Expand tabs to the next tab stop and drop control characters
fn expand_tabs(line: &str, tab_width: usize) -> String {
    let mut out = String::with_capacity(line.len());
    let mut col = 0;
    for ch in line.chars() {
        if ch == '\t' {
            let spaces = tab_width - (col % tab_width);
            out.extend(std::iter::repeat(' ').take(spaces));
            col += spaces;
        } else if !ch.is_control() {
            out.push(ch);
            col += ch.width().unwrap_or(0);
        }
    }
    out
}

/// Renders topics using a shared highlighter
pub struct TopicRenderer<'a> {
    highlighter: &'a Highlighter,
    options: RenderOptions,
}

impl<'a> TopicRenderer<'a> {
    pub fn new(highlighter: &'a Highlighter, options: RenderOptions) -> Self {
        Self {
            highlighter,
            options,
        }
    }

    /// Lay out a full topic: title then each block separated by a blank line
    pub fn render(&self, topic: &Topic) -> RenderedTopic {
        let mut out = RenderedTopic::default();

        let title_runs = [Inline::Plain(topic.title.clone())];
        for mut line in wrap_inline(&title_runs, self.options.width, None, self.options.tab_width) {
            line.spans = vec![Span::new(0, line.text.len(), title_style())];
            out.lines.push(line);
        }

        let content = normalize_newlines(&topic.content);
        for (index, segment) in markup::tokenize(&content).into_iter().enumerate() {
            tracing::trace!(index, range = ?segment.span, "render block");
            out.lines.push(StyledLine::default());
            self.render_block(index, &segment.block, &mut out);
        }

        out
    }

    fn render_block(&self, index: usize, block: &Block, out: &mut RenderedTopic) {
        match block {
            Block::Code(code) => self.render_code(index, code, out),
            Block::Info(text) | Block::Warn(text) => {
                let callout = block.callout().unwrap_or(Callout::Note);
                let style = callout_style(callout);
                out.lines.push(StyledLine::styled(
                    format!("│ {} {}", callout_icon(callout), callout.label()),
                    style.with_bold(),
                ));
                let prefix = Some(("│ ".to_string(), style));
                out.lines.extend(wrap_inline(
                    &markup::highlight_inline(text),
                    self.options.width,
                    prefix,
                    self.options.tab_width,
                ));
            }
            Block::Subtitle(text) => {
                let mut builder = LineBuilder::new(self.options.width, None, self.options.tab_width);
                builder.push_text(text, subtitle_style());
                out.lines.extend(builder.finish());
            }
            Block::Paragraph(text) => {
                out.lines.extend(wrap_inline(
                    &markup::highlight_inline(text),
                    self.options.width,
                    None,
                    self.options.tab_width,
                ));
            }
        }
    }

    fn render_code(&self, index: usize, code: &str, out: &mut RenderedTopic) {
        let start = out.lines.len();
        out.lines.push(self.code_header(index));

        let code = normalize_newlines(code);
        let expanded: Vec<String> = code
            .split('\n')
            .map(|line| expand_tabs(line, self.options.tab_width.max(1)))
            .collect();
        let highlighted = self.highlighter.highlight(&expanded.join("\n"));
        let digits = expanded.len().to_string().len().max(2);

        for (n, (text, spans)) in expanded.iter().zip(highlighted).enumerate() {
            let mut line = if self.options.line_numbers {
                StyledLine::styled(format!("{:>digits$} │ ", n + 1), gutter_style())
            } else {
                StyledLine::plain("  ")
            };
            let offset = line.text.len();
            line.text.push_str(text);
            line.spans.extend(
                spans
                    .into_iter()
                    .map(|s| Span::new(s.start + offset, s.end + offset, s.style)),
            );
            out.lines.push(line);
        }

        out.code_blocks.push(CodeRegion {
            block_index: index,
            lines: start..out.lines.len(),
            code,
        });
    }

    fn code_header(&self, index: usize) -> StyledLine {
        let copied = self.options.copied == Some(index);
        let label = if copied {
            format!("✓ {COPIED_LABEL}")
        } else {
            format!("⧉ {COPY_LABEL}")
        };
        let mut style = if copied {
            Style::fg(Color::BrightGreen).with_bold()
        } else {
            Style::fg(Color::BrightBlack)
        };
        if self.options.selected == Some(index) {
            style = style.with_reverse();
        }

        let mut line = StyledLine::default();
        line.push("┌─ ", gutter_style());
        line.push(&format!("[{label}]"), style);
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(content: &str) -> Topic {
        Topic {
            id: None,
            title: "Loops".to_string(),
            content: content.to_string(),
        }
    }

    fn texts(rendered: &RenderedTopic) -> Vec<&str> {
        rendered.lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_paragraph_with_pick_and_break() {
        let highlighter = Highlighter::default();
        let renderer = TopicRenderer::new(&highlighter, RenderOptions::default());
        let rendered = renderer.render(&topic("use `for` here\nnext line"));

        assert_eq!(texts(&rendered), vec!["Loops", "", "use for here", "next line"]);
        let line = &rendered.lines[2];
        assert_eq!(line.spans.len(), 1);
        assert_eq!(&line.text[line.spans[0].start..line.spans[0].end], "for");
        assert_eq!(line.spans[0].style, pick_style());
    }

    #[test]
    fn test_code_block_region_and_gutter() {
        let highlighter = Highlighter::default();
        let renderer = TopicRenderer::new(&highlighter, RenderOptions::default());
        let rendered = renderer.render(&topic("Intro{code}\nlet a = 1;\nlet b = 2;\n{/code}"));

        assert_eq!(rendered.code_blocks.len(), 1);
        let region = &rendered.code_blocks[0];
        assert_eq!(region.block_index, 1);
        assert_eq!(region.code, "let a = 1;\nlet b = 2;");
        assert_eq!(region.lines, 4..7);

        let lines = texts(&rendered);
        assert_eq!(lines[4], format!("┌─ [⧉ {COPY_LABEL}]"));
        assert_eq!(lines[5], " 1 │ let a = 1;");
        assert_eq!(lines[6], " 2 │ let b = 2;");

        // `let` highlighted after the gutter
        let keyword = &rendered.lines[5].spans[1];
        assert_eq!(&lines[5][keyword.start..keyword.end], "let");
    }

    #[test]
    fn test_crlf_content_renders_without_carriage_returns() {
        let highlighter = Highlighter::default();
        let renderer = TopicRenderer::new(&highlighter, RenderOptions::default());
        let rendered =
            renderer.render(&topic("first line\r\nsecond\r\n{code}let a = 1;\r\nlet b = 2;{/code}"));

        assert!(rendered.lines.iter().all(|l| !l.text.contains('\r')));
        assert_eq!(
            texts(&rendered),
            vec![
                "Loops",
                "",
                "first line",
                "second",
                "",
                format!("┌─ [⧉ {COPY_LABEL}]").as_str(),
                " 1 │ let a = 1;",
                " 2 │ let b = 2;",
            ]
        );
        assert_eq!(rendered.code_blocks[0].code, "let a = 1;\nlet b = 2;");
    }

    #[test]
    fn test_prose_tabs_and_control_characters() {
        let highlighter = Highlighter::default();
        let renderer = TopicRenderer::new(&highlighter, RenderOptions::default());
        let rendered = renderer.render(&topic("a\tb\u{7}c\rd"));
        assert_eq!(texts(&rendered)[2], "a    bc d");

        let rendered = renderer.render(&topic("{code}x\u{1b}[2J = 1;{/code}"));
        assert_eq!(texts(&rendered)[3], " 1 │ x[2J = 1;");
    }

    #[test]
    fn test_trailing_break_adds_no_blank_line() {
        let highlighter = Highlighter::default();
        let renderer = TopicRenderer::new(&highlighter, RenderOptions::default());
        let rendered = renderer.render(&topic("Intro\n{code}x{/code}"));
        assert_eq!(
            texts(&rendered),
            vec![
                "Loops",
                "",
                "Intro",
                "",
                format!("┌─ [⧉ {COPY_LABEL}]").as_str(),
                " 1 │ x",
            ]
        );

        let lines = wrap_inline(&markup::highlight_inline("one\n\ntwo"), 80, None, 4);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "", "two"]);
    }

    #[test]
    fn test_copied_label_only_on_matching_block() {
        let highlighter = Highlighter::default();
        let options = RenderOptions {
            copied: Some(2),
            ..RenderOptions::default()
        };
        let renderer = TopicRenderer::new(&highlighter, options);
        let rendered = renderer.render(&topic("{code}a{/code}between{code}b{/code}"));

        let headers: Vec<&str> = rendered
            .code_blocks
            .iter()
            .map(|r| rendered.lines[r.lines.start].text.as_str())
            .collect();
        assert_eq!(
            headers,
            vec![
                format!("┌─ [⧉ {COPY_LABEL}]").as_str(),
                format!("┌─ [✓ {COPIED_LABEL}]").as_str(),
            ]
        );
    }

    #[test]
    fn test_callouts_and_subtitle() {
        let highlighter = Highlighter::default();
        let renderer = TopicRenderer::new(&highlighter, RenderOptions::default());
        let rendered =
            renderer.render(&topic("{subtitle}Part `1`{/subtitle}{info}see `x`{/info}{warn}no{/warn}"));

        assert_eq!(
            texts(&rendered),
            vec![
                "Loops",
                "",
                "Part `1`",
                "",
                "│ ⓘ На заметку",
                "│ see x",
                "",
                "│ ⚠ Предупреждение",
                "│ no",
            ]
        );
    }

    #[test]
    fn test_word_wrap() {
        let highlighter = Highlighter::default();
        let options = RenderOptions {
            width: 10,
            ..RenderOptions::default()
        };
        let renderer = TopicRenderer::new(&highlighter, options);
        let rendered = renderer.render(&topic("alpha beta gamma abcdefghijklmn"));
        assert_eq!(
            &texts(&rendered)[2..],
            &["alpha beta", "gamma", "abcdefghij", "klmn"]
        );
    }

    #[test]
    fn test_wrap_inside_callout_keeps_prefix() {
        let lines = wrap_inline(
            &[Inline::Plain("one two three".to_string())],
            9,
            Some(("│ ".to_string(), Style::default())),
            4,
        );
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["│ one two", "│ three"]);
    }

    #[test]
    fn test_tabs_expanded_in_code() {
        assert_eq!(expand_tabs("\tx", 4), "    x");
        assert_eq!(expand_tabs("ab\tx", 4), "ab  x");
    }

    #[test]
    fn test_plain_and_ansi_output() {
        let highlighter = Highlighter::default();
        let renderer = TopicRenderer::new(&highlighter, RenderOptions::default());
        let rendered = renderer.render(&topic("text"));
        assert_eq!(rendered.to_plain(), "Loops\n\ntext");
        assert!(rendered.to_ansi().contains("\u{1b}["));
        assert!(rendered.to_ansi().ends_with("text"));
    }

    #[test]
    fn test_unterminated_tag_rendered_literally() {
        let highlighter = Highlighter::default();
        let renderer = TopicRenderer::new(&highlighter, RenderOptions::default());
        let rendered = renderer.render(&topic("{code}x=1"));
        assert_eq!(texts(&rendered), vec!["Loops", "", "{code}x=1"]);
        assert!(rendered.code_blocks.is_empty());
    }
}

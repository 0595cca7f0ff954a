//! Built-in language definitions
//!
//! Code blocks in topics carry no language hint, so one of these is
//! chosen by the `code-language` setting (JavaScript by default).

use super::language::LanguageDefinition;
use super::rules::{MultilineRule, PatternRule};
use super::tokens::TokenType;

/// (name, regex, token type, priority)
type PatternSpec = (&'static str, &'static str, TokenType, i32);

/// (name, start regex, end regex, token type, escape char)
type MultilineSpec = (&'static str, &'static str, &'static str, TokenType, Option<char>);

fn build(
    name: &str,
    aliases: &[&str],
    multiline: &[MultilineSpec],
    patterns: &[PatternSpec],
) -> LanguageDefinition {
    let mut lang = LanguageDefinition::new(name);
    for alias in aliases {
        lang.add_alias(alias);
    }
    for (id, &(rule_name, start, end, token_type, escape)) in multiline.iter().enumerate() {
        let state_id = (id + 1) as u8;
        match MultilineRule::new(rule_name, start, end, token_type, state_id, escape) {
            Some(rule) => lang.add_multiline(rule),
            None => tracing::warn!(language = name, rule = rule_name, "invalid multiline rule"),
        }
    }
    for &(rule_name, pattern, token_type, priority) in patterns {
        match PatternRule::new(rule_name, pattern, token_type, priority) {
            Some(rule) => lang.add_pattern(rule),
            None => tracing::warn!(language = name, rule = rule_name, "invalid pattern rule"),
        }
    }
    lang
}

pub fn javascript() -> LanguageDefinition {
    build(
        "JavaScript",
        &["js", "javascript", "jsx", "node"],
        &[
            ("block_comment", r"/\*", r"\*/", TokenType::Comment, None),
            ("template", "`", "`", TokenType::String, Some('\\')),
        ],
        &[
            ("line_comment", r"//.*$", TokenType::Comment, 100),
            ("double_string", r#""(?:[^"\\]|\\.)*""#, TokenType::String, 90),
            ("single_string", r"'(?:[^'\\]|\\.)*'", TokenType::String, 90),
            (
                "keyword",
                r"\b(async|await|break|case|catch|class|const|continue|debugger|default|delete|do|else|export|extends|finally|for|from|function|if|import|in|instanceof|let|new|of|return|static|super|switch|throw|try|typeof|var|void|while|with|yield)\b",
                TokenType::Keyword,
                80,
            ),
            ("this", r"\bthis\b", TokenType::Special, 79),
            (
                "constant",
                r"\b(true|false|null|undefined|NaN|Infinity)\b",
                TokenType::Constant,
                78,
            ),
            (
                "global",
                r"\b(Array|Boolean|Date|Error|JSON|Map|Math|Number|Object|Promise|RegExp|Set|String|Symbol|console|document|window)\b",
                TokenType::Type,
                75,
            ),
            ("method_call", r"\.[A-Za-z_$][\w$]*", TokenType::Function, 70),
            ("hex", r"\b0[xX][0-9a-fA-F_]+n?\b", TokenType::Number, 65),
            (
                "number",
                r"\b\d[\d_]*(?:\.\d+)?(?:[eE][+-]?\d+)?n?\b",
                TokenType::Number,
                63,
            ),
            ("operator", r"[+\-*/%&|^!<>=?~:]+", TokenType::Operator, 40),
        ],
    )
}

pub fn python() -> LanguageDefinition {
    build(
        "Python",
        &["py", "python"],
        &[
            ("triple_double", r#"""""#, r#"""""#, TokenType::String, None),
            ("triple_single", r"'''", r"'''", TokenType::String, None),
        ],
        &[
            ("comment", r"#.*$", TokenType::Comment, 100),
            ("decorator", r"@\w+", TokenType::Attribute, 95),
            ("double_string", r#"[fFrRbB]?"(?:[^"\\]|\\.)*""#, TokenType::String, 90),
            ("single_string", r"[fFrRbB]?'(?:[^'\\]|\\.)*'", TokenType::String, 90),
            (
                "keyword",
                r"\b(and|as|assert|async|await|break|class|continue|def|del|elif|else|except|finally|for|from|global|if|import|in|is|lambda|nonlocal|not|or|pass|raise|return|try|while|with|yield)\b",
                TokenType::Keyword,
                80,
            ),
            ("constant", r"\b(True|False|None)\b", TokenType::Constant, 78),
            ("self", r"\b(self|cls)\b", TokenType::Special, 77),
            (
                "builtin",
                r"\b(abs|all|any|bool|dict|enumerate|filter|float|input|int|isinstance|len|list|map|max|min|open|print|range|reversed|round|set|sorted|str|sum|tuple|type|zip)\b",
                TokenType::Function,
                75,
            ),
            ("hex", r"\b0[xX][0-9a-fA-F_]+\b", TokenType::Number, 65),
            (
                "number",
                r"\b\d[\d_]*(?:\.\d+)?(?:[eE][+-]?\d+)?j?\b",
                TokenType::Number,
                63,
            ),
            ("operator", r"[+\-*/%&|^!<>=~]+", TokenType::Operator, 40),
        ],
    )
}

/// All built-in languages
pub fn all_languages() -> Vec<LanguageDefinition> {
    vec![javascript(), python()]
}

//! Topic content markup
//!
//! Topic bodies are plain text with four bracketed block tags
//! (`{code}`, `{info}`, `{warn}`, `{subtitle}`) and backtick-delimited
//! "picked" terms inside prose. This module splits the raw string into
//! blocks and block text into inline runs; presentation lives in `render`.

mod block;
mod inline;

pub use block::{tokenize, Block, Callout};
pub use inline::{highlight_inline, Inline};

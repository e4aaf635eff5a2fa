//! Markdown AST parser for rendered chat content.
//!
//! Two profiles exist: [`parse`] recognises the full construct set and is
//! used for HTML output; [`parse_minimal`] keeps only mentions, custom emoji
//! and timestamps so plain formats preserve semantics without styling.

pub mod ast;
mod matchers;
pub mod emit;
pub mod parser;
mod shortcodes;

pub use ast::{FormattingKind, MarkdownNode, MentionKind};
pub use emit::to_plain_text;
pub use parser::{parse, parse_minimal, MAX_DEPTH};

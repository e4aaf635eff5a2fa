//! Plain-text emission: the inverse of parsing for unstyled content.
//!
//! Formatting containers contribute only their children, so a tree built
//! from text without special constructs round-trips exactly. Mentions and
//! timestamps are emitted in a generic raw form here; format writers that
//! can resolve names against an export context render them properly.

use crate::ast::{MarkdownNode, MentionKind};

pub fn to_plain_text(nodes: &[MarkdownNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        emit_node(node, &mut out);
    }
    out
}

fn emit_node(node: &MarkdownNode, out: &mut String) {
    match node {
        MarkdownNode::Text(text) => out.push_str(text),
        MarkdownNode::Formatting { children, .. }
        | MarkdownNode::Heading { children, .. }
        | MarkdownNode::Link { children, .. } => {
            for child in children {
                emit_node(child, out);
            }
        }
        MarkdownNode::List { items } => {
            for item in items {
                out.push_str("- ");
                for child in item {
                    emit_node(child, out);
                }
                out.push('\n');
            }
        }
        MarkdownNode::InlineCode { code } => out.push_str(code),
        MarkdownNode::MultiLineCode { code, .. } => out.push_str(code),
        MarkdownNode::Emoji(emoji) => match emoji.id {
            Some(_) => {
                out.push(':');
                out.push_str(&emoji.name);
                out.push(':');
            }
            None => out.push_str(&emoji.name),
        },
        MarkdownNode::Mention { kind, target_id } => match kind {
            MentionKind::Everyone => out.push_str("@everyone"),
            MentionKind::Here => out.push_str("@here"),
            MentionKind::User | MentionKind::Channel | MentionKind::Role => {
                out.push('@');
                if let Some(id) = target_id {
                    out.push_str(&id.to_string());
                }
            }
        },
        MarkdownNode::Timestamp { instant, .. } => match instant {
            Some(instant) => out.push_str(&instant.format("%Y-%m-%d %H:%M").to_string()),
            None => out.push_str("Invalid date"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn pure_text_round_trips() {
        for input in [
            "hello world",
            "no special constructs here.",
            "multi\nline\ntext",
            "punctuation! and, digits 123",
        ] {
            assert_eq!(to_plain_text(&parse(input)), input);
        }
    }

    #[test]
    fn formatting_markers_are_stripped() {
        assert_eq!(to_plain_text(&parse("**bold** and *it*")), "bold and it");
    }

    #[test]
    fn custom_emoji_becomes_shortcode() {
        assert_eq!(to_plain_text(&parse("<:pepe:42>")), ":pepe:");
    }
}

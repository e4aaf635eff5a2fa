use chrono::{DateTime, Utc};

use chronicle_model::{Emoji, Id};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormattingKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Spoiler,
    Quote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionKind {
    Everyone,
    Here,
    User,
    Channel,
    Role,
}

/// One node of the parsed content tree.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkdownNode {
    Text(String),
    Formatting {
        kind: FormattingKind,
        children: Vec<MarkdownNode>,
    },
    Heading {
        level: u8,
        children: Vec<MarkdownNode>,
    },
    List {
        items: Vec<Vec<MarkdownNode>>,
    },
    InlineCode {
        code: String,
    },
    MultiLineCode {
        language: Option<String>,
        code: String,
    },
    Link {
        url: String,
        children: Vec<MarkdownNode>,
    },
    Emoji(Emoji),
    Mention {
        kind: MentionKind,
        target_id: Option<Id>,
    },
    /// `instant == None` marks the invalid-timestamp singleton; a `None`
    /// format code on a valid instant means "relative".
    Timestamp {
        instant: Option<DateTime<Utc>>,
        format: Option<char>,
    },
}

impl MarkdownNode {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn children(&self) -> &[MarkdownNode] {
        match self {
            Self::Formatting { children, .. }
            | Self::Heading { children, .. }
            | Self::Link { children, .. } => children,
            _ => &[],
        }
    }

    /// Whether the node carries anything visible besides whitespace.
    /// Used by the jumbo-emoji probe.
    pub fn is_whitespace_text(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }
}

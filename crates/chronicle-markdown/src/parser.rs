//! Priority-ordered markdown parser.
//!
//! Not a recursive-descent grammar: a flat list of matchers is scanned over
//! the segment, the match with the smallest start index wins (registration
//! order breaks ties), the gap before it becomes plain text, and container
//! nodes re-enter the same machinery for their children.

use std::sync::LazyLock;

use chrono::{TimeZone, Utc};
use regex::Regex;

use chronicle_model::{Emoji, Id};

use crate::ast::{FormattingKind, MarkdownNode, MentionKind};
use crate::matchers::{Found, Pattern};
use crate::shortcodes;

/// Container nodes nested deeper than this parse their content as raw text.
pub const MAX_DEPTH: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Shrug,
    IgnoredChars,
    EscapedSymbol,
    ItalicBoldComposite,
    UnderlineItalicComposite,
    Bold,
    Underline,
    Italic,
    ItalicUnderscore,
    Strikethrough,
    Spoiler,
    MultiLineQuote,
    LineQuote,
    Heading,
    List,
    MultiLineCode,
    InlineCodeDouble,
    InlineCode,
    EveryoneMention,
    HereMention,
    UserMention,
    ChannelMention,
    RoleMention,
    MaskedLink,
    AutoLink,
    HiddenLink,
    StandardEmoji,
    CustomEmoji,
    ShortcodeEmoji,
    Timestamp,
}

struct Matcher {
    pattern: Pattern,
    rule: Rule,
}

macro_rules! re {
    ($name:ident, $pattern:literal) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($pattern).expect("invalid matcher regex"));
    };
}

re!(IGNORED_RE, r"[\u{200B}\u{200E}\u{200F}\u{2060}-\u{2064}\u{FEFF}]+");
re!(ESCAPED_RE, r"\\([^A-Za-z0-9\s])");
re!(ITALIC_BOLD_RE, r"(?s)\*(\*\*.+?\*\*)\*");
re!(UNDERLINE_ITALIC_RE, r"(?s)_(__.+?__)_");
re!(BOLD_RE, r"(?s)\*\*(.+?)\*\*");
re!(UNDERLINE_RE, r"(?s)__(.+?)__");
re!(ITALIC_RE, r"(?s)\*([^\s*].*?)\*");
re!(ITALIC_UNDERSCORE_RE, r"(?s)_([^\s_].*?)_");
re!(STRIKETHROUGH_RE, r"(?s)~~(.+?)~~");
re!(SPOILER_RE, r"(?s)\|\|(.+?)\|\|");
re!(MULTI_LINE_QUOTE_RE, r"(?ms)^>>> (.+)");
re!(LINE_QUOTE_RE, r"(?m)^(?:> .*(?:\n|$))+");
re!(HEADING_RE, r"(?m)^(#{1,3}) (.+?) *(?:\n|$)");
re!(LIST_RE, r"(?m)^(?:[ \t]*[-*] .*(?:\n|$))+");
re!(MULTI_LINE_CODE_RE, r"(?s)```(?:([A-Za-z0-9_+.-]+)\n)?(.*?)```");
re!(INLINE_CODE_DOUBLE_RE, r"``([^`](?:.*?[^`])?)``");
re!(INLINE_CODE_RE, r"`([^`]+)`");
re!(USER_MENTION_RE, r"<@!?(\d+)>");
re!(CHANNEL_MENTION_RE, r"<#(\d+)>");
re!(ROLE_MENTION_RE, r"<@&(\d+)>");
re!(MASKED_LINK_RE, r"\[(.+?)\]\((.+?)\)");
re!(AUTO_LINK_RE, r#"(https?://[^\s<]*[^\s<.,:;"'\)\]])"#);
re!(HIDDEN_LINK_RE, r"<(https?://[^\s>]+)>");
re!(
    STANDARD_EMOJI_RE,
    r"(?x)(
        [\u{1F1E6}-\u{1F1FF}]{2}
        | [\u{1F000}-\u{1FAFF}] [\u{1F3FB}-\u{1F3FF}]? \u{FE0F}?
        | [\u{2190}-\u{21FF}\u{2600}-\u{27BF}\u{2B00}-\u{2BFF}\u{2300}-\u{23FF}] \u{FE0F}?
        | [\u{2764}\u{2B50}\u{203C}\u{2049}] \u{FE0F}?
    )"
);
re!(CUSTOM_EMOJI_RE, r"<(a?):(\w+):(\d+)>");
re!(SHORTCODE_EMOJI_RE, r":([\w+-]+):");
re!(TIMESTAMP_RE, r"<t:(-?\d+)(?::([A-Za-z]))?>");

/// Full profile, in priority order. The order is load-bearing: ties on the
/// start index go to the earlier entry.
static FULL_MATCHERS: LazyLock<Vec<Matcher>> = LazyLock::new(|| {
    vec![
        Matcher { pattern: Pattern::Exact(r"¯\_(ツ)_/¯"), rule: Rule::Shrug },
        Matcher { pattern: Pattern::Regex(&IGNORED_RE), rule: Rule::IgnoredChars },
        Matcher { pattern: Pattern::Regex(&ESCAPED_RE), rule: Rule::EscapedSymbol },
        Matcher { pattern: Pattern::Regex(&ITALIC_BOLD_RE), rule: Rule::ItalicBoldComposite },
        Matcher { pattern: Pattern::Regex(&UNDERLINE_ITALIC_RE), rule: Rule::UnderlineItalicComposite },
        Matcher { pattern: Pattern::Regex(&BOLD_RE), rule: Rule::Bold },
        Matcher { pattern: Pattern::Regex(&UNDERLINE_RE), rule: Rule::Underline },
        Matcher { pattern: Pattern::Regex(&ITALIC_RE), rule: Rule::Italic },
        Matcher { pattern: Pattern::Regex(&ITALIC_UNDERSCORE_RE), rule: Rule::ItalicUnderscore },
        Matcher { pattern: Pattern::Regex(&STRIKETHROUGH_RE), rule: Rule::Strikethrough },
        Matcher { pattern: Pattern::Regex(&SPOILER_RE), rule: Rule::Spoiler },
        Matcher { pattern: Pattern::Regex(&MULTI_LINE_QUOTE_RE), rule: Rule::MultiLineQuote },
        Matcher { pattern: Pattern::Regex(&LINE_QUOTE_RE), rule: Rule::LineQuote },
        Matcher { pattern: Pattern::Regex(&HEADING_RE), rule: Rule::Heading },
        Matcher { pattern: Pattern::Regex(&LIST_RE), rule: Rule::List },
        Matcher { pattern: Pattern::Regex(&MULTI_LINE_CODE_RE), rule: Rule::MultiLineCode },
        Matcher { pattern: Pattern::Regex(&INLINE_CODE_DOUBLE_RE), rule: Rule::InlineCodeDouble },
        Matcher { pattern: Pattern::Regex(&INLINE_CODE_RE), rule: Rule::InlineCode },
        Matcher { pattern: Pattern::Exact("@everyone"), rule: Rule::EveryoneMention },
        Matcher { pattern: Pattern::Exact("@here"), rule: Rule::HereMention },
        Matcher { pattern: Pattern::Regex(&USER_MENTION_RE), rule: Rule::UserMention },
        Matcher { pattern: Pattern::Regex(&CHANNEL_MENTION_RE), rule: Rule::ChannelMention },
        Matcher { pattern: Pattern::Regex(&ROLE_MENTION_RE), rule: Rule::RoleMention },
        Matcher { pattern: Pattern::Regex(&MASKED_LINK_RE), rule: Rule::MaskedLink },
        Matcher { pattern: Pattern::Regex(&AUTO_LINK_RE), rule: Rule::AutoLink },
        Matcher { pattern: Pattern::Regex(&HIDDEN_LINK_RE), rule: Rule::HiddenLink },
        Matcher { pattern: Pattern::Regex(&STANDARD_EMOJI_RE), rule: Rule::StandardEmoji },
        Matcher { pattern: Pattern::Regex(&CUSTOM_EMOJI_RE), rule: Rule::CustomEmoji },
        Matcher { pattern: Pattern::Regex(&SHORTCODE_EMOJI_RE), rule: Rule::ShortcodeEmoji },
        Matcher { pattern: Pattern::Regex(&TIMESTAMP_RE), rule: Rule::Timestamp },
    ]
});

/// Minimal profile used by non-HTML formats: only the constructs whose raw
/// form would lose meaning (mentions, custom emoji, timestamps).
static MINIMAL_MATCHERS: LazyLock<Vec<Matcher>> = LazyLock::new(|| {
    vec![
        Matcher { pattern: Pattern::Exact("@everyone"), rule: Rule::EveryoneMention },
        Matcher { pattern: Pattern::Exact("@here"), rule: Rule::HereMention },
        Matcher { pattern: Pattern::Regex(&USER_MENTION_RE), rule: Rule::UserMention },
        Matcher { pattern: Pattern::Regex(&CHANNEL_MENTION_RE), rule: Rule::ChannelMention },
        Matcher { pattern: Pattern::Regex(&ROLE_MENTION_RE), rule: Rule::RoleMention },
        Matcher { pattern: Pattern::Regex(&CUSTOM_EMOJI_RE), rule: Rule::CustomEmoji },
        Matcher { pattern: Pattern::Regex(&TIMESTAMP_RE), rule: Rule::Timestamp },
    ]
});

static BOLD_ONLY: LazyLock<Vec<Matcher>> = LazyLock::new(|| {
    vec![Matcher { pattern: Pattern::Regex(&BOLD_RE), rule: Rule::Bold }]
});

static UNDERLINE_ONLY: LazyLock<Vec<Matcher>> = LazyLock::new(|| {
    vec![Matcher { pattern: Pattern::Regex(&UNDERLINE_RE), rule: Rule::Underline }]
});

/// Parse with the full matcher set.
pub fn parse(text: &str) -> Vec<MarkdownNode> {
    match_all(&FULL_MATCHERS, text, 0)
}

/// Parse with the minimal matcher set.
pub fn parse_minimal(text: &str) -> Vec<MarkdownNode> {
    match_all(&MINIMAL_MATCHERS, text, 0)
}

/// The aggregate + driver: covers the whole segment exactly once with an
/// ordered mix of matched nodes and fallback text.
fn match_all(matchers: &[Matcher], text: &str, depth: u32) -> Vec<MarkdownNode> {
    if depth >= MAX_DEPTH {
        return vec![MarkdownNode::text(text)];
    }

    let mut nodes = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let remaining = &text[pos..];
        let Some((rule, found)) = find_earliest(matchers, remaining) else {
            break;
        };

        if found.start > 0 {
            nodes.push(MarkdownNode::text(&remaining[..found.start]));
        }
        if let Some(node) = build_node(rule, &found, remaining, depth) {
            nodes.push(node);
        }

        // Zero-length matches cannot exist (every pattern consumes at least
        // one byte), but guard against a stuck driver regardless.
        let consumed = found.start + found.len;
        if consumed == 0 {
            break;
        }
        pos += consumed;
    }

    if pos < text.len() {
        nodes.push(MarkdownNode::text(&text[pos..]));
    }

    nodes
}

fn find_earliest<'m>(matchers: &'m [Matcher], text: &str) -> Option<(Rule, Found)> {
    let mut best: Option<(Rule, Found)> = None;
    for matcher in matchers {
        let found = match matcher.rule {
            Rule::ShortcodeEmoji => try_match_shortcode(text),
            Rule::Bold => matcher.pattern.try_match(text).map(|mut found| {
                extend_delimiter_run(&mut found, text, '*');
                found
            }),
            Rule::Underline => matcher.pattern.try_match(text).map(|mut found| {
                extend_delimiter_run(&mut found, text, '_');
                found
            }),
            _ => matcher.pattern.try_match(text),
        };
        let Some(found) = found else { continue };
        if found.start == 0 {
            // Nothing can start earlier; registration order settles ties.
            return Some((matcher.rule, found));
        }
        match &best {
            Some((_, current)) if current.start <= found.start => {}
            _ => best = Some((matcher.rule, found)),
        }
    }
    best
}

/// When the closing delimiter pair sits inside a longer run (`**bold *it***`)
/// the lazy regex closes too early and strands the tail of the run. Pull the
/// excess delimiters into the capture so the closing pair is the last two
/// characters of the run.
fn extend_delimiter_run(found: &mut Found, text: &str, delimiter: char) {
    let mut end = found.start + found.len;
    while text[end..].starts_with(delimiter) {
        if let Some(Some(capture)) = found.groups.get_mut(0) {
            capture.push(delimiter);
        }
        end += delimiter.len_utf8();
        found.len += delimiter.len_utf8();
    }
}

/// Shortcodes only match when the name resolves; otherwise later occurrences
/// are probed so an unknown name does not shadow a known one.
fn try_match_shortcode(text: &str) -> Option<Found> {
    for caps in SHORTCODE_EMOJI_RE.captures_iter(text) {
        let whole = caps.get(0)?;
        let name = caps.get(1)?.as_str();
        if let Some(emoji) = shortcodes::lookup(name) {
            return Some(Found {
                start: whole.start(),
                len: whole.len(),
                groups: vec![Some(name.to_string()), Some(emoji.to_string())],
            });
        }
    }
    None
}

fn group<'f>(found: &'f Found, index: usize) -> Option<&'f str> {
    found.groups.get(index).and_then(|g| g.as_deref())
}

fn build_node(rule: Rule, found: &Found, text: &str, depth: u32) -> Option<MarkdownNode> {
    let matched = &text[found.start..found.start + found.len];

    let formatting = |kind: FormattingKind, inner: &str| MarkdownNode::Formatting {
        kind,
        children: match_all(&FULL_MATCHERS, inner, depth + 1),
    };

    let node = match rule {
        Rule::Shrug => MarkdownNode::text(matched),
        Rule::IgnoredChars => return None,
        Rule::EscapedSymbol => MarkdownNode::text(group(found, 0)?),

        // `*…**X**…*` re-parses children with only the bold matcher, and the
        // underscore twin with only the underline matcher.
        Rule::ItalicBoldComposite => MarkdownNode::Formatting {
            kind: FormattingKind::Italic,
            children: match_all(&BOLD_ONLY, group(found, 0)?, depth + 1),
        },
        Rule::UnderlineItalicComposite => MarkdownNode::Formatting {
            kind: FormattingKind::Italic,
            children: match_all(&UNDERLINE_ONLY, group(found, 0)?, depth + 1),
        },

        Rule::Bold => formatting(FormattingKind::Bold, group(found, 0)?),
        Rule::Underline => formatting(FormattingKind::Underline, group(found, 0)?),
        Rule::Italic | Rule::ItalicUnderscore => {
            formatting(FormattingKind::Italic, group(found, 0)?)
        }
        Rule::Strikethrough => formatting(FormattingKind::Strikethrough, group(found, 0)?),
        Rule::Spoiler => formatting(FormattingKind::Spoiler, group(found, 0)?),

        Rule::MultiLineQuote => formatting(FormattingKind::Quote, group(found, 0)?),
        Rule::LineQuote => {
            let stripped = matched
                .lines()
                .map(|line| line.strip_prefix("> ").unwrap_or(line))
                .collect::<Vec<_>>()
                .join("\n");
            formatting(FormattingKind::Quote, &stripped)
        }

        Rule::Heading => MarkdownNode::Heading {
            level: group(found, 0)?.len() as u8,
            children: match_all(&FULL_MATCHERS, group(found, 1)?, depth + 1),
        },
        Rule::List => {
            let items = matched
                .lines()
                .filter_map(|line| {
                    let trimmed = line.trim_start_matches([' ', '\t']);
                    trimmed
                        .strip_prefix("- ")
                        .or_else(|| trimmed.strip_prefix("* "))
                })
                .map(|item| match_all(&FULL_MATCHERS, item, depth + 1))
                .collect();
            MarkdownNode::List { items }
        }

        Rule::MultiLineCode => MarkdownNode::MultiLineCode {
            language: group(found, 0).map(str::to_string),
            code: group(found, 1).unwrap_or_default().to_string(),
        },
        Rule::InlineCodeDouble | Rule::InlineCode => MarkdownNode::InlineCode {
            code: group(found, 0)?.to_string(),
        },

        Rule::EveryoneMention => MarkdownNode::Mention {
            kind: MentionKind::Everyone,
            target_id: None,
        },
        Rule::HereMention => MarkdownNode::Mention {
            kind: MentionKind::Here,
            target_id: None,
        },
        Rule::UserMention => mention(MentionKind::User, group(found, 0)?),
        Rule::ChannelMention => mention(MentionKind::Channel, group(found, 0)?),
        Rule::RoleMention => mention(MentionKind::Role, group(found, 0)?),

        Rule::MaskedLink => MarkdownNode::Link {
            url: group(found, 1)?.to_string(),
            children: match_all(&FULL_MATCHERS, group(found, 0)?, depth + 1),
        },
        Rule::AutoLink => {
            let url = group(found, 0)?;
            MarkdownNode::Link {
                url: url.to_string(),
                children: vec![MarkdownNode::text(url)],
            }
        }
        Rule::HiddenLink => {
            let url = group(found, 0)?;
            MarkdownNode::Link {
                url: url.to_string(),
                children: vec![MarkdownNode::text(url)],
            }
        }

        Rule::StandardEmoji => MarkdownNode::Emoji(Emoji::standard(group(found, 0)?)),
        Rule::CustomEmoji => {
            let animated = group(found, 0).is_some_and(|flag| flag == "a");
            let name = group(found, 1)?;
            let id = Id::parse(group(found, 2)?).ok()?;
            MarkdownNode::Emoji(Emoji::custom(id, name, animated))
        }
        Rule::ShortcodeEmoji => MarkdownNode::Emoji(Emoji::standard(group(found, 1)?)),

        Rule::Timestamp => build_timestamp(found),
    };

    Some(node)
}

fn mention(kind: MentionKind, raw_id: &str) -> MarkdownNode {
    MarkdownNode::Mention {
        kind,
        target_id: Id::parse(raw_id).ok(),
    }
}

/// `<t:SECONDS[:F]>`: signed Unix seconds; `r`/`R` mean relative (null
/// format code); an unknown format letter yields the invalid node.
fn build_timestamp(found: &Found) -> MarkdownNode {
    let invalid = MarkdownNode::Timestamp {
        instant: None,
        format: None,
    };

    let Some(instant) = group(found, 0)
        .and_then(|raw| raw.parse::<i64>().ok())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    else {
        return invalid;
    };

    let format = match group(found, 1) {
        None => None,
        Some("r") | Some("R") => None,
        Some(f @ ("t" | "T" | "d" | "D" | "f" | "F")) => f.chars().next(),
        Some(_) => return invalid,
    };

    MarkdownNode::Timestamp {
        instant: Some(instant),
        format,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::MarkdownNode as N;

    #[test]
    fn plain_text_is_one_node() {
        assert_eq!(parse("hello world"), vec![N::text("hello world")]);
    }

    #[test]
    fn bold_with_nested_italic() {
        let nodes = parse("**bold *it*** text");
        assert_eq!(
            nodes,
            vec![
                N::Formatting {
                    kind: FormattingKind::Bold,
                    children: vec![
                        N::text("bold "),
                        N::Formatting {
                            kind: FormattingKind::Italic,
                            children: vec![N::text("it")],
                        },
                    ],
                },
                N::text(" text"),
            ]
        );
    }

    #[test]
    fn shrug_stays_literal() {
        assert_eq!(parse(r"¯\_(ツ)_/¯"), vec![N::text(r"¯\_(ツ)_/¯")]);
    }

    #[test]
    fn escaped_symbol_loses_backslash() {
        assert_eq!(parse(r"\*not bold\*"), vec![
            N::text("*"),
            N::text("not bold"),
            N::text("*"),
        ]);
    }

    #[test]
    fn italic_bold_composite() {
        // Outer italic whose children only recognise bold.
        let nodes = parse("***both***");
        assert_eq!(
            nodes,
            vec![N::Formatting {
                kind: FormattingKind::Italic,
                children: vec![N::Formatting {
                    kind: FormattingKind::Bold,
                    children: vec![N::text("both")],
                }],
            }]
        );
    }

    #[test]
    fn list_marker_does_not_read_as_italic() {
        let nodes = parse("* one\n* two");
        assert_eq!(
            nodes,
            vec![N::List {
                items: vec![vec![N::text("one")], vec![N::text("two")]],
            }]
        );
    }

    #[test]
    fn underline_beats_underscore_italic() {
        let nodes = parse("__under__");
        assert_eq!(
            nodes,
            vec![N::Formatting {
                kind: FormattingKind::Underline,
                children: vec![N::text("under")],
            }]
        );
    }

    #[test]
    fn spoiler_and_strikethrough() {
        let nodes = parse("||secret|| and ~~gone~~");
        assert!(matches!(
            &nodes[0],
            N::Formatting { kind: FormattingKind::Spoiler, .. }
        ));
        assert!(matches!(
            &nodes[2],
            N::Formatting { kind: FormattingKind::Strikethrough, .. }
        ));
    }

    #[test]
    fn multi_line_quote_consumes_rest() {
        let nodes = parse(">>> first\nsecond");
        assert_eq!(
            nodes,
            vec![N::Formatting {
                kind: FormattingKind::Quote,
                children: vec![N::text("first\nsecond")],
            }]
        );
    }

    #[test]
    fn line_quotes_strip_markers() {
        let nodes = parse("> one\n> two\nafter");
        assert_eq!(
            nodes,
            vec![
                N::Formatting {
                    kind: FormattingKind::Quote,
                    children: vec![N::text("one\ntwo")],
                },
                N::text("after"),
            ]
        );
    }

    #[test]
    fn heading_levels() {
        let nodes = parse("## Title\nbody");
        assert_eq!(
            nodes,
            vec![
                N::Heading {
                    level: 2,
                    children: vec![N::text("Title")],
                },
                N::text("body"),
            ]
        );
    }

    #[test]
    fn list_items() {
        let nodes = parse("- one\n- two");
        assert_eq!(
            nodes,
            vec![N::List {
                items: vec![vec![N::text("one")], vec![N::text("two")]],
            }]
        );
    }

    #[test]
    fn code_blocks() {
        let nodes = parse("```rust\nfn main() {}\n```");
        assert_eq!(
            nodes,
            vec![N::MultiLineCode {
                language: Some("rust".into()),
                code: "fn main() {}\n".into(),
            }]
        );

        let nodes = parse("use `foo` here");
        assert_eq!(
            nodes,
            vec![
                N::text("use "),
                N::InlineCode { code: "foo".into() },
                N::text(" here"),
            ]
        );
    }

    #[test]
    fn mentions() {
        let nodes = parse("<@123> <#456> <@&789> @everyone");
        assert_eq!(
            nodes[0],
            N::Mention {
                kind: MentionKind::User,
                target_id: Some(Id::new(123)),
            }
        );
        assert_eq!(
            nodes[2],
            N::Mention {
                kind: MentionKind::Channel,
                target_id: Some(Id::new(456)),
            }
        );
        assert_eq!(
            nodes[4],
            N::Mention {
                kind: MentionKind::Role,
                target_id: Some(Id::new(789)),
            }
        );
        assert_eq!(
            nodes[6],
            N::Mention {
                kind: MentionKind::Everyone,
                target_id: None,
            }
        );
    }

    #[test]
    fn links() {
        let nodes = parse("[here](https://example.com) or https://plain.org/x");
        assert_eq!(
            nodes[0],
            N::Link {
                url: "https://example.com".into(),
                children: vec![N::text("here")],
            }
        );
        assert_eq!(
            nodes[2],
            N::Link {
                url: "https://plain.org/x".into(),
                children: vec![N::text("https://plain.org/x")],
            }
        );
    }

    #[test]
    fn custom_and_shortcode_emoji() {
        let nodes = parse("<a:party:42> :fire: :no_such_code:");
        assert_eq!(
            nodes[0],
            N::Emoji(Emoji {
                id: Some(Id::new(42)),
                name: "party".into(),
                is_animated: true,
            })
        );
        assert_eq!(nodes[2], N::Emoji(Emoji::standard("🔥")));
        assert_eq!(nodes[3], N::text(" :no_such_code:"));
    }

    #[test]
    fn timestamps() {
        let nodes = parse("<t:1624396800:D>");
        let N::Timestamp { instant, format } = &nodes[0] else {
            panic!("expected timestamp");
        };
        assert!(instant.is_some());
        assert_eq!(*format, Some('D'));

        let nodes = parse("<t:1624396800:R>");
        assert!(matches!(
            &nodes[0],
            N::Timestamp { instant: Some(_), format: None }
        ));

        let nodes = parse("<t:1624396800:Q>");
        assert!(matches!(&nodes[0], N::Timestamp { instant: None, .. }));
    }

    #[test]
    fn minimal_profile_skips_styling() {
        let nodes = parse_minimal("**bold** <@5>");
        assert_eq!(
            nodes,
            vec![
                N::text("**bold** "),
                N::Mention {
                    kind: MentionKind::User,
                    target_id: Some(Id::new(5)),
                },
            ]
        );
    }

    #[test]
    fn recursion_is_capped() {
        let deep = "*".repeat(200);
        // Must terminate without overflowing the stack.
        let _ = parse(&deep);
    }
}

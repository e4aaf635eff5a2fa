//! Message filter expressions.
//!
//! A small grammar over messages: `from:alice has:image (cat | dog) -bot`.
//! Precedence, low to high: `or`, `and` (implicit between adjacent terms),
//! unary negation, primaries. The empty expression is the null filter and
//! matches everything.

use std::sync::LazyLock;

use regex::Regex;

use chronicle_model::{Message, User};

use crate::error::{ExportError, Result};

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("invalid url regex"));
static INVITE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(discord\.gg/|discord(app)?\.com/invite/)\w+").expect("invalid invite regex")
});

/// The `has:` probe kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Link,
    Embed,
    File,
    Video,
    Image,
    Sound,
    Sticker,
    Invite,
    Mention,
    Pin,
}

impl ContentKind {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "link" | "links" => Some(Self::Link),
            "embed" | "embeds" => Some(Self::Embed),
            "file" | "files" | "attachment" | "attachments" => Some(Self::File),
            "video" | "videos" => Some(Self::Video),
            "image" | "images" => Some(Self::Image),
            "sound" | "sounds" | "audio" => Some(Self::Sound),
            "sticker" | "stickers" => Some(Self::Sticker),
            "invite" | "invites" => Some(Self::Invite),
            "mention" | "mentions" => Some(Self::Mention),
            "pin" | "pins" | "pinned" => Some(Self::Pin),
            _ => None,
        }
    }
}

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageFilter {
    /// Matches everything.
    Null,
    Contains(String),
    From(String),
    Mentions(String),
    Has(ContentKind),
    Reaction(String),
    Not(Box<MessageFilter>),
    And(Box<MessageFilter>, Box<MessageFilter>),
    Or(Box<MessageFilter>, Box<MessageFilter>),
}

impl MessageFilter {
    /// Parse an expression; the empty string yields the null filter.
    pub fn parse(input: &str) -> Result<Self> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Ok(Self::Null);
        }
        let mut parser = Parser { tokens, pos: 0 };
        let filter = parser.parse_or()?;
        if parser.pos != parser.tokens.len() {
            return Err(ExportError::Filter(format!(
                "unexpected trailing input in {input:?}"
            )));
        }
        Ok(filter)
    }

    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::Null, f) | (f, Self::Null) => f,
            (a, b) => Self::And(Box::new(a), Box::new(b)),
        }
    }

    pub fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::Null, _) | (_, Self::Null) => Self::Null,
            (a, b) => Self::Or(Box::new(a), Box::new(b)),
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Self::Not(inner) => *inner,
            f => Self::Not(Box::new(f)),
        }
    }

    pub fn matches(&self, message: &Message) -> bool {
        match self {
            Self::Null => true,
            Self::Contains(text) => ci_contains(&message.content, text),
            Self::From(value) => user_matches(&message.author, value),
            Self::Mentions(value) => message
                .mentioned_users
                .iter()
                .any(|user| user_matches(user, value)),
            Self::Has(kind) => has_content(message, *kind),
            Self::Reaction(value) => message.reactions.iter().any(|reaction| {
                reaction.emoji.code().eq_ignore_ascii_case(value)
                    || reaction.emoji.name.eq_ignore_ascii_case(value)
                    || reaction.emoji.name == *value
            }),
            Self::Not(inner) => !inner.matches(message),
            Self::And(a, b) => a.matches(message) && b.matches(message),
            Self::Or(a, b) => a.matches(message) || b.matches(message),
        }
    }
}

fn ci_contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn user_matches(user: &User, value: &str) -> bool {
    user.id.to_string() == value
        || user.name.eq_ignore_ascii_case(value)
        || user.full_name().eq_ignore_ascii_case(value)
}

fn has_content(message: &Message, kind: ContentKind) -> bool {
    match kind {
        ContentKind::Link => {
            URL_RE.is_match(&message.content)
                || message.embeds.iter().any(|e| e.url.is_some())
        }
        ContentKind::Embed => !message.embeds.is_empty(),
        ContentKind::File => !message.attachments.is_empty(),
        ContentKind::Video => message.attachments.iter().any(|a| a.is_video()),
        ContentKind::Image => {
            message.attachments.iter().any(|a| a.is_image())
                || message
                    .embeds
                    .iter()
                    .any(|e| e.image.is_some() || e.thumbnail.is_some())
        }
        ContentKind::Sound => message.attachments.iter().any(|a| a.is_audio()),
        ContentKind::Sticker => !message.stickers.is_empty(),
        ContentKind::Invite => INVITE_RE.is_match(&message.content),
        ContentKind::Mention => !message.mentioned_users.is_empty(),
        ContentKind::Pin => message.is_pinned,
    }
}

// ---- lexer ----

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Quoted(String),
    Colon,
    LParen,
    RParen,
    Dash,
    AndOp,
    OrOp,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            ':' => {
                chars.next();
                tokens.push(Token::Colon);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Dash);
            }
            '&' => {
                chars.next();
                chars.next_if_eq(&'&');
                tokens.push(Token::AndOp);
            }
            '|' => {
                chars.next();
                chars.next_if_eq(&'|');
                tokens.push(Token::OrOp);
            }
            '"' => {
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(c) => value.push(c),
                        None => {
                            return Err(ExportError::Filter(format!(
                                "unterminated quote in {input:?}"
                            )))
                        }
                    }
                }
                tokens.push(Token::Quoted(value));
            }
            _ => {
                let mut value = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || matches!(c, ':' | '(' | ')' | '"' | '&' | '|') {
                        break;
                    }
                    value.push(c);
                    chars.next();
                }
                tokens.push(Token::Ident(value));
            }
        }
    }

    Ok(tokens)
}

// ---- parser ----

const OPERATORS: &[&str] = &["contains", "from", "mentions", "has", "reaction"];

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Ident(w)) if w.eq_ignore_ascii_case(keyword)) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn parse_or(&mut self) -> Result<MessageFilter> {
        let mut left = self.parse_and()?;
        loop {
            let is_or = matches!(self.peek(), Some(Token::OrOp)) || self.peek_keyword("or");
            if !is_or {
                break;
            }
            if !self.eat_keyword("or") {
                self.pos += 1;
            }
            let right = self.parse_and()?;
            left = MessageFilter::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<MessageFilter> {
        let mut left = self.parse_unary()?;
        loop {
            if matches!(self.peek(), Some(Token::AndOp)) {
                self.pos += 1;
            } else if self.peek_keyword("and") {
                self.pos += 1;
            } else if !self.starts_term() {
                break;
            }
            // Implicit AND between adjacent terms.
            let right = self.parse_unary()?;
            left = MessageFilter::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(w)) if w.eq_ignore_ascii_case(keyword))
    }

    /// Whether the upcoming token can begin a primary (and is not an `or`
    /// keyword, which belongs to the caller).
    fn starts_term(&self) -> bool {
        match self.peek() {
            Some(Token::Ident(w)) => !w.eq_ignore_ascii_case("or"),
            Some(Token::Quoted(_) | Token::LParen | Token::Dash) => true,
            _ => false,
        }
    }

    fn parse_unary(&mut self) -> Result<MessageFilter> {
        if matches!(self.peek(), Some(Token::Dash)) || self.peek_keyword("not") {
            self.pos += 1;
            return Ok(MessageFilter::Not(Box::new(self.parse_primary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<MessageFilter> {
        match self.next() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(ExportError::Filter("missing closing paren".into())),
                }
            }
            Some(Token::Quoted(text)) => Ok(MessageFilter::Contains(text)),
            Some(Token::Ident(word)) => {
                if matches!(self.peek(), Some(Token::Colon)) {
                    self.pos += 1;
                    let value = match self.next() {
                        Some(Token::Ident(v)) | Some(Token::Quoted(v)) => v,
                        _ => {
                            return Err(ExportError::Filter(format!(
                                "operator {word:?} is missing a value"
                            )))
                        }
                    };
                    return self.build_operator(&word, value);
                }
                Ok(MessageFilter::Contains(word))
            }
            other => Err(ExportError::Filter(format!("unexpected token {other:?}"))),
        }
    }

    fn build_operator(&self, word: &str, value: String) -> Result<MessageFilter> {
        if !OPERATORS.contains(&word.to_ascii_lowercase().as_str()) {
            // Unknown key: treat the whole lexeme as a contains-primary.
            return Ok(MessageFilter::Contains(format!("{word}:{value}")));
        }
        match word.to_ascii_lowercase().as_str() {
            "contains" => Ok(MessageFilter::Contains(value)),
            "from" => Ok(MessageFilter::From(value)),
            "mentions" => Ok(MessageFilter::Mentions(value)),
            "reaction" => Ok(MessageFilter::Reaction(value)),
            "has" => ContentKind::parse(&value)
                .map(MessageFilter::Has)
                .ok_or_else(|| ExportError::Filter(format!("unknown content kind {value:?}"))),
            _ => unreachable!("operator list is exhaustive"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(value: serde_json::Value) -> Message {
        Message::parse(value).unwrap()
    }

    fn from_john_with_attachment() -> Message {
        message(json!({
            "id": "1",
            "type": 0,
            "author": {"id": "11", "username": "John"},
            "timestamp": "2021-06-01T10:00:00+00:00",
            "content": "see attached",
            "attachments": [
                {"id": "2", "url": "https://cdn/x.png", "filename": "x.png", "size": 10}
            ]
        }))
    }

    #[test]
    fn empty_expression_matches_everything() {
        let filter = MessageFilter::parse("").unwrap();
        assert_eq!(filter, MessageFilter::Null);
        assert!(filter.matches(&from_john_with_attachment()));
    }

    #[test]
    fn from_and_has_scenario() {
        let filter = MessageFilter::parse("from:john has:attachment").unwrap();
        assert!(filter.matches(&from_john_with_attachment()));

        let without_attachment = message(json!({
            "id": "1",
            "type": 0,
            "author": {"id": "11", "username": "John"},
            "timestamp": "2021-06-01T10:00:00+00:00",
            "content": "nothing attached"
        }));
        assert!(!filter.matches(&without_attachment));
    }

    #[test]
    fn implicit_and_explicit_operators_agree() {
        let implicit = MessageFilter::parse("cat dog").unwrap();
        let explicit = MessageFilter::parse("cat and dog").unwrap();
        let symbolic = MessageFilter::parse("cat && dog").unwrap();
        assert_eq!(implicit, explicit);
        assert_eq!(explicit, symbolic);
    }

    #[test]
    fn precedence_or_lower_than_and() {
        let filter = MessageFilter::parse("a b or c").unwrap();
        // (a AND b) OR c
        assert_eq!(
            filter,
            MessageFilter::Or(
                Box::new(MessageFilter::And(
                    Box::new(MessageFilter::Contains("a".into())),
                    Box::new(MessageFilter::Contains("b".into())),
                )),
                Box::new(MessageFilter::Contains("c".into())),
            )
        );
    }

    #[test]
    fn negation_and_parens() {
        let filter = MessageFilter::parse("-(from:john or from:jane)").unwrap();
        let by_john = from_john_with_attachment();
        assert!(!filter.matches(&by_john));

        let by_alice = message(json!({
            "id": "1",
            "type": 0,
            "author": {"id": "12", "username": "alice"},
            "timestamp": "2021-06-01T10:00:00+00:00",
            "content": "hello"
        }));
        assert!(filter.matches(&by_alice));
    }

    #[test]
    fn quoted_contains_keeps_spaces() {
        let filter = MessageFilter::parse(r#""hello world""#).unwrap();
        assert_eq!(filter, MessageFilter::Contains("hello world".into()));
    }

    #[test]
    fn has_kinds() {
        let msg = message(json!({
            "id": "1",
            "type": 0,
            "author": {"id": "11", "username": "j"},
            "timestamp": "2021-06-01T10:00:00+00:00",
            "content": "join https://discord.gg/abc123",
            "pinned": true
        }));
        assert!(MessageFilter::parse("has:link").unwrap().matches(&msg));
        assert!(MessageFilter::parse("has:invite").unwrap().matches(&msg));
        assert!(MessageFilter::parse("has:pin").unwrap().matches(&msg));
        assert!(!MessageFilter::parse("has:image").unwrap().matches(&msg));
        assert!(MessageFilter::parse("has:nonsense").is_err());
    }

    #[test]
    fn reaction_matching() {
        let msg = message(json!({
            "id": "1",
            "type": 0,
            "author": {"id": "11", "username": "j"},
            "timestamp": "2021-06-01T10:00:00+00:00",
            "content": "",
            "reactions": [{"emoji": {"id": null, "name": "🔥"}, "count": 2}]
        }));
        assert!(MessageFilter::parse("reaction:🔥").unwrap().matches(&msg));
        assert!(!MessageFilter::parse("reaction:💧").unwrap().matches(&msg));
    }

    #[test]
    fn combinator_laws() {
        let f = MessageFilter::Contains("x".into());

        assert_eq!(f.clone().and(MessageFilter::Null), f);
        assert_eq!(MessageFilter::Null.and(f.clone()), f);
        assert_eq!(f.clone().or(MessageFilter::Null), MessageFilter::Null);
        assert_eq!(f.clone().negate().negate(), f);
    }

    #[test]
    fn unknown_operator_becomes_contains() {
        let filter = MessageFilter::parse("foo:bar").unwrap();
        assert_eq!(filter, MessageFilter::Contains("foo:bar".into()));
    }
}

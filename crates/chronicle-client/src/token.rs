use serde::{Deserialize, Serialize};

/// Whether the token belongs to a regular user account or a bot application.
///
/// The distinction decides the `Authorization` header shape and which half of
/// the rate-limit preference applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    User,
    Bot,
}

/// An authentication token with its resolved kind.
#[derive(Debug, Clone)]
pub struct Token {
    value: String,
    kind: TokenKind,
}

impl Token {
    pub fn new(value: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// The `Authorization` header value: bot tokens carry a `Bot ` prefix.
    pub fn header_value(&self) -> String {
        match self.kind {
            TokenKind::User => self.value.clone(),
            TokenKind::Bot => format!("Bot {}", self.value),
        }
    }
}

/// User preference controlling when advertised rate limits are respected.
///
/// Two independent bits: respect-for-user and respect-for-bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RateLimitPreference {
    #[default]
    RespectAll,
    RespectForUser,
    RespectForBot,
    IgnoreAll,
}

impl RateLimitPreference {
    pub fn is_respected_for(self, kind: TokenKind) -> bool {
        match self {
            Self::RespectAll => true,
            Self::RespectForUser => kind == TokenKind::User,
            Self::RespectForBot => kind == TokenKind::Bot,
            Self::IgnoreAll => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bot_tokens_are_prefixed() {
        assert_eq!(Token::new("abc", TokenKind::Bot).header_value(), "Bot abc");
        assert_eq!(Token::new("abc", TokenKind::User).header_value(), "abc");
    }

    #[test]
    fn preference_bits() {
        use RateLimitPreference::*;
        assert!(RespectAll.is_respected_for(TokenKind::User));
        assert!(RespectAll.is_respected_for(TokenKind::Bot));
        assert!(RespectForUser.is_respected_for(TokenKind::User));
        assert!(!RespectForUser.is_respected_for(TokenKind::Bot));
        assert!(!RespectForBot.is_respected_for(TokenKind::User));
        assert!(RespectForBot.is_respected_for(TokenKind::Bot));
        assert!(!IgnoreAll.is_respected_for(TokenKind::User));
        assert!(!IgnoreAll.is_respected_for(TokenKind::Bot));
    }
}

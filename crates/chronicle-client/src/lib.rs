//! Rate-limited, paginated client for the upstream chat API.

pub mod client;
pub mod error;
pub mod rate_limit;
pub mod retry;
pub mod token;

pub use client::{ApiClient, Application, Invite, ProgressFn};
pub use error::{ClientError, Result};
pub use rate_limit::RateBudget;
pub use token::{RateLimitPreference, Token, TokenKind};

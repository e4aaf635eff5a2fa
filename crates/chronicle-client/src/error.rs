use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error(
        "The bot token lacks the message content intent; \
         enable it in the application settings"
    )]
    MissingContentIntent,

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request to {path} failed with status {status}")]
    Status {
        status: reqwest::StatusCode,
        path: String,
    },

    #[error("Malformed response payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Model(#[from] chronicle_model::ModelError),
}

impl ClientError {
    /// Whether the error should abort the whole export rather than a single
    /// lookup. Non-fatal statuses (403/404) are converted to `None` by the
    /// `try_*` endpoints before they ever become errors.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::Status { status, .. }
                if *status == reqwest::StatusCode::FORBIDDEN
                    || *status == reqwest::StatusCode::NOT_FOUND
        )
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

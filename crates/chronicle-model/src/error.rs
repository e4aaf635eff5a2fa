use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid id: {0:?}")]
    InvalidId(String),

    #[error("Invalid timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;

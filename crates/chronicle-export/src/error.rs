use thiserror::Error;

use chronicle_client::ClientError;
use chronicle_model::{Id, ModelError};

#[derive(Error, Debug)]
pub enum ExportError {
    /// The channel is empty or holds no messages in the requested range.
    /// Non-fatal: an empty file with preamble and postamble is still written.
    #[error("Channel {0:?} contains no messages in the requested range")]
    ChannelEmpty(String),

    #[error("Forum channels have no message log of their own; export their threads instead")]
    UnsupportedChannel,

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Invalid filter expression: {0}")]
    Filter(String),

    #[error("Invalid partition limit: {0:?}")]
    PartitionLimit(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export cancelled")]
    Cancelled,

    /// Wraps any failure raised while writing one message, preserving the
    /// guild/channel/message coordinates and the source chain.
    #[error("Failed to write message {message_id} of {guild:?} / {channel:?}")]
    WriteMessage {
        guild: String,
        channel: String,
        message_id: Id,
        #[source]
        source: Box<ExportError>,
    },
}

impl ExportError {
    /// `true` means abort the whole job; `false` means skip this channel.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::ChannelEmpty(_) => false,
            Self::Client(err) => err.is_fatal(),
            Self::WriteMessage { source, .. } => source.is_fatal(),
            Self::Cancelled => false,
            _ => true,
        }
    }

    pub(crate) fn wrap_write(
        self,
        guild: &str,
        channel: &str,
        message_id: Id,
    ) -> Self {
        Self::WriteMessage {
            guild: guild.to_string(),
            channel: channel.to_string(),
            message_id,
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatality_classification() {
        assert!(!ExportError::ChannelEmpty("x".into()).is_fatal());
        assert!(ExportError::UnsupportedChannel.is_fatal());
        assert!(ExportError::Filter("bad".into()).is_fatal());
    }

    #[test]
    fn write_wrap_preserves_fatality_and_cause() {
        let inner = ExportError::ChannelEmpty("general".into());
        let wrapped = inner.wrap_write("My Guild", "general", Id::new(42));
        assert!(!wrapped.is_fatal());
        assert!(std::error::Error::source(&wrapped).is_some());

        let fatal = ExportError::UnsupportedChannel.wrap_write("g", "c", Id::new(1));
        assert!(fatal.is_fatal());
    }
}

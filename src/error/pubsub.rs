use thiserror::Error;

/// Ошибки подсистемы Pub/Sub.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PubSubError {
    #[error("channel name must be a non-empty string")]
    InvalidChannelName,

    #[error("channel '{0}' already exists")]
    ChannelAlreadyExists(String),

    #[error("listener id '{id}' already exists on channel '{channel}'")]
    ListenerAlreadyExists { id: String, channel: String },

    #[error("payload serialization error: {0}")]
    Serialization(String),
}

/// Результат операций Pub/Sub.
pub type PubSubResult<T> = Result<T, PubSubError>;

// === Преобразования ===

impl From<serde_json::Error> for PubSubError {
    fn from(err: serde_json::Error) -> Self {
        PubSubError::Serialization(err.to_string())
    }
}

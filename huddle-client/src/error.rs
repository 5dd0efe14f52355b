use thiserror::Error;

/// Ошибки машины согласования одной пары участников.
#[derive(Debug, Error)]
pub enum NegotiationError {
    /// Сообщение пришло в состоянии, которое не может его обработать.
    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("media session error: {0}")]
    Media(#[from] anyhow::Error),

    #[error("session is closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("local media capture failed: {0}")]
    Capture(#[source] anyhow::Error),

    #[error("signaling transport error: {0}")]
    Signaling(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("signaling channel closed")]
    Disconnected,
}

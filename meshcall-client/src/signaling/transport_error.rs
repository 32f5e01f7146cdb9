use thiserror::Error;

/// Ошибки relay-транспорта (сигнального или чата).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Relay is not connected")]
    NotConnected,

    #[error("Relay socket is closed")]
    Closed,

    #[error("Failed to serialize relay message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

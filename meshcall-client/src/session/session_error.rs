use crate::media::MediaError;
use crate::signaling::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid session config: {0}")]
    InvalidConfig(String),

    #[error("Failed to acquire local media: {0}")]
    Media(#[from] MediaError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

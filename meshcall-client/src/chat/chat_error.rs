use crate::signaling::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Chat is not connected")]
    NotConnected,

    #[error("Message is empty")]
    EmptyMessage,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

use thiserror::Error;

/// Ошибки захвата медиа. Пользователь видит их и может повторить попытку.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MediaError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("No capture device: {0}")]
    NoDevice(String),

    #[error("Media capture failed: {0}")]
    Other(String),
}

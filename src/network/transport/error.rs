// src/network/transport/error.rs
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Transport unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown key handle: {0}")]
    UnknownKey(String),

    #[error("Unknown message filter: {0}")]
    UnknownFilter(String),

    #[error("Invalid topic: {0}")]
    InvalidTopic(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;

// src/core/session/error.rs
use thiserror::Error;

use crate::core::messages::MessageError;
use crate::network::transport::TransportError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Message error: {0}")]
    Message(#[from] MessageError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

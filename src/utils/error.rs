// src/utils/error.rs
use thiserror::Error;

use crate::blockchain::RegistryError;
use crate::core::crypto::CryptoError;
use crate::core::entities::EntityError;
use crate::network::listener::ListenerError;
use crate::network::transport::TransportError;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid identifier: {0}")]
    Entity(#[from] EntityError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Listener error: {0}")]
    Listener(#[from] ListenerError),

    #[error("Logging error: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, NodeError>;

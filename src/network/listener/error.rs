// src/network/listener/error.rs
use thiserror::Error;

use crate::blockchain::RegistryError;
use crate::core::crypto::CryptoError;
use crate::network::transport::TransportError;

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("Listener already started")]
    AlreadyStarted,

    #[error("Listener has been disposed")]
    Disposed,

    #[error("Subscribers must be registered before the listener starts")]
    SubscribeWhileListening,

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Key exchange failed: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Session created subscriber failed: {0}")]
    Subscriber(#[source] anyhow::Error),

    #[error("Operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, ListenerError>;

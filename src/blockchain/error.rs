// src/blockchain/error.rs
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("VASP not found in registry: {0}")]
    NotFound(String),

    #[error("Registry unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid registry entry: {0}")]
    InvalidEntry(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

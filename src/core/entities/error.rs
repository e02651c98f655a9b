// src/core/entities/error.rs
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntityError {
    #[error("Invalid VASP code '{0}': expected 8 hexadecimal characters")]
    InvalidVaspCode(String),

    #[error("Invalid customer number '{0}': expected non-empty, even-length hexadecimal")]
    InvalidCustomerNumber(String),

    #[error("Invalid VAAN '{0}': {1}")]
    InvalidVaan(String, String),
}

pub type Result<T> = std::result::Result<T, EntityError>;

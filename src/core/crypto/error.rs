// src/core/crypto/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;

/// Decodes hex with or without a `0x` prefix.
pub(crate) fn decode_hex(value: &str) -> Result<Vec<u8>> {
    let trimmed = value.trim();
    let stripped = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    hex::decode(stripped).map_err(|e| CryptoError::InvalidHex(e.to_string()))
}

pub(crate) fn encode_hex(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

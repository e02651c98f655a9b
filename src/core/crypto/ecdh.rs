// src/core/crypto/ecdh.rs
use std::fmt;

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{ecdh, PublicKey, SecretKey};
use rand::rngs::OsRng;

use super::error::{decode_hex, encode_hex, CryptoError, Result};

/// secp256k1 key used for the session handshake key exchange.
#[derive(Clone)]
pub struct EcdhKey {
    secret: SecretKey,
}

impl EcdhKey {
    pub fn generate() -> Self {
        Self {
            secret: SecretKey::random(&mut OsRng),
        }
    }

    pub fn from_private_key_hex(private_key: &str) -> Result<Self> {
        let bytes = decode_hex(private_key)?;
        let secret = SecretKey::from_slice(&bytes)
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self { secret })
    }

    pub fn private_key_hex(&self) -> String {
        encode_hex(self.secret.to_bytes())
    }

    /// Uncompressed SEC1 public key, `0x04...`.
    pub fn public_key_hex(&self) -> String {
        encode_hex(self.secret.public_key().to_encoded_point(false).as_bytes())
    }

    /// Combines the local private key with the peer's public key.
    pub fn generate_shared_secret_hex(&self, peer_public_key: &str) -> Result<String> {
        let peer = parse_public_key(peer_public_key)?;
        let shared = ecdh::diffie_hellman(self.secret.to_nonzero_scalar(), peer.as_affine());
        Ok(encode_hex(shared.raw_secret_bytes()))
    }
}

impl fmt::Debug for EcdhKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcdhKey")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

pub(crate) fn parse_public_key(public_key: &str) -> Result<PublicKey> {
    let bytes = decode_hex(public_key)?;
    PublicKey::from_sec1_bytes(&bytes).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
}

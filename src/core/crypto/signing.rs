// src/core/crypto/signing.rs
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use sha3::{Digest, Keccak256};

use super::error::{decode_hex, encode_hex, CryptoError, Result};

/// Signs outgoing payloads and verifies incoming ones.
pub trait SignService: Send + Sync {
    fn sign_payload(&self, payload: &str, private_key: &str) -> Result<String>;

    /// Returns `false` for any signature that does not check out, including
    /// malformed signatures or keys.
    fn verify_sign(&self, payload: &str, signature: &str, public_key: &str) -> bool;
}

/// secp256k1 ECDSA over the Keccak-256 digest of the payload. Signatures are
/// `r || s || v` (65 bytes) in hex.
#[derive(Debug, Clone, Default)]
pub struct EcdsaSignService;

impl EcdsaSignService {
    pub fn new() -> Self {
        Self
    }
}

impl SignService for EcdsaSignService {
    fn sign_payload(&self, payload: &str, private_key: &str) -> Result<String> {
        let key = signing_key(private_key)?;
        let digest = Keccak256::digest(payload.as_bytes());

        let (signature, recovery_id) = key
            .sign_prehash_recoverable(&digest)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(recovery_id.to_byte() + 27);
        Ok(encode_hex(bytes))
    }

    fn verify_sign(&self, payload: &str, signature: &str, public_key: &str) -> bool {
        let Ok(key_bytes) = decode_hex(public_key) else {
            return false;
        };
        let Ok(verifying_key) = VerifyingKey::from_sec1_bytes(&key_bytes) else {
            return false;
        };
        let Ok(signature_bytes) = decode_hex(signature) else {
            return false;
        };
        if signature_bytes.len() != 64 && signature_bytes.len() != 65 {
            return false;
        }
        let Ok(signature) = Signature::from_slice(&signature_bytes[..64]) else {
            return false;
        };

        let digest = Keccak256::digest(payload.as_bytes());
        verifying_key.verify_prehash(&digest, &signature).is_ok()
    }
}

/// Public key matching a signing private key, uncompressed SEC1 hex.
pub fn signing_public_key(private_key: &str) -> Result<String> {
    let key = signing_key(private_key)?;
    Ok(encode_hex(key.verifying_key().to_encoded_point(false).as_bytes()))
}

fn signing_key(private_key: &str) -> Result<SigningKey> {
    let bytes = decode_hex(private_key)?;
    SigningKey::from_slice(&bytes).map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::crypto::EcdhKey;

    fn key_pair() -> (String, String) {
        let key = EcdhKey::generate();
        let private = key.private_key_hex();
        let public = signing_public_key(&private).unwrap();
        (private, public)
    }

    #[test]
    fn signature_verifies_against_signer_key() {
        let service = EcdsaSignService::new();
        let (private, public) = key_pair();

        let signature = service.sign_payload("{\"hello\":1}", &private).unwrap();
        assert_eq!(signature.len(), 2 + 130);
        assert!(service.verify_sign("{\"hello\":1}", &signature, &public));
    }

    #[test]
    fn tampered_payload_or_wrong_key_fails() {
        let service = EcdsaSignService::new();
        let (private, public) = key_pair();
        let (_, other_public) = key_pair();

        let signature = service.sign_payload("payload", &private).unwrap();
        assert!(!service.verify_sign("payload!", &signature, &public));
        assert!(!service.verify_sign("payload", &signature, &other_public));
    }

    #[test]
    fn malformed_inputs_do_not_verify() {
        let service = EcdsaSignService::new();
        let (private, public) = key_pair();
        let signature = service.sign_payload("payload", &private).unwrap();

        assert!(!service.verify_sign("payload", "0xdeadbeef", &public));
        assert!(!service.verify_sign("payload", &signature, "0x04"));
        assert!(!service.verify_sign("payload", "zz", "zz"));
    }
}

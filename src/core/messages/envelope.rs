// src/core/messages/envelope.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Message;
use crate::core::crypto::{CryptoError, SignService};

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Signing error: {0}")]
    Signing(#[from] CryptoError),
}

/// A received or outgoing protocol message: the exact payload that was signed,
/// its signature, and the decoded body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub payload: String,
    pub signature: String,
    pub message: Message,
}

impl MessageEnvelope {
    /// Serializes `message` and signs the payload with `private_key`.
    pub fn seal(
        message: impl Into<Message>,
        private_key: &str,
        sign_service: &dyn SignService,
    ) -> Result<Self, MessageError> {
        let message = message.into();
        let payload = serde_json::to_string(&message)?;
        let signature = sign_service.sign_payload(&payload, private_key)?;

        Ok(Self {
            payload,
            signature,
            message,
        })
    }

    /// Decodes a payload received from the wire.
    pub fn from_parts(
        payload: impl Into<String>,
        signature: impl Into<String>,
    ) -> Result<Self, MessageError> {
        let payload = payload.into();
        let message = serde_json::from_str(&payload)?;

        Ok(Self {
            payload,
            signature: signature.into(),
            message,
        })
    }

    pub fn verify(&self, public_key: &str, sign_service: &dyn SignService) -> bool {
        sign_service.verify_sign(&self.payload, &self.signature, public_key)
    }
}

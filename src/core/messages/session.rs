// src/core/messages/session.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MessageHeader;
use crate::core::entities::VaspInformation;

/// Originator half of the handshake: where to reply and the originator's
/// ECDH public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandShakeRequest {
    pub topic_a: String,
    pub ecdh_pub_key: String,
}

impl HandShakeRequest {
    pub fn new(topic_a: impl Into<String>, ecdh_pub_key: impl Into<String>) -> Self {
        Self {
            topic_a: topic_a.into(),
            ecdh_pub_key: ecdh_pub_key.into(),
        }
    }
}

/// Beneficiary half of the handshake: the session topic it listens on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandShakeResponse {
    pub topic_b: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequestMessage {
    pub header: MessageHeader,
    pub handshake: HandShakeRequest,
    pub vasp: VaspInformation,
}

impl SessionRequestMessage {
    pub const MESSAGE_CODE: &'static str = "session_request";

    pub fn create(
        session_id: impl Into<String>,
        handshake: HandShakeRequest,
        vasp: VaspInformation,
    ) -> Self {
        Self {
            header: MessageHeader::new(session_id, Self::MESSAGE_CODE),
            handshake,
            vasp,
        }
    }

    /// Starts a brand new session with a random identifier.
    pub fn initiate(handshake: HandShakeRequest, vasp: VaspInformation) -> Self {
        Self::create(Uuid::new_v4().simple().to_string(), handshake, vasp)
    }

    pub fn session_id(&self) -> &str {
        &self.header.session_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionReplyCode {
    SessionAccepted,
    SessionDeclinedRequestNotValid,
    SessionDeclinedOriginatorVaspCouldNotBeAuthenticated,
    SessionDeclinedOriginatorVaspDeclined,
    SessionDeclinedTemporaryDisruption,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReplyMessage {
    pub header: MessageHeader,
    pub handshake: HandShakeResponse,
    pub vasp: VaspInformation,
    pub code: SessionReplyCode,
}

impl SessionReplyMessage {
    pub const MESSAGE_CODE: &'static str = "session_reply";

    pub fn create(
        session_id: impl Into<String>,
        topic_b: impl Into<String>,
        vasp: VaspInformation,
        code: SessionReplyCode,
    ) -> Self {
        Self {
            header: MessageHeader::new(session_id, Self::MESSAGE_CODE),
            handshake: HandShakeResponse {
                topic_b: topic_b.into(),
            },
            vasp,
            code,
        }
    }
}

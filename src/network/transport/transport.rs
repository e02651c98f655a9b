// src/network/transport/transport.rs
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::Result;
use crate::core::messages::MessageEnvelope;

/// Key registered with the transport. Filters decrypt with either an
/// asymmetric key pair or a symmetric key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyHandle {
    Asymmetric(String),
    Symmetric(String),
}

impl KeyHandle {
    pub fn id(&self) -> &str {
        match self {
            KeyHandle::Asymmetric(id) | KeyHandle::Symmetric(id) => id,
        }
    }
}

impl fmt::Display for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyHandle::Asymmetric(id) => write!(f, "asym:{}", id),
            KeyHandle::Symmetric(id) => write!(f, "sym:{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterHandle(pub String);

impl fmt::Display for FilterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pub/sub message bus the VASPs talk over.
///
/// `get_session_messages` must return promptly, possibly with an empty list;
/// any per-call timeout is the implementation's concern.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn register_key_pair(&self, private_key: &str) -> Result<KeyHandle>;

    async fn register_sym_key(&self, secret: &str) -> Result<KeyHandle>;

    async fn create_message_filter(&self, topic: &str, key: &KeyHandle) -> Result<FilterHandle>;

    async fn get_session_messages(&self, filter: &FilterHandle) -> Result<Vec<MessageEnvelope>>;

    async fn publish(&self, topic: &str, envelope: MessageEnvelope) -> Result<()>;
}

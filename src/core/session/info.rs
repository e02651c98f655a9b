// src/core/session/info.rs
use std::fmt;

use crate::network::transport::{FilterHandle, KeyHandle};

/// Everything a beneficiary session needs after a completed handshake.
#[derive(Clone)]
pub struct BeneficiarySessionInfo {
    pub id: String,
    pub private_signing_key: String,
    pub shared_encryption_key: String,
    pub counterparty_public_signing_key: String,
    pub topic: String,
    pub counterparty_topic: String,
    pub message_filter: FilterHandle,
    pub sym_key: KeyHandle,
}

impl fmt::Debug for BeneficiarySessionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeneficiarySessionInfo")
            .field("id", &self.id)
            .field("counterparty_public_signing_key", &self.counterparty_public_signing_key)
            .field("topic", &self.topic)
            .field("counterparty_topic", &self.counterparty_topic)
            .field("message_filter", &self.message_filter)
            .field("sym_key", &self.sym_key)
            .finish_non_exhaustive()
    }
}

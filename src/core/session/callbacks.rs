// src/core/session/callbacks.rs
use async_trait::async_trait;

use crate::core::messages::{TransferDispatchMessage, TransferRequestMessage};

/// Business decisions the beneficiary VASP makes during a session.
#[async_trait]
pub trait BeneficiaryCallbacks: Send + Sync {
    async fn transfer_request_received(
        &self,
        session_id: &str,
        request: &TransferRequestMessage,
    ) -> anyhow::Result<()>;

    async fn transfer_dispatch_received(
        &self,
        session_id: &str,
        dispatch: &TransferDispatchMessage,
    ) -> anyhow::Result<()>;

    async fn session_terminated(&self, _session_id: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

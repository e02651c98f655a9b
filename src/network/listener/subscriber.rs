// src/network/listener/subscriber.rs
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::messages::SessionRequestMessage;
use crate::core::session::BeneficiarySession;

/// Notified once per completed handshake with the new session and the request
/// that opened it.
#[async_trait]
pub trait SessionCreatedHandler: Send + Sync {
    async fn session_created(
        &self,
        session: Arc<BeneficiarySession>,
        request: SessionRequestMessage,
    ) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> SessionCreatedHandler for F
where
    F: Fn(Arc<BeneficiarySession>, SessionRequestMessage) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn session_created(
        &self,
        session: Arc<BeneficiarySession>,
        request: SessionRequestMessage,
    ) -> anyhow::Result<()> {
        (self)(session, request).await
    }
}

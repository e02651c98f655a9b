// src/core/session/beneficiary.rs
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::callbacks::BeneficiaryCallbacks;
use super::error::Result;
use super::info::BeneficiarySessionInfo;
use crate::core::crypto::SignService;
use crate::core::entities::VaspInformation;
use crate::core::messages::{
    Message, MessageEnvelope, MessageKind, SessionReplyCode, SessionReplyMessage,
};
use crate::network::dispatch::{FailurePolicy, HandlerRegistry, MessageDispatchQueue, MessageHandler};
use crate::network::transport::Transport;

/// Beneficiary side of an established session.
///
/// Incoming messages are authenticated against the originator's signing key
/// and then routed through a private dispatch queue to the
/// [`BeneficiaryCallbacks`].
pub struct BeneficiarySession {
    info: BeneficiarySessionInfo,
    transport: Arc<dyn Transport>,
    sign_service: Arc<dyn SignService>,
    queue: MessageDispatchQueue,
    terminated: AtomicBool,
    created_at: DateTime<Utc>,
}

impl BeneficiarySession {
    pub fn new(
        info: BeneficiarySessionInfo,
        callbacks: Arc<dyn BeneficiaryCallbacks>,
        transport: Arc<dyn Transport>,
        sign_service: Arc<dyn SignService>,
    ) -> Self {
        Self::with_failure_policy(info, callbacks, transport, sign_service, FailurePolicy::default())
    }

    pub fn with_failure_policy(
        info: BeneficiarySessionInfo,
        callbacks: Arc<dyn BeneficiaryCallbacks>,
        transport: Arc<dyn Transport>,
        sign_service: Arc<dyn SignService>,
        policy: FailurePolicy,
    ) -> Self {
        let router = CallbackRouter {
            session_id: info.id.clone(),
            callbacks,
        };
        let registry = HandlerRegistry::builder()
            .add_handler(MessageKind::TransferRequest, router.clone())
            .add_handler(MessageKind::TransferDispatch, router.clone())
            .add_handler(MessageKind::Termination, router)
            .build();
        let queue = MessageDispatchQueue::with_policy(registry, &CancellationToken::new(), policy);

        info!(session_id = %info.id, topic = %info.topic, counterparty_topic = %info.counterparty_topic, "Beneficiary session created");

        Self {
            info,
            transport,
            sign_service,
            queue,
            terminated: AtomicBool::new(false),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn info(&self) -> &BeneficiarySessionInfo {
        &self.info
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// True once an authenticated termination from the originator has been
    /// accepted.
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Answers the originator's session request on its reply topic, announcing
    /// this session's topic.
    pub async fn send_session_reply(&self, vasp: VaspInformation, code: SessionReplyCode) -> Result<()> {
        let reply = SessionReplyMessage::create(&self.info.id, &self.info.topic, vasp, code);
        self.send(reply).await?;
        info!(session_id = %self.info.id, ?code, "Session reply sent");
        Ok(())
    }

    /// Signs `message` with the local signing key and publishes it to the
    /// originator.
    pub async fn send(&self, message: impl Into<Message>) -> Result<()> {
        let envelope = MessageEnvelope::seal(
            message,
            &self.info.private_signing_key,
            self.sign_service.as_ref(),
        )?;
        self.transport
            .publish(&self.info.counterparty_topic, envelope)
            .await?;
        Ok(())
    }

    /// Accepts an envelope addressed to this session. Returns `false` when it
    /// was not signed by the originator or belongs to another session.
    pub fn receive(&self, envelope: MessageEnvelope) -> bool {
        if envelope.message.session_id() != self.info.id {
            debug!(session_id = %self.info.id, other = %envelope.message.session_id(), "Ignoring message for another session");
            return false;
        }
        if !envelope.verify(&self.info.counterparty_public_signing_key, self.sign_service.as_ref()) {
            warn!(session_id = %self.info.id, kind = %envelope.message.kind(), "Dropping message with invalid signature");
            return false;
        }

        if matches!(envelope.message, Message::Termination(_)) {
            self.terminated.store(true, Ordering::SeqCst);
        }
        self.queue.enqueue(envelope.message);
        true
    }

    /// Fetches pending messages from the session filter and accepts them.
    pub async fn poll(&self) -> Result<usize> {
        let envelopes = self
            .transport
            .get_session_messages(&self.info.message_filter)
            .await?;

        Ok(envelopes
            .into_iter()
            .map(|envelope| self.receive(envelope))
            .filter(|accepted| *accepted)
            .count())
    }

    /// Waits until every accepted message has been handed to the callbacks.
    pub async fn wait_idle(&self) {
        self.queue.wait().await;
    }

    pub async fn close(&self) {
        self.queue.dispose().await;
        info!(session_id = %self.info.id, "Beneficiary session closed");
    }
}

#[derive(Clone)]
struct CallbackRouter {
    session_id: String,
    callbacks: Arc<dyn BeneficiaryCallbacks>,
}

#[async_trait]
impl MessageHandler for CallbackRouter {
    async fn handle_message(&self, message: &Message) -> anyhow::Result<()> {
        match message {
            Message::TransferRequest(request) => {
                self.callbacks
                    .transfer_request_received(&self.session_id, request)
                    .await
            }
            Message::TransferDispatch(dispatch) => {
                self.callbacks
                    .transfer_dispatch_received(&self.session_id, dispatch)
                    .await
            }
            Message::Termination(_) => self.callbacks.session_terminated(&self.session_id).await,
            Message::SessionRequest(_) | Message::SessionReply(_) => Ok(()),
        }
    }
}

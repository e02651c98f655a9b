// src/network/listener/session_request.rs
//! Accepts session requests addressed to this VASP.
//!
//! While listening, a background task polls the VASP's public topic. Every
//! session request is authenticated against the originator's signing key from
//! the registry before any key material is created. Authenticated requests
//! complete the ECDH handshake, get a fresh session topic and filter, and are
//! handed to the session-created subscribers as a [`BeneficiarySession`].

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use super::error::{ListenerError, Result};
use super::subscriber::SessionCreatedHandler;
use crate::blockchain::{RegistryError, VaspContractInfo, VaspRegistry};
use crate::core::crypto::{EcdhKey, SignService};
use crate::core::entities::VaspCode;
use crate::core::messages::{Message, MessageEnvelope, SessionRequestMessage};
use crate::core::session::{BeneficiaryCallbacks, BeneficiarySession, BeneficiarySessionInfo};
use crate::network::dispatch::FailurePolicy;
use crate::network::transport::{FilterHandle, TopicGenerator, Transport};
use crate::utils::worker::{is_current_worker, panic_message, spawn_worker};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Local identity and tuning for a [`SessionRequestListener`].
#[derive(Clone)]
pub struct ListenerSettings {
    pub vasp_code: VaspCode,
    pub handshake_key: EcdhKey,
    pub signing_private_key: String,
    pub poll_interval: Duration,
    /// Policy for the dispatch queue of every session created.
    pub failure_policy: FailurePolicy,
}

impl ListenerSettings {
    pub fn new(vasp_code: VaspCode, handshake_key: EcdhKey, signing_private_key: impl Into<String>) -> Self {
        Self {
            vasp_code,
            handshake_key,
            signing_private_key: signing_private_key.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }
}

impl fmt::Debug for ListenerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSettings")
            .field("vasp_code", &self.vasp_code)
            .field("handshake_key", &self.handshake_key)
            .field("poll_interval", &self.poll_interval)
            .field("failure_policy", &self.failure_policy)
            .finish_non_exhaustive()
    }
}

struct ListenerCore {
    settings: ListenerSettings,
    transport: Arc<dyn Transport>,
    registry: Arc<dyn VaspRegistry>,
    sign_service: Arc<dyn SignService>,
    sessions_created: AtomicU64,
}

enum ListenerState {
    Idle,
    Listening {
        cancel: CancellationToken,
        task: JoinHandle<()>,
        worker_id: Uuid,
    },
    Disposed,
}

pub struct SessionRequestListener {
    core: Arc<ListenerCore>,
    subscribers: Mutex<Vec<Arc<dyn SessionCreatedHandler>>>,
    state: Mutex<ListenerState>,
}

impl SessionRequestListener {
    pub fn new(
        settings: ListenerSettings,
        transport: Arc<dyn Transport>,
        registry: Arc<dyn VaspRegistry>,
        sign_service: Arc<dyn SignService>,
    ) -> Self {
        Self {
            core: Arc::new(ListenerCore {
                settings,
                transport,
                registry,
                sign_service,
                sessions_created: AtomicU64::new(0),
            }),
            subscribers: Mutex::new(Vec::new()),
            state: Mutex::new(ListenerState::Idle),
        }
    }

    /// Adds a session-created subscriber. Subscribers are fixed for a
    /// listening period, so this fails once monitoring has started.
    pub fn subscribe_session_created<H>(&self, handler: H) -> Result<()>
    where
        H: SessionCreatedHandler + 'static,
    {
        let state = self.state.lock();
        match *state {
            ListenerState::Idle => {}
            ListenerState::Listening { .. } => return Err(ListenerError::SubscribeWhileListening),
            ListenerState::Disposed => return Err(ListenerError::Disposed),
        }

        self.subscribers.lock().push(Arc::new(handler));
        Ok(())
    }

    /// Spawns the polling task. Every session created during this listening
    /// period reports to `callbacks`.
    pub fn start_topic_monitoring(&self, callbacks: Arc<dyn BeneficiaryCallbacks>) -> Result<()> {
        let mut state = self.state.lock();
        match *state {
            ListenerState::Idle => {}
            ListenerState::Listening { .. } => return Err(ListenerError::AlreadyStarted),
            ListenerState::Disposed => return Err(ListenerError::Disposed),
        }

        let cancel = CancellationToken::new();
        let worker_id = Uuid::new_v4();
        let poller = Poller {
            core: self.core.clone(),
            callbacks,
            subscribers: self.subscribers.lock().clone(),
            cancel: cancel.clone(),
        };
        let task = spawn_worker(worker_id, poller.run());

        *state = ListenerState::Listening {
            cancel,
            task,
            worker_id,
        };
        info!(vasp_code = %self.core.settings.vasp_code, "Session request listener started");
        Ok(())
    }

    /// Cancels the polling task and waits for it to finish. The listener can
    /// be started again afterwards.
    pub async fn stop(&self) {
        self.shutdown(ListenerState::Idle).await;
    }

    /// Stops the listener for good. Safe to call repeatedly.
    pub async fn dispose(&self) {
        self.shutdown(ListenerState::Disposed).await;
    }

    pub fn is_listening(&self) -> bool {
        matches!(*self.state.lock(), ListenerState::Listening { .. })
    }

    /// Number of sessions created since construction, across restarts.
    pub fn sessions_created(&self) -> u64 {
        self.core.sessions_created.load(Ordering::SeqCst)
    }

    pub fn vasp_code(&self) -> &VaspCode {
        &self.core.settings.vasp_code
    }

    async fn shutdown(&self, next: ListenerState) {
        let previous = {
            let mut state = self.state.lock();
            if matches!(*state, ListenerState::Disposed) {
                return;
            }
            std::mem::replace(&mut *state, next)
        };

        let ListenerState::Listening {
            cancel,
            task,
            worker_id,
        } = previous
        else {
            return;
        };

        cancel.cancel();

        // Stopped from a subscriber: the task exits on its own once the
        // subscriber returns.
        if is_current_worker(worker_id) {
            debug!("Listener stopped from its own task");
            return;
        }

        match task.await {
            Ok(()) => info!(vasp_code = %self.core.settings.vasp_code, "Session request listener stopped"),
            Err(e) if e.is_cancelled() => debug!("Listener task was aborted"),
            Err(e) => error!(error = %e, "Listener task panicked"),
        }
    }
}

impl Drop for SessionRequestListener {
    fn drop(&mut self) {
        if let ListenerState::Listening { cancel, .. } = &*self.state.lock() {
            cancel.cancel();
        }
    }
}

/// State owned by one listening period's background task.
struct Poller {
    core: Arc<ListenerCore>,
    callbacks: Arc<dyn BeneficiaryCallbacks>,
    subscribers: Vec<Arc<dyn SessionCreatedHandler>>,
    cancel: CancellationToken,
}

impl Poller {
    async fn run(self) {
        let Some(inbox) = self.open_inbox().await else {
            return;
        };
        debug!(filter = %inbox, "Polling for session requests");

        while !self.cancel.is_cancelled() {
            match self.poll_once(&inbox).await {
                Ok(0) => self.pause().await,
                Ok(fetched) => trace!(fetched, "Processed session request batch"),
                Err(ListenerError::Cancelled) => break,
                Err(e) => {
                    error!(error = %e, "Session request poll failed");
                    self.pause().await;
                }
            }
        }
    }

    /// Registers the handshake key and the filter on this VASP's topic,
    /// retrying every poll interval until it succeeds or the listener stops.
    async fn open_inbox(&self) -> Option<FilterHandle> {
        let settings = &self.core.settings;
        loop {
            let opened = async {
                let key = self
                    .cancellable(
                        self.core
                            .transport
                            .register_key_pair(&settings.handshake_key.private_key_hex()),
                    )
                    .await??;
                let filter = self
                    .cancellable(
                        self.core
                            .transport
                            .create_message_filter(settings.vasp_code.code(), &key),
                    )
                    .await??;
                Ok::<_, ListenerError>(filter)
            }
            .await;

            match opened {
                Ok(filter) => return Some(filter),
                Err(ListenerError::Cancelled) => return None,
                Err(e) => {
                    error!(vasp_code = %settings.vasp_code, error = %e, "Failed to open session request inbox");
                    self.pause().await;
                    if self.cancel.is_cancelled() {
                        return None;
                    }
                }
            }
        }
    }

    /// Handles one fetched batch in order. Returns how many messages were
    /// fetched. A failing request is logged and does not affect the rest of
    /// the batch.
    async fn poll_once(&self, inbox: &FilterHandle) -> Result<usize> {
        let envelopes = self
            .cancellable(self.core.transport.get_session_messages(inbox))
            .await??;
        let fetched = envelopes.len();

        for envelope in envelopes {
            let request = match &envelope.message {
                Message::SessionRequest(request) => request.clone(),
                other => {
                    trace!(kind = %other.kind(), "Skipping non session request message");
                    continue;
                }
            };

            let session_id = envelope.message.session_id().to_string();
            match AssertUnwindSafe(self.accept(&envelope, request)).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(ListenerError::Cancelled)) => return Err(ListenerError::Cancelled),
                Ok(Err(e)) => error!(%session_id, error = %e, "Failed to handle session request"),
                Err(payload) => error!(
                    %session_id,
                    panic = %panic_message(&*payload),
                    "Session request handling panicked"
                ),
            }
        }

        Ok(fetched)
    }

    async fn accept(&self, envelope: &MessageEnvelope, request: SessionRequestMessage) -> Result<()> {
        let Some(contract) = self.authenticate(envelope, &request).await? else {
            return Ok(());
        };

        let session = Arc::new(self.create_session(&request, contract).await?);
        self.core.sessions_created.fetch_add(1, Ordering::SeqCst);
        info!(
            session_id = %session.id(),
            originator = %request.vasp.vasp_identity,
            topic = %session.info().topic,
            "Session established"
        );

        self.notify(session, request).await
    }

    /// Returns the originator's contract when the request is signed with its
    /// registered signing key.
    async fn authenticate(
        &self,
        envelope: &MessageEnvelope,
        request: &SessionRequestMessage,
    ) -> Result<Option<VaspContractInfo>> {
        let identity = &request.vasp.vasp_identity;
        let lookup = self
            .cancellable(self.core.registry.get_vasp_contract_info(identity))
            .await?;

        let contract = match lookup {
            Ok(contract) => contract,
            Err(RegistryError::NotFound(_)) => {
                debug!(session_id = %request.session_id(), originator = %identity, "Session request from unknown VASP");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if !envelope.verify(&contract.signing_key, self.core.sign_service.as_ref()) {
            warn!(session_id = %request.session_id(), originator = %identity, "Session request signature does not match registry key");
            return Ok(None);
        }

        Ok(Some(contract))
    }

    async fn create_session(
        &self,
        request: &SessionRequestMessage,
        contract: VaspContractInfo,
    ) -> Result<BeneficiarySession> {
        let settings = &self.core.settings;
        let transport = &self.core.transport;

        let shared_secret = settings
            .handshake_key
            .generate_shared_secret_hex(&request.handshake.ecdh_pub_key)?;
        let sym_key = self
            .cancellable(transport.register_sym_key(&shared_secret))
            .await??;
        let topic = TopicGenerator::generate_session_topic();
        let message_filter = self
            .cancellable(transport.create_message_filter(&topic, &sym_key))
            .await??;

        let info = BeneficiarySessionInfo {
            id: request.session_id().to_string(),
            private_signing_key: settings.signing_private_key.clone(),
            shared_encryption_key: shared_secret,
            counterparty_public_signing_key: contract.signing_key,
            topic,
            counterparty_topic: request.handshake.topic_a.clone(),
            message_filter,
            sym_key,
        };

        Ok(BeneficiarySession::with_failure_policy(
            info,
            self.callbacks.clone(),
            transport.clone(),
            self.core.sign_service.clone(),
            settings.failure_policy,
        ))
    }

    /// Runs every subscriber concurrently and waits for all of them. A
    /// panicking subscriber counts as a failed one.
    async fn notify(&self, session: Arc<BeneficiarySession>, request: SessionRequestMessage) -> Result<()> {
        let results = join_all(self.subscribers.iter().map(|subscriber| {
            AssertUnwindSafe(subscriber.session_created(session.clone(), request.clone()))
                .catch_unwind()
                .map(subscriber_outcome)
        }))
        .await;

        let mut first_failure = None;
        for e in results.into_iter().filter_map(|r| r.err()) {
            warn!(session_id = %session.id(), error = %e, "Session created subscriber failed");
            first_failure.get_or_insert(e);
        }

        match first_failure {
            Some(e) => Err(ListenerError::Subscriber(e)),
            None => Ok(()),
        }
    }

    async fn cancellable<F: Future>(&self, future: F) -> Result<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ListenerError::Cancelled),
            output = future => Ok(output),
        }
    }

    async fn pause(&self) {
        let _ = self
            .cancellable(tokio::time::sleep(self.core.settings.poll_interval))
            .await;
    }
}

/// Turns a caught subscriber panic into a failure.
fn subscriber_outcome(outcome: std::thread::Result<anyhow::Result<()>>) -> anyhow::Result<()> {
    outcome.unwrap_or_else(|payload| {
        Err(anyhow::anyhow!("subscriber panicked: {}", panic_message(&*payload)))
    })
}

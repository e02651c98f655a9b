// tests/common/mod.rs
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use vasp_session_node::{
    blockchain::{StaticRegistry, VaspContractInfo},
    core::{
        crypto::{signing_public_key, EcdhKey, EcdsaSignService},
        entities::{VaspCode, VaspInformation},
        messages::{
            HandShakeRequest, Message, MessageEnvelope, SessionReplyCode, SessionRequestMessage,
            TransferDispatchMessage, TransferRequestMessage,
        },
        session::{BeneficiaryCallbacks, BeneficiarySession},
    },
    network::{
        dispatch::FailurePolicy,
        transport::{FilterHandle, InMemoryTransport, TopicGenerator, Transport},
    },
    utils::config::{
        Config, DemoConfig, DispatchConfig, ListenerConfig, LoggingConfig, NodeConfig, RegistryConfig,
    },
    Application,
};

pub const BENEFICIARY_CODE: &str = "bbb4ee5c";
pub const BENEFICIARY_IDENTITY: &str = "0x08fda931d64b17c3acffb35c1b3902e0bbb4ee5c";
pub const ORIGINATOR_IDENTITY: &str = "0x6befaf0656b953b188a0ee3bf3db03d07dface61";
pub const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub fn test_config() -> Config {
    Config {
        node: NodeConfig {
            name: "Beneficiary VASP".into(),
            vasp_identity: BENEFICIARY_IDENTITY.into(),
            vasp_code: BENEFICIARY_CODE.into(),
            handshake_private_key: Some(EcdhKey::generate().private_key_hex()),
            signing_private_key: Some(EcdhKey::generate().private_key_hex()),
        },
        listener: ListenerConfig {
            poll_interval_ms: POLL_INTERVAL.as_millis() as u64,
        },
        dispatch: DispatchConfig {
            failure_policy: FailurePolicy::StopWorker,
        },
        logging: LoggingConfig {
            level: "debug".into(),
            directory: None,
            file_prefix: "test".into(),
        },
        registry: RegistryConfig::default(),
        demo: DemoConfig::default(),
    }
}

/// Callbacks that record what each session delivered.
#[derive(Default)]
pub struct RecordingCallbacks {
    pub events: Mutex<Vec<String>>,
}

#[async_trait]
impl BeneficiaryCallbacks for RecordingCallbacks {
    async fn transfer_request_received(
        &self,
        session_id: &str,
        request: &TransferRequestMessage,
    ) -> anyhow::Result<()> {
        self.events
            .lock()
            .push(format!("{}:request:{}", session_id, request.beneficiary_vaan));
        Ok(())
    }

    async fn transfer_dispatch_received(
        &self,
        session_id: &str,
        dispatch: &TransferDispatchMessage,
    ) -> anyhow::Result<()> {
        self.events
            .lock()
            .push(format!("{}:dispatch:{}", session_id, dispatch.transaction_id));
        Ok(())
    }

    async fn session_terminated(&self, session_id: &str) -> anyhow::Result<()> {
        self.events.lock().push(format!("{}:terminated", session_id));
        Ok(())
    }
}

/// A running beneficiary node on an in-memory transport. Every created
/// session is accepted and forwarded to `sessions`.
pub struct TestContext {
    pub transport: Arc<InMemoryTransport>,
    pub registry: Arc<StaticRegistry>,
    pub callbacks: Arc<RecordingCallbacks>,
    pub app: Application,
    pub sessions: mpsc::UnboundedReceiver<Arc<BeneficiarySession>>,
}

impl TestContext {
    pub async fn new() -> Self {
        let transport = Arc::new(InMemoryTransport::new());
        let registry = Arc::new(StaticRegistry::new());
        let callbacks = Arc::new(RecordingCallbacks::default());

        let app = Application::new(
            test_config(),
            transport.clone(),
            registry.clone(),
            Arc::new(EcdsaSignService::new()),
        )
        .expect("Failed to create application");

        let (tx, sessions) = mpsc::unbounded_channel();
        let vasp = app.vasp_information().clone();
        app.listener()
            .subscribe_session_created(move |session: Arc<BeneficiarySession>, _: SessionRequestMessage| {
                let tx = tx.clone();
                let vasp = vasp.clone();
                async move {
                    session
                        .send_session_reply(vasp, SessionReplyCode::SessionAccepted)
                        .await?;
                    let _ = tx.send(session);
                    Ok::<_, anyhow::Error>(())
                }
            })
            .expect("Failed to subscribe");
        app.start(callbacks.clone()).expect("Failed to start application");

        Self {
            transport,
            registry,
            callbacks,
            app,
            sessions,
        }
    }

    pub async fn next_session(&mut self) -> Option<Arc<BeneficiarySession>> {
        tokio::time::timeout(Duration::from_secs(2), self.sessions.recv())
            .await
            .ok()
            .flatten()
    }

    /// Long enough for the listener to complete several poll cycles.
    pub async fn settle(&self) {
        tokio::time::sleep(POLL_INTERVAL * 10).await;
    }
}

/// The initiating VASP, with its own reply topic on the shared transport.
pub struct Originator {
    pub signing_key: String,
    pub handshake_key: EcdhKey,
    pub topic_a: String,
    pub inbox: FilterHandle,
}

impl Originator {
    pub async fn new(transport: &InMemoryTransport) -> Self {
        let handshake_key = EcdhKey::generate();
        let topic_a = TopicGenerator::generate_session_topic();
        let key = transport
            .register_key_pair(&handshake_key.private_key_hex())
            .await
            .unwrap();
        let inbox = transport.create_message_filter(&topic_a, &key).await.unwrap();

        Self {
            signing_key: EcdhKey::generate().private_key_hex(),
            handshake_key,
            topic_a,
            inbox,
        }
    }

    /// Publishes this originator in the registry under its identity.
    pub async fn registered(ctx: &TestContext) -> Self {
        let originator = Self::new(&ctx.transport).await;
        ctx.registry.register(originator.contract());
        originator
    }

    pub fn contract(&self) -> VaspContractInfo {
        VaspContractInfo {
            vasp_identity: ORIGINATOR_IDENTITY.into(),
            vasp_code: VaspCode::new("7dface61").unwrap(),
            owner_address: "0x0000000000000000000000000000000000000001".into(),
            signing_key: signing_public_key(&self.signing_key).unwrap(),
            handshake_key: self.handshake_key.public_key_hex(),
        }
    }

    pub fn session_request(&self) -> SessionRequestMessage {
        SessionRequestMessage::initiate(
            HandShakeRequest::new(self.topic_a.clone(), self.handshake_key.public_key_hex()),
            VaspInformation::new(
                "Originator VASP",
                ORIGINATOR_IDENTITY,
                signing_public_key(&self.signing_key).unwrap(),
            ),
        )
    }

    pub fn seal(&self, message: impl Into<Message>) -> MessageEnvelope {
        MessageEnvelope::seal(message, &self.signing_key, &EcdsaSignService::new()).unwrap()
    }

    pub async fn send_session_request(&self, transport: &InMemoryTransport) -> SessionRequestMessage {
        let request = self.session_request();
        transport
            .publish(BENEFICIARY_CODE, self.seal(request.clone()))
            .await
            .unwrap();
        request
    }

    pub async fn replies(&self, transport: &InMemoryTransport) -> Vec<MessageEnvelope> {
        transport.get_session_messages(&self.inbox).await.unwrap()
    }
}

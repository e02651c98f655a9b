use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::signal;
use tracing::{error, info};
use vasp_session_node::{
    blockchain::{StaticRegistry, VaspContractInfo},
    core::{
        crypto::{signing_public_key, EcdhKey, EcdsaSignService, SignService},
        entities::{VaspCode, VaspInformation, VirtualAssetsAccountNumber},
        messages::{
            HandShakeRequest, Message, MessageEnvelope, SessionReplyCode, SessionRequestMessage,
            TerminationMessage, TransferDispatchMessage, TransferRequestMessage, VirtualAsset,
        },
        session::{BeneficiaryCallbacks, BeneficiarySession},
    },
    network::transport::{InMemoryTransport, TopicGenerator, Transport},
    utils::{config::Config, logging::init_logging},
    Application,
};

/// Logs every business message. A real node would hand these to its
/// compliance back office.
struct LoggingCallbacks;

#[async_trait]
impl BeneficiaryCallbacks for LoggingCallbacks {
    async fn transfer_request_received(
        &self,
        session_id: &str,
        request: &TransferRequestMessage,
    ) -> anyhow::Result<()> {
        info!(
            session_id,
            originator_vaan = %request.originator_vaan,
            beneficiary_vaan = %request.beneficiary_vaan,
            asset = ?request.asset,
            amount = request.amount,
            "Transfer request received"
        );
        Ok(())
    }

    async fn transfer_dispatch_received(
        &self,
        session_id: &str,
        dispatch: &TransferDispatchMessage,
    ) -> anyhow::Result<()> {
        info!(session_id, transaction_id = %dispatch.transaction_id, "Transfer dispatch received");
        Ok(())
    }

    async fn session_terminated(&self, session_id: &str) -> anyhow::Result<()> {
        info!(session_id, "Session terminated by originator");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Load configuration
    let config = Config::new().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;
    let _log_guard = init_logging(&config.logging)?;

    info!("Starting VASP Session Node v{}", env!("CARGO_PKG_VERSION"));

    let transport = Arc::new(InMemoryTransport::new());
    let registry = Arc::new(StaticRegistry::from_entries(config.registry_entries()?));
    let sign_service: Arc<dyn SignService> = Arc::new(EcdsaSignService::new());
    let poll_interval = config.poll_interval();
    let demo = config.demo.enabled;

    // Initialize application
    let app = Application::new(config, transport.clone(), registry.clone(), sign_service.clone()).map_err(|e| {
        error!("Failed to initialize application: {}", e);
        e
    })?;

    let vasp = app.vasp_information().clone();
    let poller = app.session_poller().clone();
    app.listener().subscribe_session_created(
        move |session: Arc<BeneficiarySession>, request: SessionRequestMessage| {
            let vasp = vasp.clone();
            let poller = poller.clone();
            async move {
                info!(
                    session_id = %session.id(),
                    originator = %request.vasp.name,
                    "Accepting session"
                );
                session
                    .send_session_reply(vasp, SessionReplyCode::SessionAccepted)
                    .await?;
                poller.spawn(session);
                Ok::<_, anyhow::Error>(())
            }
        },
    )?;

    app.start(Arc::new(LoggingCallbacks)).map_err(|e| {
        error!("Failed to start application: {}", e);
        e
    })?;

    if demo {
        registry.register(app.contract_info("0x0000000000000000000000000000000000000000"));
        let beneficiary_code = app.vasp_code().clone();
        tokio::spawn(async move {
            if let Err(e) = run_demo_originator(transport, registry, sign_service, beneficiary_code, poll_interval).await {
                error!(error = %e, "Demo originator failed");
            }
        });
    }

    info!("Application started successfully");

    // Handle shutdown signals
    if let Err(err) = signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
    } else {
        info!("Received shutdown signal");
    }

    // Perform graceful shutdown
    if let Err(e) = app.shutdown().await {
        error!("Error during shutdown: {}", e);
    }

    Ok(())
}

/// Plays the originator side of a handshake against this node over the
/// shared in-memory transport.
async fn run_demo_originator(
    transport: Arc<InMemoryTransport>,
    registry: Arc<StaticRegistry>,
    sign_service: Arc<dyn SignService>,
    beneficiary_code: VaspCode,
    poll_interval: Duration,
) -> anyhow::Result<()> {
    let signing_key = EcdhKey::generate().private_key_hex();
    let handshake_key = EcdhKey::generate();
    let identity = "0x6befaf0656b953b188a0ee3bf3db03d07dface61";

    registry.register(VaspContractInfo {
        vasp_identity: identity.to_string(),
        vasp_code: VaspCode::new("7dface61")?,
        owner_address: "0x0000000000000000000000000000000000000001".to_string(),
        signing_key: signing_public_key(&signing_key)?,
        handshake_key: handshake_key.public_key_hex(),
    });

    let topic_a = TopicGenerator::generate_session_topic();
    let key = transport.register_key_pair(&handshake_key.private_key_hex()).await?;
    let inbox = transport.create_message_filter(&topic_a, &key).await?;

    let request = SessionRequestMessage::initiate(
        HandShakeRequest::new(topic_a.clone(), handshake_key.public_key_hex()),
        VaspInformation::new("Demo Originator", identity, signing_public_key(&signing_key)?),
    );
    let envelope = MessageEnvelope::seal(request, &signing_key, sign_service.as_ref())?;
    transport.publish(beneficiary_code.code(), envelope).await?;
    info!(topic_a = %topic_a, "Demo originator sent session request");

    loop {
        for envelope in transport.get_session_messages(&inbox).await? {
            if let Message::SessionReply(reply) = envelope.message {
                info!(
                    session_id = %reply.header.session_id,
                    topic_b = %reply.handshake.topic_b,
                    code = ?reply.code,
                    "Demo originator received session reply"
                );

                let session_id = reply.header.session_id;
                let messages: Vec<Message> = vec![
                    TransferRequestMessage::create(
                        session_id.clone(),
                        VirtualAssetsAccountNumber::create("7dface61", "524ee3fb082809")?,
                        VirtualAssetsAccountNumber::with_code(beneficiary_code.clone(), "0a0b0c0d0e0f")?,
                        VirtualAsset::Eth,
                        0.5,
                    )
                    .into(),
                    TransferDispatchMessage::create(session_id.clone(), "0xdemo", "0xdemo-sender").into(),
                    TerminationMessage::create(session_id).into(),
                ];
                for message in messages {
                    let envelope = MessageEnvelope::seal(message, &signing_key, sign_service.as_ref())?;
                    transport.publish(&reply.handshake.topic_b, envelope).await?;
                }
                return Ok(());
            }
        }
        tokio::time::sleep(poll_interval).await;
    }
}

pub mod blockchain;
pub mod core;
pub mod network;
pub mod utils;

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    blockchain::{VaspContractInfo, VaspRegistry},
    core::{
        crypto::{signing_public_key, EcdhKey, SignService},
        entities::{VaspCode, VaspInformation},
        session::{BeneficiaryCallbacks, SessionPoller},
    },
    network::{
        listener::{ListenerSettings, SessionRequestListener},
        transport::Transport,
    },
    utils::{config::Config, error::Result},
};

/// A beneficiary node: the local VASP identity plus its session request
/// listener, wired to the given collaborators.
pub struct Application {
    config: Arc<Config>,
    vasp_code: VaspCode,
    vasp: VaspInformation,
    handshake_public_key: String,
    listener: Arc<SessionRequestListener>,
    sessions: SessionPoller,
}

impl Application {
    pub fn new(
        config: Config,
        transport: Arc<dyn Transport>,
        registry: Arc<dyn VaspRegistry>,
        sign_service: Arc<dyn SignService>,
    ) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let vasp_code = config.vasp_code()?;

        let handshake_key = match &config.node.handshake_private_key {
            Some(key) => EcdhKey::from_private_key_hex(key)?,
            None => {
                warn!("No handshake key configured, generating an ephemeral one");
                EcdhKey::generate()
            }
        };
        let signing_private_key = match &config.node.signing_private_key {
            Some(key) => key.clone(),
            None => {
                warn!("No signing key configured, generating an ephemeral one");
                EcdhKey::generate().private_key_hex()
            }
        };

        let vasp = VaspInformation::new(
            config.node.name.clone(),
            config.node.vasp_identity.clone(),
            signing_public_key(&signing_private_key)?,
        );
        let handshake_public_key = handshake_key.public_key_hex();

        info!(vasp_code = %vasp_code, vasp_identity = %vasp.vasp_identity, "Initializing session listener...");
        let settings = ListenerSettings::new(vasp_code.clone(), handshake_key, signing_private_key)
            .with_poll_interval(config.poll_interval())
            .with_failure_policy(config.dispatch.failure_policy);
        let listener = Arc::new(SessionRequestListener::new(
            settings,
            transport,
            registry,
            sign_service,
        ));

        let sessions = SessionPoller::new(config.poll_interval());

        Ok(Self {
            config,
            vasp_code,
            vasp,
            handshake_public_key,
            listener,
            sessions,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Register session-created subscribers here before calling
    /// [`Application::start`].
    pub fn listener(&self) -> &Arc<SessionRequestListener> {
        &self.listener
    }

    /// Polls accepted sessions until they terminate or the application shuts
    /// down.
    pub fn session_poller(&self) -> &SessionPoller {
        &self.sessions
    }

    pub fn vasp_code(&self) -> &VaspCode {
        &self.vasp_code
    }

    pub fn vasp_information(&self) -> &VaspInformation {
        &self.vasp
    }

    /// What this node's registry entry has to publish for originators to
    /// reach and authenticate it.
    pub fn contract_info(&self, owner_address: impl Into<String>) -> VaspContractInfo {
        VaspContractInfo {
            vasp_identity: self.vasp.vasp_identity.clone(),
            vasp_code: self.vasp_code.clone(),
            owner_address: owner_address.into(),
            signing_key: self.vasp.vasp_public_key.clone(),
            handshake_key: self.handshake_public_key.clone(),
        }
    }

    pub fn start(&self, callbacks: Arc<dyn BeneficiaryCallbacks>) -> Result<()> {
        info!("Starting session request listener...");
        self.listener.start_topic_monitoring(callbacks)?;

        info!(vasp_code = %self.vasp_code, "Application successfully started");
        Ok(())
    }

    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down application...");

        info!("Stopping session request listener...");
        self.listener.dispose().await;

        info!(active_sessions = self.sessions.active(), "Closing sessions...");
        self.sessions.shutdown().await;

        info!(sessions_created = self.listener.sessions_created(), "Application shutdown complete");
        Ok(())
    }
}

// src/utils/config.rs
use std::path::Path;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config as ConfigLib, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

use crate::blockchain::VaspContractInfo;
use crate::core::crypto::ecdh::parse_public_key;
use crate::core::crypto::EcdhKey;
use crate::core::entities::VaspCode;
use crate::network::dispatch::FailurePolicy;
use crate::utils::error::{NodeError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub node: NodeConfig,
    pub listener: ListenerConfig,
    pub dispatch: DispatchConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

#[derive(Clone, Deserialize)]
pub struct NodeConfig {
    pub name: String,
    pub vasp_identity: String,
    pub vasp_code: String,
    /// Generated at startup when absent.
    pub handshake_private_key: Option<String>,
    /// Generated at startup when absent.
    pub signing_private_key: Option<String>,
}

impl std::fmt::Debug for NodeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeConfig")
            .field("name", &self.name)
            .field("vasp_identity", &self.vasp_identity)
            .field("vasp_code", &self.vasp_code)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListenerConfig {
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    pub failure_policy: FailurePolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for daily rolling log files. Console only when unset.
    pub directory: Option<String>,
    pub file_prefix: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub entries: Vec<RegistryEntryConfig>,
}

/// Development binary only: runs an in-process originator against the node.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DemoConfig {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryEntryConfig {
    pub vasp_identity: String,
    pub vasp_code: String,
    pub owner_address: String,
    pub signing_key: String,
    pub handshake_key: String,
}

impl Config {
    pub fn new() -> Result<Self> {
        let config = Self::defaults()?
            // Load from config file
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (e.g., VASP_NODE__VASP_CODE)
            .add_source(
                Environment::with_prefix("VASP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Self::finish(config)
    }

    /// Loads a single file on top of the defaults, without environment
    /// overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::defaults()?
            .add_source(File::from(path.as_ref()))
            .build()?;

        Self::finish(config)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        Ok(ConfigLib::builder()
            .set_default("node.name", "VASP Session Node")?
            .set_default("listener.poll_interval_ms", 5_000)?
            .set_default("dispatch.failure_policy", "stop_worker")?
            .set_default("logging.level", "info")?
            .set_default("logging.file_prefix", "vasp-session-node")?)
    }

    fn finish(config: ConfigLib) -> Result<Self> {
        let config: Self = config.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        VaspCode::new(&self.node.vasp_code)?;
        if self.node.vasp_identity.trim().is_empty() {
            return Err(NodeError::Config("node.vasp_identity must be set".into()));
        }
        for key in [&self.node.handshake_private_key, &self.node.signing_private_key]
            .into_iter()
            .flatten()
        {
            EcdhKey::from_private_key_hex(key)?;
        }

        if self.listener.poll_interval_ms == 0 {
            return Err(NodeError::Config("listener.poll_interval_ms must be greater than 0".into()));
        }
        if self.logging.level.trim().is_empty() {
            return Err(NodeError::Config("logging.level must be set".into()));
        }

        for entry in &self.registry.entries {
            VaspCode::new(&entry.vasp_code)?;
            parse_public_key(&entry.signing_key)?;
            parse_public_key(&entry.handshake_key)?;
        }

        Ok(())
    }

    pub fn vasp_code(&self) -> Result<VaspCode> {
        Ok(VaspCode::new(&self.node.vasp_code)?)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.listener.poll_interval_ms)
    }

    pub fn registry_entries(&self) -> Result<Vec<VaspContractInfo>> {
        self.registry
            .entries
            .iter()
            .map(|entry| {
                Ok(VaspContractInfo {
                    vasp_identity: entry.vasp_identity.clone(),
                    vasp_code: VaspCode::new(&entry.vasp_code)?,
                    owner_address: entry.owner_address.clone(),
                    signing_key: entry.signing_key.clone(),
                    handshake_key: entry.handshake_key.clone(),
                })
            })
            .collect()
    }
}

impl From<ConfigError> for NodeError {
    fn from(error: ConfigError) -> Self {
        NodeError::Config(error.to_string())
    }
}

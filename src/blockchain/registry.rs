// src/blockchain/registry.rs
use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::{RegistryError, Result};
use crate::core::entities::VaspCode;

/// What the on-chain VASP contract publishes about a VASP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaspContractInfo {
    pub vasp_identity: String,
    pub vasp_code: VaspCode,
    pub owner_address: String,
    pub signing_key: String,
    pub handshake_key: String,
}

/// Resolves a VASP identity to its contract data, most importantly the
/// current signing public key.
#[async_trait]
pub trait VaspRegistry: Send + Sync {
    async fn get_vasp_contract_info(&self, vasp_identity: &str) -> Result<VaspContractInfo>;
}

/// Registry backed by a fixed set of entries, normally loaded from
/// configuration.
#[derive(Debug, Default)]
pub struct StaticRegistry {
    entries: RwLock<HashMap<String, VaspContractInfo>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = VaspContractInfo>) -> Self {
        let registry = Self::new();
        for entry in entries {
            registry.register(entry);
        }
        registry
    }

    pub fn register(&self, info: VaspContractInfo) {
        debug!(vasp_identity = %info.vasp_identity, vasp_code = %info.vasp_code, "Registering VASP contract");
        self.entries
            .write()
            .insert(normalize_identity(&info.vasp_identity), info);
    }

    pub fn remove(&self, vasp_identity: &str) -> Option<VaspContractInfo> {
        let removed = self.entries.write().remove(&normalize_identity(vasp_identity));
        if removed.is_some() {
            info!(vasp_identity, "Removed VASP contract from registry");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl VaspRegistry for StaticRegistry {
    async fn get_vasp_contract_info(&self, vasp_identity: &str) -> Result<VaspContractInfo> {
        self.entries
            .read()
            .get(&normalize_identity(vasp_identity))
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(vasp_identity.to_string()))
    }
}

// Contract addresses are case-insensitive hex.
fn normalize_identity(vasp_identity: &str) -> String {
    vasp_identity.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn entry(identity: &str) -> VaspContractInfo {
        VaspContractInfo {
            vasp_identity: identity.to_string(),
            vasp_code: VaspCode::new("7dface61").unwrap(),
            owner_address: "0x6befaf0656b953b188a0ee3bf3db03d07dface61".to_string(),
            signing_key: "0x04aa".to_string(),
            handshake_key: "0x04bb".to_string(),
        }
    }

    #[tokio::test]
    async fn resolves_registered_identity_case_insensitively() {
        let registry = StaticRegistry::from_entries([entry("0xABCDEF")]);

        let info = assert_ok!(registry.get_vasp_contract_info("0xabcdef").await);
        assert_eq!(info.signing_key, "0x04aa");
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn unknown_identity_is_not_found() {
        let registry = StaticRegistry::new();
        assert_eq!(
            registry.get_vasp_contract_info("0x01").await,
            Err(RegistryError::NotFound("0x01".to_string()))
        );
    }

    #[tokio::test]
    async fn removed_identity_no_longer_resolves() {
        let registry = StaticRegistry::from_entries([entry("0x01")]);
        assert!(registry.remove("0x01").is_some());
        assert!(registry.is_empty());
        assert_err!(registry.get_vasp_contract_info("0x01").await);
    }
}

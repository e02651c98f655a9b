// src/core/entities/vasp_info.rs
use serde::{Deserialize, Serialize};

/// Self-declared identity attributes a VASP attaches to session messages.
///
/// `vasp_identity` is the on-chain identity (contract address) used to look up
/// the VASP's signing key in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaspInformation {
    pub name: String,
    pub vasp_identity: String,
    pub vasp_public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_address: Option<PostalAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bic: Option<String>,
}

impl VaspInformation {
    pub fn new(
        name: impl Into<String>,
        vasp_identity: impl Into<String>,
        vasp_public_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            vasp_identity: vasp_identity.into(),
            vasp_public_key: vasp_public_key.into(),
            postal_address: None,
            bic: None,
        }
    }

    pub fn with_postal_address(mut self, address: PostalAddress) -> Self {
        self.postal_address = Some(address);
        self
    }

    pub fn with_bic(mut self, bic: impl Into<String>) -> Self {
        self.bic = Some(bic.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    pub street_name: String,
    pub building_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line: Option<String>,
    pub post_code: String,
    pub town_name: String,
    pub country: String,
}

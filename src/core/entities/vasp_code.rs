// src/core/entities/vasp_code.rs
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{EntityError, Result};

/// Length of a VASP code in hex characters (4 bytes).
pub const VASP_CODE_LENGTH: usize = 8;

/// Short identifier of a VASP. Doubles as the public topic on which the VASP
/// receives session requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VaspCode(String);

impl VaspCode {
    pub fn new(code: &str) -> Result<Self> {
        let code = code.trim();
        if code.len() != VASP_CODE_LENGTH || !code.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(EntityError::InvalidVaspCode(code.to_string()));
        }

        Ok(Self(code.to_ascii_lowercase()))
    }

    pub fn code(&self) -> &str {
        &self.0
    }

    pub fn to_bytes(&self) -> [u8; 4] {
        let mut bytes = [0u8; 4];
        // Validated in `new`.
        let _ = hex::decode_to_slice(&self.0, &mut bytes);
        bytes
    }
}

impl fmt::Display for VaspCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VaspCode {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for VaspCode {
    type Error = EntityError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<VaspCode> for String {
    fn from(code: VaspCode) -> Self {
        code.0
    }
}

// src/core/entities/vaan.rs
//! Virtual Asset Account Number.
//!
//! A VAAN is the VASP code, followed by a customer-specific number, followed by
//! a one byte checksum. The checksum is the sum of every preceding byte modulo
//! 256. All three parts are written as lowercase hex.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{EntityError, Result};
use super::vasp_code::{VaspCode, VASP_CODE_LENGTH};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VirtualAssetsAccountNumber {
    vasp_code: VaspCode,
    customer_number: String,
    vaan: String,
}

impl VirtualAssetsAccountNumber {
    pub fn create(vasp_code: &str, customer_number_hex: &str) -> Result<Self> {
        let vasp_code = VaspCode::new(vasp_code)?;
        Self::with_code(vasp_code, customer_number_hex)
    }

    pub fn with_code(vasp_code: VaspCode, customer_number_hex: &str) -> Result<Self> {
        let customer_number = customer_number_hex.trim().to_ascii_lowercase();
        let customer_bytes = decode_customer_number(&customer_number)?;

        let checksum = checksum8_modulo256(&vasp_code.to_bytes())
            .wrapping_add(checksum8_modulo256(&customer_bytes));
        let vaan = format!("{}{}{:02x}", vasp_code, customer_number, checksum);

        Ok(Self {
            vasp_code,
            customer_number,
            vaan,
        })
    }

    /// Parses a full VAAN string and checks its trailing checksum byte.
    pub fn parse(vaan: &str) -> Result<Self> {
        let vaan = vaan.trim();
        let invalid = |reason: &str| EntityError::InvalidVaan(vaan.to_string(), reason.to_string());

        if vaan.len() < VASP_CODE_LENGTH + 4 {
            return Err(invalid("too short"));
        }
        if !vaan.is_ascii() {
            return Err(invalid("not hexadecimal"));
        }

        let (body, checksum_hex) = vaan.split_at(vaan.len() - 2);
        let expected = u8::from_str_radix(checksum_hex, 16).map_err(|_| invalid("not hexadecimal"))?;

        let (code, customer_number) = body.split_at(VASP_CODE_LENGTH);
        let parsed = Self::create(code, customer_number)?;

        if parsed.checksum() != expected {
            return Err(invalid("checksum mismatch"));
        }

        Ok(parsed)
    }

    pub fn vasp_code(&self) -> &VaspCode {
        &self.vasp_code
    }

    pub fn customer_number(&self) -> &str {
        &self.customer_number
    }

    pub fn vaan(&self) -> &str {
        &self.vaan
    }

    pub fn checksum(&self) -> u8 {
        let bytes = hex::decode(&self.vaan).unwrap_or_default();
        bytes.last().copied().unwrap_or_default()
    }
}

impl fmt::Display for VirtualAssetsAccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.vaan)
    }
}

fn decode_customer_number(customer_number: &str) -> Result<Vec<u8>> {
    if customer_number.is_empty() {
        return Err(EntityError::InvalidCustomerNumber(customer_number.to_string()));
    }

    hex::decode(customer_number)
        .map_err(|_| EntityError::InvalidCustomerNumber(customer_number.to_string()))
}

/// Sum of all bytes, truncated to the low 8 bits.
pub fn checksum8_modulo256(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, byte| acc.wrapping_add(*byte))
}

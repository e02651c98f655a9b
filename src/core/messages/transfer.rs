// src/core/messages/transfer.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::MessageHeader;
use crate::core::entities::VirtualAssetsAccountNumber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VirtualAsset {
    Btc,
    Eth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequestMessage {
    pub header: MessageHeader,
    pub originator_vaan: VirtualAssetsAccountNumber,
    pub beneficiary_vaan: VirtualAssetsAccountNumber,
    pub asset: VirtualAsset,
    pub amount: f64,
}

impl TransferRequestMessage {
    pub const MESSAGE_CODE: &'static str = "transfer_request";

    pub fn create(
        session_id: impl Into<String>,
        originator_vaan: VirtualAssetsAccountNumber,
        beneficiary_vaan: VirtualAssetsAccountNumber,
        asset: VirtualAsset,
        amount: f64,
    ) -> Self {
        Self {
            header: MessageHeader::new(session_id, Self::MESSAGE_CODE),
            originator_vaan,
            beneficiary_vaan,
            asset,
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferDispatchMessage {
    pub header: MessageHeader,
    pub transaction_id: String,
    pub sending_address: String,
    pub transaction_datetime: DateTime<Utc>,
}

impl TransferDispatchMessage {
    pub const MESSAGE_CODE: &'static str = "transfer_dispatch";

    pub fn create(
        session_id: impl Into<String>,
        transaction_id: impl Into<String>,
        sending_address: impl Into<String>,
    ) -> Self {
        Self {
            header: MessageHeader::new(session_id, Self::MESSAGE_CODE),
            transaction_id: transaction_id.into(),
            sending_address: sending_address.into(),
            transaction_datetime: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationMessage {
    pub header: MessageHeader,
}

impl TerminationMessage {
    pub const MESSAGE_CODE: &'static str = "termination";

    pub fn create(session_id: impl Into<String>) -> Self {
        Self {
            header: MessageHeader::new(session_id, Self::MESSAGE_CODE),
        }
    }
}

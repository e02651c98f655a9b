// src/core/messages/mod.rs
//! Protocol message catalogue.
//!
//! Every message travels inside a [`MessageEnvelope`]: the signed JSON payload
//! plus the decoded [`Message`] body.

mod envelope;
mod session;
mod transfer;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use envelope::{MessageEnvelope, MessageError};
pub use session::{
    HandShakeRequest, HandShakeResponse, SessionReplyCode, SessionReplyMessage,
    SessionRequestMessage,
};
pub use transfer::{
    TerminationMessage, TransferDispatchMessage, TransferRequestMessage, VirtualAsset,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    pub message_id: String,
    pub session_id: String,
    pub message_code: String,
}

impl MessageHeader {
    pub fn new(session_id: impl Into<String>, message_code: impl Into<String>) -> Self {
        Self {
            message_id: Uuid::new_v4().simple().to_string(),
            session_id: session_id.into(),
            message_code: message_code.into(),
        }
    }
}

/// Decoded body of a protocol message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "snake_case")]
pub enum Message {
    SessionRequest(SessionRequestMessage),
    SessionReply(SessionReplyMessage),
    TransferRequest(TransferRequestMessage),
    TransferDispatch(TransferDispatchMessage),
    Termination(TerminationMessage),
}

/// Runtime type of a [`Message`], used as the handler registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    SessionRequest,
    SessionReply,
    TransferRequest,
    TransferDispatch,
    Termination,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::SessionRequest(_) => MessageKind::SessionRequest,
            Message::SessionReply(_) => MessageKind::SessionReply,
            Message::TransferRequest(_) => MessageKind::TransferRequest,
            Message::TransferDispatch(_) => MessageKind::TransferDispatch,
            Message::Termination(_) => MessageKind::Termination,
        }
    }

    pub fn header(&self) -> &MessageHeader {
        match self {
            Message::SessionRequest(m) => &m.header,
            Message::SessionReply(m) => &m.header,
            Message::TransferRequest(m) => &m.header,
            Message::TransferDispatch(m) => &m.header,
            Message::Termination(m) => &m.header,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.header().session_id
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageKind::SessionRequest => "session_request",
            MessageKind::SessionReply => "session_reply",
            MessageKind::TransferRequest => "transfer_request",
            MessageKind::TransferDispatch => "transfer_dispatch",
            MessageKind::Termination => "termination",
        };
        f.write_str(name)
    }
}

impl From<SessionRequestMessage> for Message {
    fn from(message: SessionRequestMessage) -> Self {
        Message::SessionRequest(message)
    }
}

impl From<SessionReplyMessage> for Message {
    fn from(message: SessionReplyMessage) -> Self {
        Message::SessionReply(message)
    }
}

impl From<TransferRequestMessage> for Message {
    fn from(message: TransferRequestMessage) -> Self {
        Message::TransferRequest(message)
    }
}

impl From<TransferDispatchMessage> for Message {
    fn from(message: TransferDispatchMessage) -> Self {
        Message::TransferDispatch(message)
    }
}

impl From<TerminationMessage> for Message {
    fn from(message: TerminationMessage) -> Self {
        Message::Termination(message)
    }
}

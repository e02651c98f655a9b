// src/network/dispatch/error.rs
use thiserror::Error;

use crate::core::messages::MessageKind;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Handler for {kind} message {message_id} failed: {source}")]
    Handler {
        kind: MessageKind,
        message_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Handler for {kind} message {message_id} panicked: {reason}")]
    HandlerPanicked {
        kind: MessageKind,
        message_id: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, DispatchError>;

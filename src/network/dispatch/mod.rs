// src/network/dispatch/mod.rs
mod error;
mod handler;
mod queue;

pub use error::{DispatchError, Result};
pub use handler::{HandlerRegistry, HandlerRegistryBuilder, MessageHandler};
pub use queue::{FailurePolicy, MessageDispatchQueue};

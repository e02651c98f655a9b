// src/network/mod.rs
//! Transport seam, the session request listener, and the dispatch queue that
//! both sessions and tests drive messages through.

pub mod dispatch;
pub mod listener;
pub mod transport;

pub use dispatch::{FailurePolicy, HandlerRegistry, MessageDispatchQueue, MessageHandler};
pub use listener::{ListenerError, ListenerSettings, SessionCreatedHandler, SessionRequestListener};
pub use transport::{InMemoryTransport, Transport};

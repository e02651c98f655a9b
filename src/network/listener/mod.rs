// src/network/listener/mod.rs
mod error;
mod session_request;
mod subscriber;

pub use error::{ListenerError, Result};
pub use session_request::{ListenerSettings, SessionRequestListener, DEFAULT_POLL_INTERVAL};
pub use subscriber::SessionCreatedHandler;

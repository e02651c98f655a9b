// src/network/transport/mod.rs
mod error;
mod memory;
mod topic;
mod transport;

pub use error::{Result, TransportError};
pub use memory::InMemoryTransport;
pub use topic::{is_valid_topic, TopicGenerator, TOPIC_LENGTH};
pub use transport::{FilterHandle, KeyHandle, Transport};

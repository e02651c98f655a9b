// src/network/transport/topic.rs
use rand::rngs::OsRng;
use rand::RngCore;

/// Topics are 4 bytes, written as 8 lowercase hex characters.
pub const TOPIC_LENGTH: usize = 8;

pub struct TopicGenerator;

impl TopicGenerator {
    pub fn generate_session_topic() -> String {
        let mut bytes = [0u8; TOPIC_LENGTH / 2];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

pub fn is_valid_topic(topic: &str) -> bool {
    topic.len() == TOPIC_LENGTH && topic.chars().all(|c| c.is_ascii_hexdigit())
}

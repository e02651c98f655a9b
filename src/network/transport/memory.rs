// src/network/transport/memory.rs
//! Process-local transport.
//!
//! Keeps per-topic mailboxes in memory. A fetch through any filter on a topic
//! drains that topic's mailbox, so messages published before the filter was
//! created are still delivered.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, trace};
use uuid::Uuid;

use super::error::{Result, TransportError};
use super::topic::is_valid_topic;
use super::transport::{FilterHandle, KeyHandle, Transport};
use crate::core::messages::MessageEnvelope;

#[derive(Debug, Default)]
struct TransportState {
    key_pairs: HashMap<String, String>,
    sym_keys: HashMap<String, String>,
    filters: HashMap<FilterHandle, FilterEntry>,
    mailboxes: HashMap<String, VecDeque<MessageEnvelope>>,
    unavailable: Option<String>,
}

#[derive(Debug, Clone)]
struct FilterEntry {
    topic: String,
    key: KeyHandle,
}

#[derive(Debug, Default)]
pub struct InMemoryTransport {
    state: Mutex<TransportState>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with `TransportError::Unavailable` until
    /// [`InMemoryTransport::restore`] is called.
    pub fn fail_with(&self, reason: impl Into<String>) {
        self.state.lock().unavailable = Some(reason.into());
    }

    pub fn restore(&self) {
        self.state.lock().unavailable = None;
    }

    pub fn filter_count(&self) -> usize {
        self.state.lock().filters.len()
    }

    pub fn sym_key_count(&self) -> usize {
        self.state.lock().sym_keys.len()
    }

    pub fn filter_topic(&self, filter: &FilterHandle) -> Option<String> {
        self.state.lock().filters.get(filter).map(|f| f.topic.clone())
    }

    pub fn sym_key(&self, key: &KeyHandle) -> Option<String> {
        match key {
            KeyHandle::Symmetric(id) => self.state.lock().sym_keys.get(id).cloned(),
            KeyHandle::Asymmetric(_) => None,
        }
    }

    pub fn pending(&self, topic: &str) -> usize {
        self.state
            .lock()
            .mailboxes
            .get(topic)
            .map(VecDeque::len)
            .unwrap_or(0)
    }
}

impl TransportState {
    fn ensure_available(&self) -> Result<()> {
        match &self.unavailable {
            Some(reason) => Err(TransportError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }

    fn key_exists(&self, key: &KeyHandle) -> bool {
        match key {
            KeyHandle::Asymmetric(id) => self.key_pairs.contains_key(id),
            KeyHandle::Symmetric(id) => self.sym_keys.contains_key(id),
        }
    }
}

fn new_handle_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn register_key_pair(&self, private_key: &str) -> Result<KeyHandle> {
        let mut state = self.state.lock();
        state.ensure_available()?;

        let id = new_handle_id();
        state.key_pairs.insert(id.clone(), private_key.to_string());
        trace!(key_id = %id, "Registered key pair");
        Ok(KeyHandle::Asymmetric(id))
    }

    async fn register_sym_key(&self, secret: &str) -> Result<KeyHandle> {
        let mut state = self.state.lock();
        state.ensure_available()?;

        let id = new_handle_id();
        state.sym_keys.insert(id.clone(), secret.to_string());
        trace!(key_id = %id, "Registered symmetric key");
        Ok(KeyHandle::Symmetric(id))
    }

    async fn create_message_filter(&self, topic: &str, key: &KeyHandle) -> Result<FilterHandle> {
        let mut state = self.state.lock();
        state.ensure_available()?;

        if !is_valid_topic(topic) {
            return Err(TransportError::InvalidTopic(topic.to_string()));
        }
        if !state.key_exists(key) {
            return Err(TransportError::UnknownKey(key.to_string()));
        }

        let handle = FilterHandle(new_handle_id());
        state.filters.insert(
            handle.clone(),
            FilterEntry {
                topic: topic.to_ascii_lowercase(),
                key: key.clone(),
            },
        );
        debug!(filter = %handle, topic, key = %key, "Created message filter");
        Ok(handle)
    }

    async fn get_session_messages(&self, filter: &FilterHandle) -> Result<Vec<MessageEnvelope>> {
        let mut state = self.state.lock();
        state.ensure_available()?;

        let entry = state
            .filters
            .get(filter)
            .cloned()
            .ok_or_else(|| TransportError::UnknownFilter(filter.to_string()))?;
        trace!(filter = %filter, key = %entry.key, "Fetching messages");

        let messages: Vec<MessageEnvelope> = state
            .mailboxes
            .get_mut(&entry.topic)
            .map(|mailbox| mailbox.drain(..).collect())
            .unwrap_or_default();

        Ok(messages)
    }

    async fn publish(&self, topic: &str, envelope: MessageEnvelope) -> Result<()> {
        let mut state = self.state.lock();
        state.ensure_available()?;

        if !is_valid_topic(topic) {
            return Err(TransportError::InvalidTopic(topic.to_string()));
        }

        state
            .mailboxes
            .entry(topic.to_ascii_lowercase())
            .or_default()
            .push_back(envelope);
        trace!(topic, "Published message");
        Ok(())
    }
}

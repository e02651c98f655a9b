// src/network/dispatch/handler.rs
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::messages::{Message, MessageKind};

#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle_message(&self, message: &Message) -> anyhow::Result<()>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> MessageHandler for FnHandler<F>
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn handle_message(&self, message: &Message) -> anyhow::Result<()> {
        (self.0)(message.clone()).await
    }
}

/// Handlers per message kind, in registration order. Immutable once built.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<MessageKind, Vec<Arc<dyn MessageHandler>>>,
}

impl HandlerRegistry {
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    pub fn resolve(&self, kind: MessageKind) -> &[Arc<dyn MessageHandler>] {
        self.handlers.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }
}

#[derive(Default)]
pub struct HandlerRegistryBuilder {
    handlers: HashMap<MessageKind, Vec<Arc<dyn MessageHandler>>>,
}

impl HandlerRegistryBuilder {
    pub fn add_handler<H>(mut self, kind: MessageKind, handler: H) -> Self
    where
        H: MessageHandler + 'static,
    {
        self.handlers.entry(kind).or_default().push(Arc::new(handler));
        self
    }

    /// Registers a closure. It receives its own copy of the message.
    pub fn add_fn<F, Fut>(self, kind: MessageKind, handler: F) -> Self
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.add_handler(kind, FnHandler(handler))
    }

    pub fn build(self) -> Arc<HandlerRegistry> {
        Arc::new(HandlerRegistry {
            handlers: self.handlers,
        })
    }
}

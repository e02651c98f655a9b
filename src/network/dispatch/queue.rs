// src/network/dispatch/queue.rs
//! Producer/consumer queue that routes messages to their handlers on a single
//! background worker.
//!
//! Producers call [`MessageDispatchQueue::enqueue`] from anywhere. The worker
//! sleeps until woken, then drains the buffer one message at a time: pop under
//! the lock, release the lock, await every handler for that message in
//! registration order. Handlers therefore never run concurrently and observe
//! messages in enqueue order.

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};
use uuid::Uuid;

use super::error::{DispatchError, Result};
use super::handler::HandlerRegistry;
use crate::core::messages::Message;
use crate::utils::worker::{is_current_worker, panic_message, spawn_worker};

/// What the worker does when a handler fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the drain and stop the worker. Later messages are never handled.
    #[default]
    StopWorker,
    /// Log the failure and continue with the next message.
    Isolate,
}

#[derive(Default)]
struct QueueBuffer {
    messages: VecDeque<Message>,
    in_flight: bool,
    shutting_down: bool,
}

struct QueueShared {
    buffer: Mutex<QueueBuffer>,
    wake: Notify,
    idle: Notify,
    worker_done: AtomicBool,
    registry: Arc<HandlerRegistry>,
    policy: FailurePolicy,
}

pub struct MessageDispatchQueue {
    shared: Arc<QueueShared>,
    cancel: CancellationToken,
    worker: Mutex<Option<JoinHandle<Result<()>>>>,
    worker_id: Uuid,
}

impl MessageDispatchQueue {
    /// Starts the worker. Cancelling `parent` shuts the queue down the same way
    /// [`MessageDispatchQueue::dispose`] does, without waiting.
    pub fn new(registry: Arc<HandlerRegistry>, parent: &CancellationToken) -> Self {
        Self::with_policy(registry, parent, FailurePolicy::default())
    }

    pub fn with_policy(
        registry: Arc<HandlerRegistry>,
        parent: &CancellationToken,
        policy: FailurePolicy,
    ) -> Self {
        let shared = Arc::new(QueueShared {
            buffer: Mutex::new(QueueBuffer::default()),
            wake: Notify::new(),
            idle: Notify::new(),
            worker_done: AtomicBool::new(false),
            registry,
            policy,
        });
        let cancel = parent.child_token();
        let worker_id = Uuid::new_v4();

        let handle = spawn_worker(worker_id, run_worker(shared.clone(), cancel.clone()));

        Self {
            shared,
            cancel,
            worker: Mutex::new(Some(handle)),
            worker_id,
        }
    }

    /// Buffers `message` for the worker. Dropped silently once the queue is
    /// shutting down.
    pub fn enqueue(&self, message: impl Into<Message>) {
        let message = message.into();
        {
            let mut buffer = self.shared.buffer.lock();
            if buffer.shutting_down {
                trace!(kind = %message.kind(), "Dispatch queue shutting down, dropping message");
                return;
            }
            buffer.messages.push_back(message);
        }
        self.shared.wake.notify_one();
    }

    /// Waits until everything buffered so far has been handled, or until the
    /// worker has stopped. Worker errors are not reported here.
    pub async fn wait(&self) {
        // Called from a handler: the current message is ours, so waiting
        // for it would never finish.
        if is_current_worker(self.worker_id) {
            return;
        }

        loop {
            let idle = self.shared.idle.notified();
            tokio::pin!(idle);
            idle.as_mut().enable();

            if self.shared.is_idle() {
                return;
            }
            idle.await;
        }
    }

    /// Stops accepting messages, lets the worker finish its current and final
    /// drain, then releases it. Safe to call repeatedly and from inside a
    /// handler. Never fails.
    pub async fn dispose(&self) {
        self.shared.buffer.lock().shutting_down = true;
        self.cancel.cancel();
        self.shared.wake.notify_one();

        if is_current_worker(self.worker_id) {
            debug!("Dispatch queue disposed from its own handler, worker will exit after draining");
            return;
        }

        let handle = self.worker.lock().take();
        match handle {
            Some(handle) => match handle.await {
                Ok(Ok(())) => debug!("Dispatch queue stopped"),
                Ok(Err(e)) => debug!(error = %e, "Dispatch queue had stopped after a handler failure"),
                Err(e) => error!(error = %e, "Dispatch worker panicked or was aborted"),
            },
            None => self.wait().await,
        }
    }

    /// False once the worker has exited, either after disposal or after a
    /// handler failure under [`FailurePolicy::StopWorker`].
    pub fn is_running(&self) -> bool {
        !self.shared.worker_done.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.shared.buffer.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for MessageDispatchQueue {
    fn drop(&mut self) {
        self.shared.buffer.lock().shutting_down = true;
        self.cancel.cancel();
    }
}

impl QueueShared {
    fn is_idle(&self) -> bool {
        if self.worker_done.load(Ordering::SeqCst) {
            return true;
        }
        let buffer = self.buffer.lock();
        buffer.messages.is_empty() && !buffer.in_flight
    }

    async fn drain(&self) -> Result<()> {
        loop {
            let message = {
                let mut buffer = self.buffer.lock();
                match buffer.messages.pop_front() {
                    Some(message) => {
                        buffer.in_flight = true;
                        message
                    }
                    None => {
                        buffer.in_flight = false;
                        break;
                    }
                }
            };

            if let Err(e) = self.route(&message).await {
                match self.policy {
                    FailurePolicy::StopWorker => return Err(e),
                    FailurePolicy::Isolate => warn!(error = %e, "Message handler failed, continuing"),
                }
            }
        }

        self.idle.notify_waiters();
        Ok(())
    }

    async fn route(&self, message: &Message) -> Result<()> {
        let kind = message.kind();
        let handlers = self.registry.resolve(kind);
        if handlers.is_empty() {
            debug!(%kind, "No handlers registered, message discarded");
            return Ok(());
        }

        for handler in handlers {
            let outcome = AssertUnwindSafe(handler.handle_message(message))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(source)) => {
                    return Err(DispatchError::Handler {
                        kind,
                        message_id: message.header().message_id.clone(),
                        source,
                    })
                }
                Err(payload) => {
                    return Err(DispatchError::HandlerPanicked {
                        kind,
                        message_id: message.header().message_id.clone(),
                        reason: panic_message(&*payload),
                    })
                }
            }
        }

        Ok(())
    }

    fn finish(&self) {
        {
            let mut buffer = self.buffer.lock();
            buffer.shutting_down = true;
            buffer.in_flight = false;
        }
        self.worker_done.store(true, Ordering::SeqCst);
        self.idle.notify_waiters();
    }
}

/// Marks the worker finished on every exit path, unwinding included.
struct FinishGuard(Arc<QueueShared>);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.finish();
    }
}

async fn run_worker(shared: Arc<QueueShared>, cancel: CancellationToken) -> Result<()> {
    let _finish = FinishGuard(shared.clone());
    let result = async {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = shared.wake.notified() => {}
            }
            shared.drain().await?;
        }

        // Buffered but unprocessed messages get one last attempt.
        shared.buffer.lock().shutting_down = true;
        shared.drain().await
    }
    .await;

    if let Err(e) = &result {
        error!(error = %e, "Dispatch worker stopped");
    }
    result
}

// src/utils/worker.rs
//! Background task bookkeeping shared by the dispatch queue and the session
//! listener.

use std::any::Any;
use std::future::Future;

use tokio::task::JoinHandle;
use uuid::Uuid;

tokio::task_local! {
    static CURRENT_WORKER: Uuid;
}

/// Spawns `future` onto the runtime, tagged with `worker_id` so that code
/// running inside it can detect it is on that worker.
pub fn spawn_worker<F>(worker_id: Uuid, future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(CURRENT_WORKER.scope(worker_id, future))
}

/// True when called from inside the worker spawned with `worker_id`. A worker
/// must never await its own join handle.
pub fn is_current_worker(worker_id: Uuid) -> bool {
    CURRENT_WORKER
        .try_with(|current| *current == worker_id)
        .unwrap_or(false)
}

/// Text of a caught panic payload, for logging.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

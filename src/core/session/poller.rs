// src/core/session/poller.rs
//! Background polling for established sessions.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::beneficiary::BeneficiarySession;

/// Polls every session handed to it until the originator terminates the
/// session, the transport gives up on it, or the poller shuts down. Each
/// session is closed when its task exits.
#[derive(Clone)]
pub struct SessionPoller {
    poll_interval: Duration,
    cancel: CancellationToken,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl SessionPoller {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            cancel: CancellationToken::new(),
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Starts polling `session`. A session spawned after shutdown is closed
    /// straight away.
    pub fn spawn(&self, session: Arc<BeneficiarySession>) {
        let handle = tokio::spawn(poll_session(
            session,
            self.poll_interval,
            self.cancel.child_token(),
        ));

        let mut tasks = self.tasks.lock();
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }

    /// Sessions still being polled.
    pub fn active(&self) -> usize {
        self.tasks.lock().iter().filter(|task| !task.is_finished()).count()
    }

    /// Stops every polling task and waits for its session to close.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let tasks = std::mem::take(&mut *self.tasks.lock());
        let stopped = tasks.len();

        for result in join_all(tasks).await {
            if let Err(e) = result {
                error!(error = %e, "Session poll task panicked");
            }
        }
        debug!(stopped, "Session poller shut down");
    }
}

async fn poll_session(session: Arc<BeneficiarySession>, poll_interval: Duration, cancel: CancellationToken) {
    loop {
        let polled = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            polled = session.poll() => polled,
        };
        if let Err(e) = polled {
            warn!(session_id = %session.id(), error = %e, "Stopped polling session");
            break;
        }
        if session.is_terminated() {
            info!(session_id = %session.id(), "Session terminated, polling stopped");
            break;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(poll_interval) => {}
        }
    }

    session.close().await;
}

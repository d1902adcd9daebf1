//! HTTP beacon: posts each form from a background worker.
//!
//! Submissions go into a bounded queue and return immediately. One worker
//! thread drains the queue with its own single-threaded runtime. Dropping
//! the beacon closes the queue and waits up to the unload grace period for
//! the worker to finish what was accepted. After that the worker is detached
//! and keeps going on its own.

use super::Beacon;
use crate::error::{Error, Result};
use crate::record::FormData;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Queue size used by [`HttpBeacon::new`].
pub const DEFAULT_QUEUE_CAPACITY: usize = 1_024;

/// How long dropping the beacon waits for queued posts.
pub const DEFAULT_UNLOAD_GRACE: Duration = Duration::from_secs(2);

struct Outgoing {
    endpoint: String,
    form: FormData,
}

pub struct HttpBeacon {
    sender: Option<Sender<Outgoing>>,
    worker: Option<JoinHandle<()>>,
    /// Disconnects when the worker exits
    finished: Receiver<()>,
    unload_grace: Duration,
}

impl HttpBeacon {
    pub fn new() -> Result<Self> {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Transport(format!("Failed to create runtime: {e}")))?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Transport(format!("Failed to create HTTP client: {e}")))?;

        let (sender, receiver) = bounded(capacity);
        let (done, finished) = bounded::<()>(0);

        let worker = thread::Builder::new()
            .name("beacon-worker".to_string())
            .spawn(move || {
                let _done = done;
                run_worker(runtime, client, receiver);
            })?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            finished,
            unload_grace: DEFAULT_UNLOAD_GRACE,
        })
    }

    /// Set how long drop waits for queued posts before detaching the worker.
    pub fn with_unload_grace(mut self, grace: Duration) -> Self {
        self.unload_grace = grace;
        self
    }

    /// Beacons accepted but not yet picked up by the worker.
    pub fn pending(&self) -> usize {
        self.sender.as_ref().map(|s| s.len()).unwrap_or(0)
    }
}

impl Beacon for HttpBeacon {
    fn send_beacon(&self, endpoint: &str, form: FormData) -> bool {
        let Some(sender) = &self.sender else {
            return false;
        };

        let outgoing = Outgoing {
            endpoint: endpoint.to_string(),
            form,
        };
        match sender.try_send(outgoing) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(capacity = ?sender.capacity(), "Beacon queue full");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

impl Drop for HttpBeacon {
    fn drop(&mut self) {
        // Closing the queue lets the worker drain it and exit.
        self.sender.take();
        let Some(worker) = self.worker.take() else {
            return;
        };
        match self.finished.recv_timeout(self.unload_grace) {
            Err(RecvTimeoutError::Timeout) => {
                tracing::debug!(
                    grace_ms = self.unload_grace.as_millis() as u64,
                    "Beacon worker still busy, detaching"
                );
            }
            _ => {
                let _ = worker.join();
            }
        }
    }
}

fn run_worker(
    runtime: tokio::runtime::Runtime,
    client: reqwest::Client,
    receiver: Receiver<Outgoing>,
) {
    for outgoing in receiver.iter() {
        runtime.block_on(post(&client, outgoing));
    }
    tracing::debug!("Beacon worker stopped");
}

async fn post(client: &reqwest::Client, outgoing: Outgoing) {
    let result = client
        .post(&outgoing.endpoint)
        .form(outgoing.form.entries())
        .send()
        .await;

    match result {
        Ok(response) => {
            tracing::debug!(
                endpoint = %outgoing.endpoint,
                status = response.status().as_u16(),
                "Beacon delivered"
            );
        }
        Err(e) => {
            tracing::debug!(endpoint = %outgoing.endpoint, error = %e, "Beacon failed");
        }
    }
}

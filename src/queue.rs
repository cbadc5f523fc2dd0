//! Transport queues connecting the pipeline roles
//!
//! Two instances wire the pipeline: `WorkQueue` (planner -> workers) and
//! `ReviewQueue` (workers -> judge). Frames are canonical field-tagged JSON,
//! so a consumer built independently of the producer can decode them; a frame
//! that fails to decode is logged and dropped without disturbing the
//! consuming loop.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::domain::{WorkItem, WorkResult};
use crate::error::{CoordinatorError, Result};

/// Planner -> worker channel
pub type WorkQueue = TransportQueue<WorkItem>;
/// Worker -> judge channel
pub type ReviewQueue = TransportQueue<WorkResult>;

/// Strict-FIFO channel with timeout-bounded blocking pop.
///
/// Each pushed value is eventually visible to exactly one pop. Multiple
/// consumers serialize on the receiver; ordering across producers is
/// whatever order their pushes land in.
pub struct TransportQueue<T> {
    name: String,
    tx: mpsc::UnboundedSender<Vec<u8>>,
    rx: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    depth: AtomicUsize,
    enqueued: AtomicU64,
    dequeued: AtomicU64,
    malformed: AtomicU64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TransportQueue<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(name: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            name: name.into(),
            tx,
            rx: Mutex::new(rx),
            depth: AtomicUsize::new(0),
            enqueued: AtomicU64::new(0),
            dequeued: AtomicU64::new(0),
            malformed: AtomicU64::new(0),
            _marker: PhantomData,
        }
    }

    /// Append to the tail. Never reorders; fails only once the queue has been
    /// disconnected.
    pub fn push(&self, item: &T) -> Result<()> {
        let frame = serde_json::to_vec(item)?;
        self.tx
            .send(frame)
            .map_err(|_| CoordinatorError::QueueClosed {
                queue: self.name.clone(),
            })?;
        self.depth.fetch_add(1, Ordering::Relaxed);
        self.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Remove and return the head, blocking up to `timeout`.
    ///
    /// `None` means timeout (or disconnected-and-drained), not an error: the
    /// caller's loop uses it to re-check its cancellation flag. Malformed
    /// frames are dropped with a warning and do not consume the timeout slot.
    pub async fn pop(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut rx = self.rx.lock().await;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            match tokio::time::timeout(remaining, rx.recv()).await {
                // Timeout elapsed with nothing to deliver
                Err(_) => return None,
                // Disconnected and fully drained
                Ok(None) => return None,
                Ok(Some(frame)) => {
                    self.depth.fetch_sub(1, Ordering::Relaxed);
                    match serde_json::from_slice::<T>(&frame) {
                        Ok(item) => {
                            self.dequeued.fetch_add(1, Ordering::Relaxed);
                            return Some(item);
                        }
                        Err(e) => {
                            self.malformed.fetch_add(1, Ordering::Relaxed);
                            warn!(
                                queue = %self.name,
                                error = %e,
                                "dropping malformed queue entry"
                            );
                            continue;
                        }
                    }
                }
            }
        }
    }

    /// Advisory depth probe; may be stale the instant it returns.
    pub fn len(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Disconnect the queue: subsequent pushes fail, already-buffered frames
    /// remain poppable until drained.
    pub async fn close(&self) {
        self.rx.lock().await.close();
        debug!(queue = %self.name, "queue disconnected");
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            name: self.name.clone(),
            current_depth: self.len(),
            enqueued_total: self.enqueued.load(Ordering::Relaxed),
            dequeued_total: self.dequeued.load(Ordering::Relaxed),
            malformed_total: self.malformed.load(Ordering::Relaxed),
        }
    }
}

/// Queue statistics
#[derive(Debug, Clone)]
pub struct QueueStats {
    pub name: String,
    pub current_depth: usize,
    pub enqueued_total: u64,
    pub dequeued_total: u64,
    pub malformed_total: u64,
}

impl std::fmt::Display for QueueStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}[depth={}, enq={}, deq={}, bad={}]",
            self.name,
            self.current_depth,
            self.enqueued_total,
            self.dequeued_total,
            self.malformed_total
        )
    }
}

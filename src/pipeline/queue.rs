//! Bounded check queue.
//!
//! Submitted checks wait here between enqueue and worker pickup. The queue
//! is split by priority: interactive submissions can jump ahead of bulk
//! ones. Depth is tracked atomically across both lanes so concurrent
//! submissions cannot overshoot the configured capacity.

use crate::config::QueueConfig;
use crate::store::InputType;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::mpsc;

/// Priority level for queued checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Normal,
}

/// A check waiting for a worker.
///
/// Carries just enough to run the pipeline; the full record lives in the
/// store and is re-read under the processing claim.
#[derive(Debug, Clone)]
pub struct CheckJob {
    pub check_id: String,
    pub organization_id: String,
    pub text: String,
    pub priority: Priority,
    pub input_type: InputType,
}

/// Errors from queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Queue is at capacity.
    #[error("Check queue is full ({max_size} checks)")]
    Full { max_size: u32 },

    /// Queuing is disabled by configuration.
    #[error("Check queuing is disabled")]
    Disabled,
}

/// Bounded dual-priority queue feeding the worker pool.
///
/// High-priority jobs are dequeued before normal-priority jobs; within a
/// lane, order is FIFO. Total depth across both lanes respects `max_size`
/// from config, enforced with a CAS loop so that concurrent enqueues
/// cannot race past the limit.
pub struct CheckQueue {
    high_tx: mpsc::Sender<CheckJob>,
    high_rx: tokio::sync::Mutex<mpsc::Receiver<CheckJob>>,
    normal_tx: mpsc::Sender<CheckJob>,
    normal_rx: tokio::sync::Mutex<mpsc::Receiver<CheckJob>>,
    depth: AtomicUsize,
    config: QueueConfig,
}

impl CheckQueue {
    pub fn new(config: QueueConfig) -> Self {
        // Each lane can hold up to the full capacity; the shared depth
        // counter enforces the combined limit.
        let capacity = (config.max_size as usize).max(1);
        let (high_tx, high_rx) = mpsc::channel(capacity);
        let (normal_tx, normal_rx) = mpsc::channel(capacity);

        Self {
            high_tx,
            high_rx: tokio::sync::Mutex::new(high_rx),
            normal_tx,
            normal_rx: tokio::sync::Mutex::new(normal_rx),
            depth: AtomicUsize::new(0),
            config,
        }
    }

    /// Enqueue a job. Fails immediately when disabled or at capacity; the
    /// caller is responsible for marking the check failed in that case.
    pub fn enqueue(&self, job: CheckJob) -> Result<(), QueueError> {
        if !self.config.is_enabled() {
            return Err(QueueError::Disabled);
        }

        // CAS loop to atomically check-and-increment depth, preventing a
        // TOCTOU race between concurrent submissions.
        loop {
            let current = self.depth.load(Ordering::SeqCst);
            if current >= self.config.max_size as usize {
                return Err(QueueError::Full {
                    max_size: self.config.max_size,
                });
            }
            if self
                .depth
                .compare_exchange(current, current + 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                break;
            }
        }
        metrics::gauge!("yakulint_queue_depth").set(self.depth() as f64);

        let tx = match job.priority {
            Priority::High => &self.high_tx,
            Priority::Normal => &self.normal_tx,
        };
        if tx.try_send(job).is_err() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            metrics::gauge!("yakulint_queue_depth").set(self.depth() as f64);
            return Err(QueueError::Full {
                max_size: self.config.max_size,
            });
        }

        Ok(())
    }

    /// Wait for the next job, high lane first. Returns `None` once the
    /// queue is closed and drained. Workers share the receivers behind
    /// mutexes; contention is negligible against inference latency.
    pub async fn dequeue(&self) -> Option<CheckJob> {
        let job = {
            let mut high = self.high_rx.lock().await;
            match high.try_recv() {
                Ok(job) => Some(job),
                Err(_) => {
                    // Both lanes empty; wait on whichever fills first,
                    // preferring high when both are ready.
                    let mut normal = self.normal_rx.lock().await;
                    tokio::select! {
                        biased;
                        job = high.recv() => job,
                        job = normal.recv() => job,
                    }
                }
            }
        };
        if job.is_some() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            metrics::gauge!("yakulint_queue_depth").set(self.depth() as f64);
        }
        job
    }

    /// Non-blocking variant used by the shutdown drain. High lane first.
    pub async fn try_dequeue(&self) -> Option<CheckJob> {
        let job = {
            let mut high = self.high_rx.lock().await;
            high.try_recv().ok()
        };
        let job = match job {
            Some(job) => Some(job),
            None => {
                let mut normal = self.normal_rx.lock().await;
                normal.try_recv().ok()
            }
        };
        if job.is_some() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            metrics::gauge!("yakulint_queue_depth").set(self.depth() as f64);
        }
        job
    }

    /// Current queue depth across both lanes.
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }
}

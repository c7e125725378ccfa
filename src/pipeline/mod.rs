//! Asynchronous check-processing pipeline.
//!
//! Submission enqueues a [`queue::CheckJob`]; the worker pool drains the
//! queue, runs the gateway and extractor, and writes terminal results to
//! the store while streaming progress through the realtime hub.

pub mod prompt;
pub mod queue;
pub mod worker;

pub use queue::{CheckJob, CheckQueue, Priority, QueueError};
pub use worker::{start_workers, WorkerContext};

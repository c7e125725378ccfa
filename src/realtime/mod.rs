//! Realtime delivery of check progress.
//!
//! One broadcast channel per check id, created lazily by the first
//! subscriber and torn down when the last one detaches. Events published
//! while nobody is listening are dropped; clients that connect late get
//! the current state from the store (see the SSE handler) and polling
//! remains the fallback when no stream is open at all.

use crate::store::Violation;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Buffered events per subscriber before lag kicks in.
const CHANNEL_CAPACITY: usize = 64;

/// Progress event for one check, in lifecycle order.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckEvent {
    Queued,
    Processing,
    Completed {
        modified_text: String,
        violations: Vec<Violation>,
    },
    Failed {
        error: String,
    },
    /// A subscriber fell behind and lost events; it should re-fetch the
    /// check instead of trusting the stream.
    DeliveryError,
}

impl CheckEvent {
    /// Terminal events end the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckEvent::Completed { .. } | CheckEvent::Failed { .. })
    }
}

/// Per-check event hub shared between workers and stream handlers.
#[derive(Default)]
pub struct CheckEvents {
    channels: DashMap<String, broadcast::Sender<CheckEvent>>,
}

impl CheckEvents {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Publish an event to whoever is subscribed to this check.
    ///
    /// Returns the number of subscribers that received it. Zero is
    /// normal: nobody has to be listening for the pipeline to proceed.
    pub fn publish(&self, check_id: &str, event: CheckEvent) -> usize {
        match self.channels.get(check_id) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        }
    }

    /// Attach a subscriber to this check's event stream.
    pub fn subscribe(self: &Arc<Self>, check_id: &str) -> Subscription {
        let receiver = self
            .channels
            .entry(check_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe();

        Subscription {
            receiver: Some(receiver),
            hub: self.clone(),
            check_id: check_id.to_string(),
        }
    }

    /// Number of checks with at least one live channel.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn detach(&self, check_id: &str) {
        // The entry lock makes the count check and removal atomic
        // against a concurrent subscribe.
        self.channels.remove_if(check_id, |_, sender| {
            if sender.receiver_count() == 0 {
                debug!(check_id, "Last subscriber detached; dropping event channel");
                true
            } else {
                false
            }
        });
    }
}

/// A live subscription; dropping it detaches from the hub.
pub struct Subscription {
    /// Present until drop; taken out so the receiver is released before
    /// the hub inspects the remaining subscriber count.
    receiver: Option<broadcast::Receiver<CheckEvent>>,
    hub: Arc<CheckEvents>,
    check_id: String,
}

impl Subscription {
    /// Next event, or `None` when the channel is gone.
    ///
    /// A lagged subscriber gets one [`CheckEvent::DeliveryError`] in
    /// place of the events it lost, then continues with live events.
    pub async fn next_event(&mut self) -> Option<CheckEvent> {
        let receiver = self.receiver.as_mut()?;
        match receiver.recv().await {
            Ok(event) => Some(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(check_id = %self.check_id, skipped, "Subscriber lagged");
                Some(CheckEvent::DeliveryError)
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        drop(self.receiver.take());
        self.hub.detach(&self.check_id);
    }
}

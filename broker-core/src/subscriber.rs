//! Subscriber Session

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::{BrokerConfig, OverflowPolicy};
use crate::message::DeliveryFrame;
use crate::queue::{DeliveryQueue, EnqueueOutcome};
use crate::transport::Transport;

/// A single connected consumer of one topic.
///
/// Exclusively owned by the `Topic` it is subscribed to. Holds a
/// `Transport` handle so the broker can push `info` frames directly,
/// bypassing the delivery queue, for deletion/shutdown notifications.
pub struct Subscriber {
    pub client_id: String,
    pub transport: Arc<dyn Transport>,
    queue: DeliveryQueue,
    active: AtomicBool,
    overflow_policy: OverflowPolicy,
}

impl Subscriber {
    pub fn new(client_id: String, transport: Arc<dyn Transport>, config: &BrokerConfig) -> Self {
        Self {
            client_id,
            transport,
            queue: DeliveryQueue::new(config.max_subscriber_queue_size),
            active: AtomicBool::new(true),
            overflow_policy: config.overflow_policy,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Non-blocking enqueue with the subscriber's configured overflow
    /// policy. Under `DisconnectOnFull`, a would-be drop instead
    /// rejects the frame and closes the transport; the caller (fan-out)
    /// still only sees a `Rejected`/`DroppedOldest` outcome, never panics.
    pub fn enqueue(&self, frame: DeliveryFrame) -> EnqueueOutcome {
        if !self.is_active() {
            return EnqueueOutcome::Rejected;
        }

        if self.overflow_policy == OverflowPolicy::DisconnectOnFull && self.queue.len() >= self.capacity()
        {
            self.deactivate();
            let transport = Arc::clone(&self.transport);
            tokio::spawn(async move {
                let _ = transport
                    .send_error(None, "slow_consumer", "subscriber queue full")
                    .await;
                transport.close().await;
            });
            return EnqueueOutcome::Rejected;
        }

        let topic = frame.topic.clone();
        let outcome = self.queue.enqueue(frame);
        if outcome == EnqueueOutcome::DroppedOldest {
            tracing::warn!(client_id = %self.client_id, topic = %topic, "dropped oldest queued message: subscriber queue full");
        }
        outcome
    }

    /// Blocking dequeue for the Delivery Pump.
    pub async fn next(&self) -> Option<DeliveryFrame> {
        self.queue.next().await
    }

    /// Deactivate the subscriber: reject further enqueues, wake any
    /// waiting pump so it can drain and exit.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
        self.queue.close();
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn dropped_count(&self) -> u64 {
        self.queue.dropped()
    }

    fn capacity(&self) -> usize {
        self.queue.capacity()
    }
}

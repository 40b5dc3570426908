//! Bounded, single-producer/single-consumer delivery queue with a
//! drop-oldest overflow policy.
//!
//! Grounded on the producer/consumer queue pattern used for WebSocket
//! outbound buffering elsewhere in the corpus (a `VecDeque` behind a
//! synchronous mutex, woken via `Notify`), simplified here to plain FIFO
//! since fan-out has no priority concept.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::message::DeliveryFrame;

/// Result of a single `enqueue` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Delivered,
    DroppedOldest,
    Rejected,
}

struct Inner {
    buffer: VecDeque<DeliveryFrame>,
    capacity: usize,
    dropped: u64,
    closed: bool,
}

/// A bounded FIFO queue of pending deliveries for one subscriber.
///
/// `enqueue` is synchronous and non-blocking, called from inside a topic
/// lock during fan-out. `next` is the async, cancellation-aware dequeue
/// used by the Delivery Pump.
pub struct DeliveryQueue {
    inner: Mutex<Inner>,
    notify: Notify,
}

impl DeliveryQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                buffer: VecDeque::with_capacity(capacity.min(1024)),
                capacity,
                dropped: 0,
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    /// Non-blocking insert with drop-oldest overflow.
    ///
    /// Returns `Rejected` only if the queue has already been closed; a
    /// closed queue never accepts new frames regardless of occupancy.
    pub fn enqueue(&self, frame: DeliveryFrame) -> EnqueueOutcome {
        let mut inner = self.inner.lock();
        if inner.closed {
            return EnqueueOutcome::Rejected;
        }

        let outcome = if inner.buffer.len() < inner.capacity {
            inner.buffer.push_back(frame);
            EnqueueOutcome::Delivered
        } else {
            inner.buffer.pop_front();
            inner.buffer.push_back(frame);
            inner.dropped += 1;
            EnqueueOutcome::DroppedOldest
        };

        drop(inner);
        self.notify.notify_one();
        outcome
    }

    /// Blocking dequeue. Returns `None` once the queue is closed and fully
    /// drained: the "final drain" deactivation strategy.
    pub async fn next(&self) -> Option<DeliveryFrame> {
        loop {
            {
                let mut inner = self.inner.lock();
                if let Some(frame) = inner.buffer.pop_front() {
                    return Some(frame);
                }
                if inner.closed {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }

    /// Mark the queue closed. Subsequent `enqueue` calls are rejected;
    /// `next` drains whatever remains, then returns `None`.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        drop(inner);
        self.notify.notify_waiters();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().buffer.len()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().buffer.is_empty()
    }

    pub fn dropped(&self) -> u64 {
        self.inner.lock().dropped
    }

    /// Snapshot of currently queued frames, oldest-first. Test/diagnostic
    /// use only; not part of the delivery path.
    #[cfg(test)]
    pub fn snapshot(&self) -> Vec<DeliveryFrame> {
        self.inner.lock().buffer.iter().cloned().collect()
    }
}

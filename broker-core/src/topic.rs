//! Topic

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;

use crate::config::BrokerConfig;
use crate::error::BrokerError;
use crate::message::{DeliveryFrame, HistoryEntry, Message};
use crate::subscriber::Subscriber;
use crate::transport::Transport;

/// Subscriber set, history ring, and message counter for one topic,
/// protected by a single mutex so that publish/history/subscriber-mutation
/// calls are each atomic with respect to one another: the topic lock is
/// held for the full duration of a single call.
struct TopicState {
    subscribers: HashMap<String, Arc<Subscriber>>,
    history: VecDeque<HistoryEntry>,
    message_count: u64,
}

/// A named pub/sub channel: a subscriber set plus a bounded replay ring.
pub struct Topic {
    name: String,
    state: Mutex<TopicState>,
    history_capacity: usize,
}

impl Topic {
    pub fn new(name: impl Into<String>, history_capacity: usize) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(TopicState {
                subscribers: HashMap::new(),
                history: VecDeque::with_capacity(history_capacity.min(1024)),
                message_count: 0,
            }),
            history_capacity,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Atomically snapshot up to `last_n` history entries (oldest-first)
    /// and insert a freshly constructed subscriber for `client_id`, in that
    /// order, under one topic-lock acquisition, so no message can land in
    /// both the returned history and the live stream.
    ///
    /// Rejects with `DuplicateClient` if `client_id` is already subscribed
    /// to this topic, rather than silently replacing the existing one.
    pub fn subscribe(
        &self,
        client_id: &str,
        transport: Arc<dyn Transport>,
        last_n: i64,
        config: &BrokerConfig,
    ) -> Result<(Arc<Subscriber>, Vec<HistoryEntry>), BrokerError> {
        let mut state = self.state.lock();

        if state.subscribers.contains_key(client_id) {
            return Err(BrokerError::DuplicateClient {
                topic: self.name.clone(),
                client_id: client_id.to_string(),
            });
        }

        let history = snapshot_last_n(&state.history, last_n);

        let subscriber = Arc::new(Subscriber::new(client_id.to_string(), transport, config));
        state
            .subscribers
            .insert(client_id.to_string(), Arc::clone(&subscriber));

        Ok((subscriber, history))
    }

    /// Remove a subscriber by client id, deactivating it. Returns whether a
    /// removal occurred.
    pub fn remove_subscriber(&self, client_id: &str) -> bool {
        let removed = self.state.lock().subscribers.remove(client_id);
        match removed {
            Some(sub) => {
                sub.deactivate();
                true
            }
            None => false,
        }
    }

    /// Append to history and fan out to every active subscriber.
    /// Returns the number of subscribers that accepted the frame
    /// (delivered or dropped-oldest; rejected subscribers are not counted).
    pub fn publish(&self, message: Message) -> usize {
        let ts = Utc::now();
        let mut state = self.state.lock();

        state.history.push_back(HistoryEntry {
            message: message.clone(),
            ts,
        });
        if state.history.len() > self.history_capacity {
            state.history.pop_front();
        }
        state.message_count += 1;

        let frame = DeliveryFrame {
            topic: self.name.clone(),
            message,
            ts,
        };

        let mut delivered = 0usize;
        for sub in state.subscribers.values() {
            if !sub.is_active() {
                continue;
            }
            use crate::queue::EnqueueOutcome::*;
            match sub.enqueue(frame.clone()) {
                Delivered | DroppedOldest => delivered += 1,
                Rejected => {}
            }
        }
        delivered
    }

    /// Return up to the last `last_n` history entries, oldest-first.
    pub fn history(&self, last_n: i64) -> Vec<HistoryEntry> {
        let state = self.state.lock();
        snapshot_last_n(&state.history, last_n)
    }

    pub fn message_count(&self) -> u64 {
        self.state.lock().message_count
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }

    /// Sum of dropped-oldest evictions across every current subscriber of
    /// this topic. Exposed as the optional `dropped_total` counter on
    /// `stats()`: overflow drops are otherwise silent to subscribers and
    /// observable only through the `tracing::warn!` emitted by
    /// `Subscriber::enqueue`.
    pub fn dropped_total(&self) -> u64 {
        self.state
            .lock()
            .subscribers
            .values()
            .map(|s| s.dropped_count())
            .sum()
    }

    /// Snapshot of every current subscriber's transport handle, used by the
    /// Shutdown Coordinator to close connections once the drain window has
    /// elapsed.
    pub fn transports(&self) -> Vec<Arc<dyn Transport>> {
        self.state
            .lock()
            .subscribers
            .values()
            .map(|s| Arc::clone(&s.transport))
            .collect()
    }

    /// Deactivate and notify every subscriber directly through its
    /// transport, bypassing the delivery queue. Used for topic deletion and
    /// shutdown; transport failures are logged and do not abort the sweep.
    pub async fn notify_and_deactivate_all(&self, msg: &'static str) {
        let subs: Vec<Arc<Subscriber>> = {
            let state = self.state.lock();
            state.subscribers.values().cloned().collect()
        };

        for sub in subs {
            if let Err(e) = sub.transport.send_info(Some(self.name.clone()), msg).await {
                tracing::warn!(
                    client_id = %sub.client_id,
                    topic = %self.name,
                    error = %e,
                    "failed to deliver info frame during topic teardown"
                );
            }
            sub.deactivate();
        }
    }
}

fn snapshot_last_n(history: &VecDeque<HistoryEntry>, last_n: i64) -> Vec<HistoryEntry> {
    if last_n <= 0 {
        return Vec::new();
    }
    let last_n = last_n as usize;
    let len = history.len();
    let skip = len.saturating_sub(last_n);
    history.iter().skip(skip).cloned().collect()
}

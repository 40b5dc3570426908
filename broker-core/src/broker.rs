//! Broker registry: process-wide topic map plus the coarse registry lock
//! that serializes topic lifecycle transitions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use crate::config::BrokerConfig;
use crate::error::BrokerError;
use crate::message::{HistoryEntry, Message};
use crate::subscriber::Subscriber;
use crate::topic::Topic;
use crate::transport::Transport;

/// Outcome of `Broker::create_topic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    Exists,
}

/// Outcome of `Broker::delete_topic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Absent,
}

/// Per-topic snapshot returned by `list`/`stats`.
#[derive(Debug, Clone)]
pub struct TopicStats {
    pub name: String,
    pub message_count: u64,
    pub subscriber_count: usize,
    /// Sum of dropped-oldest evictions across this topic's current
    /// subscribers. Optional, observability-only; never affects delivery
    /// semantics.
    pub dropped_total: u64,
}

/// Process-wide topic registry. Constructed once and threaded through as an
/// explicit `Arc<Broker>` dependency, never accessed as a global singleton.
pub struct Broker {
    topics: RwLock<HashMap<String, Arc<Topic>>>,
    config: BrokerConfig,
    started_at: Instant,
}

impl Broker {
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            config,
            started_at: Instant::now(),
        }
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Atomically check-and-insert a new topic.
    pub fn create_topic(&self, name: &str) -> CreateOutcome {
        let mut topics = self.topics.write();
        if topics.contains_key(name) {
            return CreateOutcome::Exists;
        }
        topics.insert(
            name.to_string(),
            Arc::new(Topic::new(name, self.config.topic_history_size)),
        );
        CreateOutcome::Created
    }

    /// Remove a topic and notify its subscribers of deletion. The registry
    /// lock is released before the (async) notification sweep runs so that
    /// other topics' traffic is never blocked on it.
    pub async fn delete_topic(&self, name: &str) -> DeleteOutcome {
        let removed = self.topics.write().remove(name);
        match removed {
            Some(topic) => {
                topic.notify_and_deactivate_all("topic_deleted").await;
                DeleteOutcome::Deleted
            }
            None => DeleteOutcome::Absent,
        }
    }

    /// Look up a topic, subscribe `client_id` to it under the topic's own
    /// lock, and return the subscriber plus its history snapshot. The
    /// registry lock is held only long enough to clone the `Arc<Topic>`.
    pub fn subscribe(
        &self,
        topic_name: &str,
        client_id: &str,
        transport: Arc<dyn Transport>,
        last_n: i64,
    ) -> Result<(Arc<Topic>, Arc<Subscriber>, Vec<HistoryEntry>), BrokerError> {
        let topic = self.lookup(topic_name)?;
        let (subscriber, history) = topic.subscribe(client_id, transport, last_n, &self.config)?;
        Ok((topic, subscriber, history))
    }

    pub fn unsubscribe(&self, topic_name: &str, client_id: &str) -> Result<bool, BrokerError> {
        let topic = self.lookup(topic_name)?;
        Ok(topic.remove_subscriber(client_id))
    }

    /// Publish to a topic. Returns the number of subscribers that accepted
    /// the frame (delivered or dropped-oldest).
    pub fn publish(&self, topic_name: &str, message: Message) -> Result<usize, BrokerError> {
        let topic = self.lookup(topic_name)?;
        Ok(topic.publish(message))
    }

    pub fn history(&self, topic_name: &str, last_n: i64) -> Result<Vec<HistoryEntry>, BrokerError> {
        let topic = self.lookup(topic_name)?;
        Ok(topic.history(last_n))
    }

    /// Snapshot of `(name, subscriber_count)` for every live topic.
    pub fn list(&self) -> Vec<(String, usize)> {
        self.topics
            .read()
            .values()
            .map(|t| (t.name().to_string(), t.subscriber_count()))
            .collect()
    }

    /// Snapshot of `(message_count, subscriber_count)` per topic.
    pub fn stats(&self) -> Vec<TopicStats> {
        self.topics
            .read()
            .values()
            .map(|t| TopicStats {
                name: t.name().to_string(),
                message_count: t.message_count(),
                subscriber_count: t.subscriber_count(),
                dropped_total: t.dropped_total(),
            })
            .collect()
    }

    /// Seconds since broker construction, measured with a monotonic clock
    /// so it is immune to wall-clock adjustments.
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Notify and deactivate every subscriber of every topic, without
    /// removing the topics themselves. Used by the Shutdown Coordinator,
    /// which drains in place rather than tearing down the registry.
    pub async fn notify_all_subscribers(&self, msg: &'static str) {
        let topics: Vec<Arc<Topic>> = self.topics.read().values().cloned().collect();
        for topic in topics {
            topic.notify_and_deactivate_all(msg).await;
        }
    }

    /// Close every live subscriber transport across every topic. Called by
    /// the Shutdown Coordinator once the drain window has elapsed, so
    /// connections are torn down only after their pumps had a chance to
    /// flush what was still queued.
    pub async fn close_all_transports(&self) {
        let topics: Vec<Arc<Topic>> = self.topics.read().values().cloned().collect();
        for topic in topics {
            for transport in topic.transports() {
                transport.close().await;
            }
        }
    }

    fn lookup(&self, name: &str) -> Result<Arc<Topic>, BrokerError> {
        self.topics
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| BrokerError::TopicNotFound(name.to_string()))
    }
}

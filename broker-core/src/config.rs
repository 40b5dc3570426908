//! Broker configuration
//!
//! Grounded on the teacher's `TopicConfig` (env-var-driven defaults,
//! `Default` impl, plain `Clone` struct passed by value).

/// Overflow policy applied when a subscriber's delivery queue is full.
///
/// The default, and only policy required by the wire contract, is
/// drop-oldest. `DisconnectOnFull` is accepted as an implementation-defined
/// alternative and is never mixed per-subscriber within one broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    #[default]
    DropOldest,
    DisconnectOnFull,
}

/// Per-broker configuration: queue capacity (Q), history capacity (H), and
/// the overflow policy applied uniformly across all topics and subscribers.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Per-subscriber delivery queue capacity (Q). Default 100.
    pub max_subscriber_queue_size: usize,
    /// Per-topic history ring capacity (H). Default 100.
    pub topic_history_size: usize,
    /// Overflow policy for full subscriber queues.
    pub overflow_policy: OverflowPolicy,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            max_subscriber_queue_size: 100,
            topic_history_size: 100,
            overflow_policy: OverflowPolicy::DropOldest,
        }
    }
}

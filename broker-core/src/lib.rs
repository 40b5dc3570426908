//! Transport-agnostic pub/sub broker core.
//!
//! This crate owns the topic registry, fan-out, bounded per-subscriber
//! delivery queues, and shutdown sequencing. It never opens a socket or
//! speaks HTTP/WebSocket itself — see the `Transport` trait, which is the
//! seam implemented by the `broker-server` binary.

pub mod broker;
pub mod config;
pub mod error;
pub mod message;
pub mod pump;
pub mod queue;
pub mod shutdown;
pub mod subscriber;
pub mod topic;
pub mod transport;

pub use broker::{Broker, CreateOutcome, DeleteOutcome, TopicStats};
pub use config::{BrokerConfig, OverflowPolicy};
pub use error::BrokerError;
pub use message::{DeliveryFrame, HistoryEntry, Message, format_ts};
pub use pump::spawn_pump;
pub use queue::{DeliveryQueue, EnqueueOutcome};
pub use shutdown::ShutdownService;
pub use subscriber::Subscriber;
pub use topic::Topic;
pub use transport::{Transport, TransportError};

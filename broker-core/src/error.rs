//! Broker error taxonomy
//!
//! Mirrors the error kinds named in the wire contract: `bad_request`,
//! `topic_not_found`, `slow_consumer`, `internal`. Transports map these to
//! their own error representations (HTTP status, `error` frame code, ...).

use thiserror::Error;

/// Errors produced by core broker operations.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("topic '{0}' not found")]
    TopicNotFound(String),

    #[error("client '{client_id}' is already subscribed to topic '{topic}'")]
    DuplicateClient { topic: String, client_id: String },

    #[error("message id '{0}' is not a valid UUID")]
    InvalidMessageId(String),

    #[error("subscriber queue full and overflow policy is disconnect-on-full")]
    SlowConsumer,

    #[error("internal error: {0}")]
    Internal(String),
}

impl BrokerError {
    /// Machine-readable error code, matching the wire contract.
    pub fn code(&self) -> &'static str {
        match self {
            BrokerError::TopicNotFound(_) => "topic_not_found",
            BrokerError::DuplicateClient { .. } => "bad_request",
            BrokerError::InvalidMessageId(_) => "bad_request",
            BrokerError::SlowConsumer => "slow_consumer",
            BrokerError::Internal(_) => "internal",
        }
    }
}

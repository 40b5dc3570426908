//! The `Transport` trait: the seam between `broker-core` and however frames
//! actually reach a client.
//!
//! `broker-core` never opens a socket; it calls into a `Transport`
//! implementation to emit frames and to find out when emission fails. The
//! `broker-server` binary implements this trait over a WebSocket sink; test
//! code implements it over an in-memory recorder.

use async_trait::async_trait;

use crate::message::DeliveryFrame;

/// Error returned by a `Transport` when it can no longer deliver frames to
/// its remote peer (closed socket, broken pipe, ...).
#[derive(Debug, thiserror::Error)]
#[error("transport closed: {0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn closed(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Abstraction over "send frames to one connected client".
///
/// Implementations must be cheap to clone (typically an `Arc` around a
/// mutex-guarded sink) since a `Transport` handle is held by both the
/// owning connection task and the `Subscriber` it is attached to, so that
/// the broker can push `info` frames directly, bypassing the delivery
/// queue, for topic-deletion and shutdown notifications.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Emit a delivery (`event`) frame, the result of live fan-out or
    /// history replay.
    async fn send_event(&self, frame: DeliveryFrame) -> Result<(), TransportError>;

    /// Emit a lifecycle `info` frame not tied to any particular message,
    /// e.g. `topic_deleted` or `server_shutdown`. Bypasses the subscriber's
    /// delivery queue entirely.
    async fn send_info(&self, topic: Option<String>, msg: &str) -> Result<(), TransportError>;

    /// Emit an `error` frame carrying a machine-readable `code` and a
    /// human `message`, optionally correlated to an inbound `request_id`.
    async fn send_error(
        &self,
        request_id: Option<String>,
        code: &str,
        message: &str,
    ) -> Result<(), TransportError>;

    /// Close the transport outright. Used by the disconnect-on-full
    /// overflow policy and by the Shutdown Coordinator.
    async fn close(&self);
}

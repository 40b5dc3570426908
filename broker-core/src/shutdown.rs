//! Shutdown Coordinator
//!
//! Grounded on the teacher's `core::shutdown::ShutdownService`: a
//! `tokio::sync::watch` trigger, a handle registry drained under a bounded
//! timeout via `futures::future::join_all`, and an OS signal installer
//! racing `ctrl_c` against `SIGTERM` in a `tokio::select!`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use crate::broker::Broker;

/// Centralized shutdown orchestration for one broker process.
#[derive(Clone)]
pub struct ShutdownService {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
    broker: Arc<Broker>,
    drain_timeout: Duration,
}

impl ShutdownService {
    pub fn new(broker: Arc<Broker>, drain_timeout: Duration) -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
            handles: Arc::new(Mutex::new(Vec::new())),
            broker,
            drain_timeout,
        }
    }

    /// Register a Delivery Pump (or other background task) handle to be
    /// awaited during the drain window.
    pub async fn register(&self, handle: JoinHandle<()>) {
        self.handles.lock().await.push(handle);
    }

    /// Subscribe to the shutdown signal, e.g. to cancel a pump or stop
    /// accepting new frames on a connection.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.rx.clone()
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Run the full shutdown sequence: trigger, notify every subscriber,
    /// grant a bounded drain window for registered pumps, then close every
    /// remaining transport.
    pub async fn shutdown(&self) {
        tracing::debug!("initiating graceful shutdown");
        self.trigger();

        self.broker.notify_all_subscribers("server_shutdown").await;

        let handles = std::mem::take(&mut *self.handles.lock().await);
        let count = handles.len();
        tracing::debug!(count, "waiting for delivery pumps to drain");

        match tokio::time::timeout(self.drain_timeout, futures::future::join_all(handles)).await {
            Ok(_) => tracing::debug!("all delivery pumps drained"),
            Err(_) => tracing::warn!(
                timeout_ms = self.drain_timeout.as_millis() as u64,
                "timed out waiting for delivery pumps to drain; remaining queued frames discarded"
            ),
        }

        self.broker.close_all_transports().await;
        tracing::debug!("shutdown complete");
    }

    /// Future that resolves once shutdown has been triggered, for use with
    /// `axum::serve(...).with_graceful_shutdown(...)`.
    pub fn wait(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.rx.clone();
        async move {
            let _ = rx.wait_for(|&v| v).await;
        }
    }

    /// Install OS signal handlers and auto-trigger shutdown on Ctrl+C or
    /// SIGTERM.
    pub fn install_signal_handlers(&self) {
        let service = self.clone();
        tokio::spawn(async move {
            let ctrl_c = async {
                tokio::signal::ctrl_c()
                    .await
                    .expect("failed to install ctrl-c handler");
            };

            #[cfg(unix)]
            let terminate = async {
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to install sigterm handler")
                    .recv()
                    .await;
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => tracing::debug!("received ctrl-c, shutting down"),
                _ = terminate => tracing::debug!("received sigterm, shutting down"),
            }

            service.trigger();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrokerConfig;

    fn make_shutdown() -> ShutdownService {
        let broker = Arc::new(Broker::new(BrokerConfig::default()));
        ShutdownService::new(broker, Duration::from_millis(200))
    }

    #[tokio::test]
    async fn not_triggered_initially() {
        let shutdown = make_shutdown();
        assert!(!shutdown.is_triggered());
    }

    #[tokio::test]
    async fn trigger_flips_subscribers() {
        let shutdown = make_shutdown();
        let rx = shutdown.subscribe();
        assert!(!*rx.borrow());
        shutdown.trigger();
        assert!(*rx.borrow());
    }

    #[tokio::test]
    async fn wait_resolves_after_trigger() {
        let shutdown = make_shutdown();
        let handle = tokio::spawn(shutdown.wait());
        tokio::task::yield_now().await;
        shutdown.trigger();

        tokio::time::timeout(Duration::from_millis(100), handle)
            .await
            .expect("wait should resolve")
            .expect("task should not panic");
    }

    #[tokio::test]
    async fn shutdown_drains_registered_handles_within_timeout() {
        let shutdown = make_shutdown();
        let handle = tokio::spawn(async {
            tokio::time::sleep(Duration::from_millis(10)).await;
        });
        shutdown.register(handle).await;

        shutdown.shutdown().await;
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn shutdown_notifies_broker_subscribers() {
        use crate::message::DeliveryFrame;
        use crate::transport::{Transport, TransportError};
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Mutex as StdMutex;

        #[derive(Default)]
        struct RecordingTransport {
            infos: StdMutex<Vec<String>>,
            closed: AtomicUsize,
        }

        #[async_trait::async_trait]
        impl Transport for RecordingTransport {
            async fn send_event(&self, _frame: DeliveryFrame) -> Result<(), TransportError> {
                Ok(())
            }
            async fn send_info(
                &self,
                _topic: Option<String>,
                msg: &str,
            ) -> Result<(), TransportError> {
                self.infos.lock().unwrap().push(msg.to_string());
                Ok(())
            }
            async fn send_error(
                &self,
                _request_id: Option<String>,
                _code: &str,
                _message: &str,
            ) -> Result<(), TransportError> {
                Ok(())
            }
            async fn close(&self) {
                self.closed.fetch_add(1, Ordering::SeqCst);
            }
        }

        let broker = Arc::new(Broker::new(BrokerConfig::default()));
        broker.create_topic("t");
        let transport = Arc::new(RecordingTransport::default());
        broker.subscribe("t", "c1", transport.clone(), 0).unwrap();

        let shutdown = ShutdownService::new(Arc::clone(&broker), Duration::from_millis(50));
        shutdown.shutdown().await;

        assert_eq!(transport.infos.lock().unwrap().as_slice(), ["server_shutdown"]);
        assert_eq!(transport.closed.load(Ordering::SeqCst), 1);
    }
}

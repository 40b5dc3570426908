//! Delivery Pump: one task per live subscription, draining its
//! `Subscriber`'s queue and handing frames to the transport.
//!
//! Grounded on the corpus's `tokio::select! { biased; ... }` pattern for
//! racing a shutdown signal against a blocking receive (the teacher's SSE
//! route races `shutdown_rx.changed()` against `subscriber.recv()`); here
//! the second arm is `Subscriber::next()` instead of a broadcast receiver.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::subscriber::Subscriber;

/// Spawn the Delivery Pump for `subscriber`. Returns the `JoinHandle` so the
/// caller can track and, if needed, await the task rather than leaving it
/// detached.
///
/// The pump's sole responsibility is draining one queue: it never touches
/// topic state or performs fan-out. It exits when the queue drains after
/// deactivation, when the transport reports a terminal error, or when
/// `cancel` fires.
pub fn spawn_pump(subscriber: Arc<Subscriber>, mut cancel: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;

                _ = cancel.changed() => {
                    tracing::debug!(client_id = %subscriber.client_id, "delivery pump cancelled");
                    break;
                }

                frame = subscriber.next() => {
                    match frame {
                        Some(frame) => {
                            if let Err(e) = subscriber.transport.send_event(frame).await {
                                tracing::error!(
                                    client_id = %subscriber.client_id,
                                    error = %e,
                                    "delivery pump transport error, terminating subscription"
                                );
                                subscriber.deactivate();
                                break;
                            }
                        }
                        None => {
                            tracing::debug!(client_id = %subscriber.client_id, "delivery pump drained, exiting");
                            break;
                        }
                    }
                }
            }
        }
    })
}

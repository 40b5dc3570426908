//! WebSocket transport: the axum-specific implementation of `Transport`,
//! plus the per-connection frame loop.
//!
//! Grounded on the corpus's split-socket connection handler (reader/writer
//! tasks over `futures::StreamExt::split`), simplified to a single reader
//! loop since outbound frames here come from two sources funneled through
//! one mutex-guarded sink (direct replies and the Delivery Pump) rather than
//! from one priority queue.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::Mutex as AsyncMutex;

use broker_core::{spawn_pump, Broker, DeliveryFrame, Subscriber, Transport, TransportError};

use crate::wire::{ClientFrame, ServerFrame};

/// `Transport` implementation over one axum WebSocket connection's sink.
///
/// Shared (via `Arc`) between the connection's own reply path and every
/// `Subscriber` created for it, so lifecycle notifications (`topic_deleted`,
/// `server_shutdown`) can be pushed straight through regardless of which
/// topic triggered them.
pub struct WsTransport {
    sink: AsyncMutex<SplitSink<WebSocket, WsMessage>>,
}

impl WsTransport {
    fn new(sink: SplitSink<WebSocket, WsMessage>) -> Self {
        Self {
            sink: AsyncMutex::new(sink),
        }
    }

    async fn send_frame(&self, frame: ServerFrame) -> Result<(), TransportError> {
        let text = serde_json::to_string(&frame)
            .map_err(|e| TransportError::closed(format!("failed to encode frame: {e}")))?;
        self.sink
            .lock()
            .await
            .send(WsMessage::Text(text.into()))
            .await
            .map_err(|e| TransportError::closed(e.to_string()))
    }
}

#[async_trait::async_trait]
impl Transport for WsTransport {
    async fn send_event(&self, frame: DeliveryFrame) -> Result<(), TransportError> {
        self.send_frame(ServerFrame::event(frame)).await
    }

    async fn send_info(&self, topic: Option<String>, msg: &str) -> Result<(), TransportError> {
        self.send_frame(ServerFrame::info(topic, msg)).await
    }

    async fn send_error(
        &self,
        request_id: Option<String>,
        code: &str,
        message: &str,
    ) -> Result<(), TransportError> {
        self.send_frame(ServerFrame::error(request_id, code, message))
            .await
    }

    async fn close(&self) {
        let _ = self.sink.lock().await.close().await;
    }
}

/// One live subscription owned by this connection. The Delivery Pump's
/// `JoinHandle` is handed to the `ShutdownService` for the bounded drain
/// window and is not kept here: deactivating the subscriber closes its
/// queue, which is sufficient to make the pump exit on its own, so no
/// local `abort()` bookkeeping is needed.
struct LocalSubscription {
    subscriber: Arc<Subscriber>,
}

/// Drive one upgraded WebSocket connection until it closes.
///
/// Every subscription spawned on this connection gets its own cancellation
/// receiver from `shutdown`, and its pump handle is registered with
/// `shutdown` so the bounded drain window covers it.
pub async fn handle_socket(
    socket: WebSocket,
    broker: Arc<Broker>,
    shutdown: broker_core::ShutdownService,
) {
    let (ws_tx, mut ws_rx) = socket.split();
    let transport: Arc<WsTransport> = Arc::new(WsTransport::new(ws_tx));

    let mut subscriptions: HashMap<(String, String), LocalSubscription> = HashMap::new();
    let mut shutdown_rx = shutdown.subscribe();

    loop {
        let msg = tokio::select! {
            biased;
            _ = shutdown_rx.changed() => break,
            msg = ws_rx.next() => msg,
        };

        let text = match msg {
            Some(Ok(WsMessage::Text(text))) => text,
            Some(Ok(WsMessage::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                Ok(text) => text.into(),
                Err(_) => continue,
            },
            Some(Ok(WsMessage::Close(_))) => break,
            Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_))) => continue,
            Some(Err(_)) | None => break,
        };

        let frame: ClientFrame = match serde_json::from_str(&text) {
            Ok(frame) => frame,
            Err(e) => {
                let _ = transport.send_error(None, "bad_request", &e.to_string()).await;
                continue;
            }
        };

        handle_frame(frame, &broker, &transport, &shutdown, &mut subscriptions).await;
    }

    for (_, sub) in subscriptions {
        sub.subscriber.deactivate();
    }
    transport.close().await;
}

async fn handle_frame(
    frame: ClientFrame,
    broker: &Arc<Broker>,
    transport: &Arc<WsTransport>,
    shutdown: &broker_core::ShutdownService,
    subscriptions: &mut HashMap<(String, String), LocalSubscription>,
) {
    match frame {
        ClientFrame::Subscribe {
            topic,
            client_id,
            last_n,
            request_id,
        } => match broker.subscribe(&topic, &client_id, transport.clone(), last_n) {
            Ok((_topic, subscriber, history)) => {
                let _ = transport
                    .send_frame_ack(request_id, Some(topic.clone()))
                    .await;
                for entry in history {
                    let _ = transport
                        .send_event(DeliveryFrame::from_history(&topic, &entry))
                        .await;
                }

                let cancel_rx = shutdown.subscribe();
                let pump = spawn_pump(Arc::clone(&subscriber), cancel_rx);
                shutdown.register(pump).await;
                subscriptions.insert((topic, client_id), LocalSubscription { subscriber });
            }
            Err(e) => {
                let _ = transport
                    .send_error(request_id, e.code(), &e.to_string())
                    .await;
            }
        },

        ClientFrame::Unsubscribe {
            topic,
            client_id,
            request_id,
        } => match broker.unsubscribe(&topic, &client_id) {
            Ok(true) => {
                subscriptions.remove(&(topic.clone(), client_id));
                let _ = transport.send_frame_ack(request_id, Some(topic)).await;
            }
            Ok(false) => {
                // Not currently subscribed: unsubscribe is idempotent, so this
                // is still acked rather than treated as a client error.
                let _ = transport.send_frame_ack(request_id, Some(topic)).await;
            }
            Err(e) => {
                let _ = transport
                    .send_error(request_id, e.code(), &e.to_string())
                    .await;
            }
        },

        ClientFrame::Publish {
            topic,
            message,
            request_id,
        } => match message.into_message() {
            Ok(message) => match broker.publish(&topic, message) {
                Ok(_n_delivered) => {
                    let _ = transport.send_frame_ack(request_id, Some(topic)).await;
                }
                Err(e) => {
                    let _ = transport
                        .send_error(request_id, e.code(), &e.to_string())
                        .await;
                }
            },
            Err(e) => {
                let _ = transport
                    .send_error(request_id, e.code(), &e.to_string())
                    .await;
            }
        },

        ClientFrame::Ping { request_id } => {
            let _ = transport.send_frame_pong(request_id).await;
        }
    }
}

impl WsTransport {
    async fn send_frame_ack(
        &self,
        request_id: Option<String>,
        topic: Option<String>,
    ) -> Result<(), TransportError> {
        self.send_frame(ServerFrame::ack(request_id, topic)).await
    }

    async fn send_frame_pong(&self, request_id: Option<String>) -> Result<(), TransportError> {
        self.send_frame(ServerFrame::pong(request_id)).await
    }
}

/// Smoke-level test exercising basic fan-out over a real WebSocket
/// connection rather than the in-process `Transport` test double used by
/// `broker-core`'s own scenario tests.
#[cfg(test)]
mod tests {
    use broker_core::{Broker, BrokerConfig, ShutdownService};
    use futures::{SinkExt, StreamExt};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::Message as TungsteniteMessage;

    async fn spawn_test_server() -> (std::net::SocketAddr, Arc<Broker>, ShutdownService) {
        let broker = Arc::new(Broker::new(BrokerConfig::default()));
        let shutdown = ShutdownService::new(Arc::clone(&broker), Duration::from_millis(200));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let router = crate::api::build_router(Arc::clone(&broker), shutdown.clone());
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        (addr, broker, shutdown)
    }

    async fn recv_json(
        ws: &mut (impl StreamExt<Item = Result<TungsteniteMessage, tokio_tungstenite::tungstenite::Error>>
                  + Unpin),
    ) -> Value {
        loop {
            match ws.next().await.expect("stream ended").expect("ws error") {
                TungsteniteMessage::Text(text) => return serde_json::from_str(&text).unwrap(),
                TungsteniteMessage::Ping(_) | TungsteniteMessage::Pong(_) => continue,
                other => panic!("unexpected frame: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn basic_fan_out_over_real_websocket() {
        let (addr, broker, _shutdown) = spawn_test_server().await;
        broker.create_topic("orders");
        let url = format!("ws://{addr}/ws");

        let (mut publisher, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
        let (mut subscriber, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();

        publisher
            .send(TungsteniteMessage::Text(
                json!({"type": "subscribe", "topic": "orders", "client_id": "publisher"})
                    .to_string()
                    .into(),
            ))
            .await
            .unwrap();
        assert_eq!(recv_json(&mut publisher).await["type"], "ack");

        subscriber
            .send(TungsteniteMessage::Text(
                json!({"type": "subscribe", "topic": "orders", "client_id": "A"})
                    .to_string()
                    .into(),
            ))
            .await
            .unwrap();
        assert_eq!(recv_json(&mut subscriber).await["type"], "ack");

        publisher
            .send(TungsteniteMessage::Text(
                json!({
                    "type": "publish",
                    "topic": "orders",
                    "message": {"id": "550e8400-e29b-41d4-a716-446655440000", "payload": {"n": 1}},
                })
                .to_string()
                .into(),
            ))
            .await
            .unwrap();
        assert_eq!(recv_json(&mut publisher).await["type"], "ack");

        let event = recv_json(&mut subscriber).await;
        assert_eq!(event["type"], "event");
        assert_eq!(event["topic"], "orders");
        assert_eq!(event["message"]["id"], "550e8400-e29b-41d4-a716-446655440000");
    }

    #[tokio::test]
    async fn bad_uuid_publish_yields_bad_request_error() {
        let (addr, broker, _shutdown) = spawn_test_server().await;
        broker.create_topic("orders");
        let url = format!("ws://{addr}/ws");
        let (mut client, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();

        client
            .send(TungsteniteMessage::Text(
                json!({"type": "subscribe", "topic": "orders", "client_id": "A"})
                    .to_string()
                    .into(),
            ))
            .await
            .unwrap();
        assert_eq!(recv_json(&mut client).await["type"], "ack");

        client
            .send(TungsteniteMessage::Text(
                json!({
                    "type": "publish",
                    "topic": "orders",
                    "message": {"id": "123", "payload": {}},
                })
                .to_string()
                .into(),
            ))
            .await
            .unwrap();

        let reply = recv_json(&mut client).await;
        assert_eq!(reply["type"], "error");
        assert_eq!(reply["error"]["code"], "bad_request");
    }
}

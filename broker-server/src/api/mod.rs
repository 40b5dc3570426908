//! Control-plane HTTP router plus the WebSocket upgrade endpoint, grounded
//! on the teacher's `api::server::ApiServer` router-nesting and
//! `axum::serve(...).with_graceful_shutdown(...)` wiring.

pub mod openapi;
pub mod routes;
pub mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use broker_core::{Broker, ShutdownService};

use self::openapi::{openapi_json, swagger_ui_html};
use self::routes::{health, stats, topics};
use crate::websocket::handle_socket;

#[derive(Clone)]
struct AppState {
    broker: Arc<Broker>,
    shutdown: ShutdownService,
}

impl axum::extract::FromRef<AppState> for Arc<Broker> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.broker)
    }
}

async fn ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.broker, state.shutdown))
}

pub(crate) fn build_router(broker: Arc<Broker>, shutdown: ShutdownService) -> Router {
    let state = AppState { broker, shutdown };

    let topics_routes = Router::new()
        .route("/", post(topics::create_topic).get(topics::list_topics))
        .route("/{name}", delete(topics::delete_topic));

    Router::new()
        .route("/ws", get(ws_upgrade))
        .route("/api/v1/health", get(health::health))
        .route("/api/v1/stats", get(stats::stats))
        .nest("/api/v1/topics", topics_routes)
        .route("/api/openapi.json", get(openapi_json))
        .route("/api/docs", get(swagger_ui_html))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind the listener and serve until the `ShutdownService` is triggered.
pub async fn serve(
    addr: SocketAddr,
    broker: Arc<Broker>,
    shutdown: ShutdownService,
) -> Result<()> {
    let router = build_router(broker, shutdown.clone());
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "broker listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.wait())
        .await?;

    Ok(())
}

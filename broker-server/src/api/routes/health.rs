//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use utoipa::ToSchema;

use broker_core::Broker;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_sec: u64,
    pub topics: usize,
    pub subscribers: usize,
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Broker is healthy", body = HealthResponse)
    )
)]
pub async fn health(State(broker): State<Arc<Broker>>) -> impl IntoResponse {
    let topics = broker.list();
    let subscribers = topics.iter().map(|(_, count)| count).sum();

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            uptime_sec: broker.uptime_secs(),
            topics: topics.len(),
            subscribers,
        }),
    )
}

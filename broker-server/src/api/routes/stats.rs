//! Per-topic statistics endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde::Serialize;
use utoipa::ToSchema;

use broker_core::Broker;

#[derive(Debug, Serialize, ToSchema)]
pub struct TopicStatsEntry {
    pub messages: u64,
    pub subscribers: usize,
    /// Sum of dropped-oldest evictions across this topic's subscribers.
    /// Observability-only; never affects delivery semantics.
    pub dropped_total: u64,
}

#[utoipa::path(
    get,
    path = "/api/v1/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Per-topic message and subscriber counts")
    )
)]
pub async fn stats(State(broker): State<Arc<Broker>>) -> impl IntoResponse {
    let body: std::collections::BTreeMap<String, TopicStatsEntry> = broker
        .stats()
        .into_iter()
        .map(|s| {
            (
                s.name,
                TopicStatsEntry {
                    messages: s.message_count,
                    subscribers: s.subscriber_count,
                    dropped_total: s.dropped_total,
                },
            )
        })
        .collect();
    Json(body)
}

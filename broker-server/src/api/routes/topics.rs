//! Topic lifecycle and listing endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use broker_core::{Broker, CreateOutcome, DeleteOutcome};

use crate::api::types::ApiError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTopicRequest {
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TopicSummary {
    pub name: String,
    pub subscriber_count: usize,
}

#[utoipa::path(
    post,
    path = "/api/v1/topics",
    tag = "topics",
    request_body = CreateTopicRequest,
    responses(
        (status = 201, description = "Topic created"),
        (status = 409, description = "Topic already exists")
    )
)]
pub async fn create_topic(
    State(broker): State<Arc<Broker>>,
    Json(body): Json<CreateTopicRequest>,
) -> Result<impl IntoResponse, ApiError> {
    match broker.create_topic(&body.name) {
        CreateOutcome::Created => Ok(StatusCode::CREATED),
        CreateOutcome::Exists => Err(ApiError::conflict(
            "conflict",
            format!("topic '{}' already exists", body.name),
        )),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/topics/{name}",
    tag = "topics",
    params(("name" = String, Path, description = "Topic name")),
    responses(
        (status = 204, description = "Topic deleted, subscribers notified"),
        (status = 404, description = "Topic not found")
    )
)]
pub async fn delete_topic(
    State(broker): State<Arc<Broker>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match broker.delete_topic(&name).await {
        DeleteOutcome::Deleted => Ok(StatusCode::NO_CONTENT),
        DeleteOutcome::Absent => Err(ApiError::not_found(
            "topic_not_found",
            format!("topic '{name}' not found"),
        )),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/topics",
    tag = "topics",
    responses(
        (status = 200, description = "All live topics", body = [TopicSummary])
    )
)]
pub async fn list_topics(State(broker): State<Arc<Broker>>) -> impl IntoResponse {
    let topics: Vec<TopicSummary> = broker
        .list()
        .into_iter()
        .map(|(name, subscriber_count)| TopicSummary {
            name,
            subscriber_count,
        })
        .collect();
    Json(topics)
}

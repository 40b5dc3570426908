//! OpenAPI specification, grounded on the teacher's `api::openapi` module,
//! trimmed to this broker's three control-plane routes.

use axum::http::header;
use axum::response::{Html, IntoResponse, Json};
use utoipa::OpenApi;

use crate::api::routes::{health, stats, topics};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "broker API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Control plane for the in-memory pub/sub broker"
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "topics", description = "Topic lifecycle and listing"),
        (name = "stats", description = "Per-topic message and subscriber counts")
    ),
    paths(
        health::health,
        topics::create_topic,
        topics::delete_topic,
        topics::list_topics,
        stats::stats,
    ),
    components(schemas(
        health::HealthResponse,
        topics::CreateTopicRequest,
        topics::TopicSummary,
        stats::TopicStatsEntry,
    ))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        Json(ApiDoc::openapi()),
    )
}

pub async fn swagger_ui_html() -> Html<&'static str> {
    Html(SWAGGER_UI_HTML)
}

const SWAGGER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>broker API Documentation</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = () => {
            window.ui = SwaggerUIBundle({
                url: "/api/openapi.json",
                dom_id: "#swagger-ui",
            });
        };
    </script>
</body>
</html>"#;

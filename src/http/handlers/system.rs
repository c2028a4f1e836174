//! Unauthenticated service endpoints and the 404 fallback.

use axum::extract::{OriginalUri, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use crate::http::envelope::Envelope;
use crate::hub::{blocking, Hub};

pub async fn root() -> Envelope {
    Envelope::ok()
        .message("Welcome to AI Hub API")
        .field("version", env!("CARGO_PKG_VERSION"))
        .field(
            "endpoints",
            json!({
                "health": "/health",
                "auth": "/api/auth",
                "user": "/api/user",
                "ai": "/api/ai",
                "tools": "/api/tools",
            }),
        )
}

/// Liveness plus a store probe. A failed probe answers 503.
pub async fn health(State(hub): State<Arc<Hub>>) -> Response {
    let timestamp = chrono::Utc::now().to_rfc3339();
    let environment = hub.config.server.environment.clone();
    let store = hub.store.clone();
    match blocking(move || store.ping()).await {
        Ok(()) => Envelope::ok()
            .message("Server is running")
            .field("timestamp", timestamp)
            .field("environment", environment)
            .field("database", "connected")
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Health check: store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "message": "Store unavailable",
                    "timestamp": timestamp,
                    "environment": environment,
                    "database": "unavailable",
                })),
            )
                .into_response()
        }
    }
}

/// Active tools in the catalog.
pub async fn tools(State(hub): State<Arc<Hub>>) -> Envelope {
    let tools = hub.catalog.list_entries(false);
    Envelope::ok().field("count", tools.len()).data(tools)
}

/// 404 envelope. Reports the full request path, also under a nested router.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": format!("Not Found - {}", uri.path()),
        })),
    )
        .into_response()
}

//! Response envelope: `{success, message?, ...}` with named payload keys.
//!
//! Errors never go through here; [`crate::types::Error`] renders its own
//! `{success: false, message}` body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::store::HistoryPage;

/// Successful JSON response under construction.
#[derive(Debug, Clone)]
pub struct Envelope {
    status: StatusCode,
    body: Map<String, Value>,
}

impl Envelope {
    pub fn ok() -> Self {
        Self::with_status(StatusCode::OK)
    }

    pub fn created() -> Self {
        Self::with_status(StatusCode::CREATED)
    }

    fn with_status(status: StatusCode) -> Self {
        let mut body = Map::new();
        body.insert("success".to_string(), Value::Bool(true));
        Self { status, body }
    }

    pub fn message(self, message: impl Into<String>) -> Self {
        self.field("message", message.into())
    }

    pub fn data(self, data: impl Serialize) -> Self {
        self.field("data", data)
    }

    /// Add a payload key. A value that fails to serialize becomes `null`.
    pub fn field(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or_else(|e| {
            tracing::error!(key, error = %e, "Response field failed to serialize");
            Value::Null
        });
        self.body.insert(key.to_string(), value);
        self
    }

    pub fn pagination(self, page: &HistoryPage) -> Self {
        self.field("pagination", Pagination::of(page))
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (self.status, Json(Value::Object(self.body))).into_response()
    }
}

/// Paging block returned alongside history listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u64,
    pub total_items: u64,
    pub items_per_page: u32,
}

impl Pagination {
    pub fn of(page: &HistoryPage) -> Self {
        Self {
            current_page: page.page,
            total_pages: page.total_pages(),
            total_items: page.total,
            items_per_page: page.limit,
        }
    }
}

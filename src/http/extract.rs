//! Request extractors that fail with the application error envelope.

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::types::Error;

/// JSON request body. An empty body reads as `{}` so missing fields surface
/// as field-level validation messages instead of a parse failure.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| Error::validation(rejection.body_text()))?;
        let raw: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &bytes
        };
        serde_json::from_slice(raw)
            .map(JsonBody)
            .map_err(|e| Error::validation(format!("Invalid JSON body: {}", e)))
    }
}

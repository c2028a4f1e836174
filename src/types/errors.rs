//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and map to
//! an HTTP status plus the `{success: false, message}` envelope.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the AI Hub backend.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed client input (HTTP 400).
    #[error("validation error: {0}")]
    Validation(String),

    /// No credential, or a malformed `Authorization` header (HTTP 401).
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Credential signature is valid but the validity window has passed.
    #[error("token expired")]
    TokenExpired,

    /// Credential could not be decoded or its signature does not match.
    #[error("invalid token: {0}")]
    TokenInvalid(String),

    /// Authenticated but not allowed (HTTP 403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Referenced entity absent (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Unique constraint violated (HTTP 409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Request-count window exhausted for a client address (HTTP 429).
    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after_secs: u64,
    },

    /// Plan ceiling reached for a tool (HTTP 429).
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// No provider API key present.
    #[error("provider not configured")]
    ProviderUnconfigured,

    /// Provider answered with a non-success status.
    #[error("provider error: {0}")]
    Provider(String),

    /// Transport failure talking to the provider.
    #[error("provider unreachable: {0}")]
    ProviderUnreachable(String),

    /// Store unavailable or query failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Internal errors.
    #[error("internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Unauthenticated(_) | Error::TokenExpired | Error::TokenInvalid(_) => {
                StatusCode::UNAUTHORIZED
            }
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::RateLimited { .. } | Error::QuotaExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            Error::ProviderUnconfigured => StatusCode::SERVICE_UNAVAILABLE,
            Error::Provider(_) | Error::ProviderUnreachable(_) => StatusCode::BAD_GATEWAY,
            Error::Persistence(_)
            | Error::Internal(_)
            | Error::Serialization(_)
            | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the caller. Server-side faults are collapsed
    /// into a generic text; the detail only goes to the log.
    pub fn client_message(&self) -> String {
        match self {
            Error::Validation(msg)
            | Error::Unauthenticated(msg)
            | Error::Forbidden(msg)
            | Error::NotFound(msg)
            | Error::Conflict(msg)
            | Error::QuotaExceeded(msg)
            | Error::Provider(msg) => msg.clone(),
            Error::RateLimited { message, .. } => message.clone(),
            Error::TokenExpired => "Token expired. Please login again.".to_string(),
            Error::TokenInvalid(_) => "Invalid token. Authorization denied.".to_string(),
            Error::ProviderUnconfigured => {
                "AI provider API key not configured. Set OPENAI_API_KEY to enable AI tools."
                    .to_string()
            }
            Error::ProviderUnreachable(_) => "AI provider is unreachable".to_string(),
            Error::Persistence(_) | Error::Internal(_) | Error::Serialization(_) | Error::Io(_) => {
                "Server error".to_string()
            }
        }
    }

    /// Whether the failure came from the external provider.
    pub fn is_provider_fault(&self) -> bool {
        matches!(
            self,
            Error::ProviderUnconfigured | Error::Provider(_) | Error::ProviderUnreachable(_)
        )
    }
}

// Convenience constructors
impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn token_invalid(msg: impl Into<String>) -> Self {
        Self::TokenInvalid(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn quota_exceeded(msg: impl Into<String>) -> Self {
        Self::QuotaExceeded(msg.into())
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Persistence(err.to_string())
    }
}

impl From<r2d2::Error> for Error {
    fn from(err: r2d2::Error) -> Self {
        Error::Persistence(format!("connection pool: {}", err))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        let body = Json(serde_json::json!({
            "success": false,
            "message": self.client_message(),
        }));
        let mut response = (status, body).into_response();

        if let Error::RateLimited {
            retry_after_secs, ..
        } = &self
        {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

//! `/api/auth`: register, login, current account, logout.

use axum::extract::State;
use axum::Extension;
use std::sync::Arc;

use crate::auth::AuthContext;
use crate::http::envelope::Envelope;
use crate::http::extract::JsonBody;
use crate::hub::{blocking, Hub, LoginRequest, RegisterRequest};
use crate::types::Result;

pub async fn register(
    State(hub): State<Arc<Hub>>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<Envelope> {
    let session = hub.accounts.register(req).await?;
    Ok(Envelope::created()
        .message("User registered successfully")
        .field("token", &session.token.token)
        .field("user", session.account.profile()))
}

pub async fn login(
    State(hub): State<Arc<Hub>>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Envelope> {
    let session = hub.accounts.login(req).await?;
    Ok(Envelope::ok()
        .message("Login successful")
        .field("token", &session.token.token)
        .field("user", session.account.profile()))
}

pub async fn me(
    State(hub): State<Arc<Hub>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Envelope> {
    let account = blocking(move || hub.accounts.profile(&auth.account_id)).await?;
    Ok(Envelope::ok().field("user", account.profile()))
}

/// Tokens are stateless; the client discards its copy.
pub async fn logout(Extension(auth): Extension<AuthContext>) -> Envelope {
    tracing::debug!(account_id = %auth.account_id, "Logout");
    Envelope::ok().message("Logout successful")
}

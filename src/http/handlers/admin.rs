//! `/api/admin`: account management and usage analytics. Admin role only.

use axum::extract::{Path, State};
use axum::Extension;
use std::sync::Arc;

use crate::auth::AuthContext;
use crate::http::envelope::Envelope;
use crate::http::extract::JsonBody;
use crate::hub::{blocking, Hub};
use crate::store::{AccountProfile, AccountUpdate};
use crate::types::{AccountId, Error, Result};

fn account_id(raw: String) -> Result<AccountId> {
    AccountId::from_string(raw).map_err(|_| Error::not_found("User not found"))
}

pub async fn list_users(State(hub): State<Arc<Hub>>) -> Result<Envelope> {
    let accounts = blocking(move || hub.accounts.list()).await?;
    let users: Vec<AccountProfile> = accounts.iter().map(|a| a.profile()).collect();
    Ok(Envelope::ok().field("count", users.len()).data(users))
}

pub async fn update_user(
    State(hub): State<Arc<Hub>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    JsonBody(update): JsonBody<AccountUpdate>,
) -> Result<Envelope> {
    let id = account_id(id)?;
    if id == auth.account_id && (update.role.is_some() || update.is_active == Some(false)) {
        return Err(Error::validation(
            "Admins cannot change their own role or deactivate themselves",
        ));
    }
    let account = blocking(move || hub.accounts.update(&id, &update)).await?;
    Ok(Envelope::ok()
        .message("User updated successfully")
        .field("user", account.profile()))
}

/// Recompute an account's counters from its successful usage events.
pub async fn reconcile_user(
    State(hub): State<Arc<Hub>>,
    Path(id): Path<String>,
) -> Result<Envelope> {
    let id = account_id(id)?;
    let report = blocking(move || hub.ledger.reconcile(&id)).await?;
    Ok(Envelope::ok().field("changed", report.changed()).data(report))
}

pub async fn analytics(State(hub): State<Arc<Hub>>) -> Result<Envelope> {
    let analytics = blocking(move || hub.ledger.analytics()).await?;
    Ok(Envelope::ok().data(analytics))
}

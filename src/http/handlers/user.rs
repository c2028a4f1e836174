//! `/api/user`: profile, history and stats for the calling account.

use axum::extract::{Path, Query, State};
use axum::Extension;
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::AuthContext;
use crate::http::envelope::Envelope;
use crate::http::extract::JsonBody;
use crate::hub::{blocking, Hub};
use crate::store::{HistoryQuery, ProfileUpdate};
use crate::types::{Error, Result, UsageEventId};
use crate::validation::page_bounds;

/// Raw history query string. Unparseable numbers fall back to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub tool: Option<String>,
}

impl HistoryParams {
    fn into_query(self) -> HistoryQuery {
        let (page, limit) = page_bounds(
            self.page.and_then(|p| p.trim().parse().ok()),
            self.limit.and_then(|l| l.trim().parse().ok()),
        );
        HistoryQuery {
            page,
            limit,
            tool: self.tool.filter(|t| !t.trim().is_empty()),
        }
    }
}

pub async fn get_profile(
    State(hub): State<Arc<Hub>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Envelope> {
    let account = blocking(move || hub.accounts.profile(&auth.account_id)).await?;
    Ok(Envelope::ok().field("user", account.profile()))
}

pub async fn update_profile(
    State(hub): State<Arc<Hub>>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> Result<Envelope> {
    let account = blocking(move || hub.accounts.update_profile(&auth.account_id, update)).await?;
    Ok(Envelope::ok()
        .message("Profile updated successfully")
        .field("user", account.profile()))
}

pub async fn history(
    State(hub): State<Arc<Hub>>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<HistoryParams>,
) -> Result<Envelope> {
    let query = params.into_query();
    let page = blocking(move || hub.ledger.history(&auth.account_id, &query)).await?;
    Ok(Envelope::ok().data(&page.items).pagination(&page))
}

pub async fn delete_history(
    State(hub): State<Arc<Hub>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Envelope> {
    let id = UsageEventId::from_string(id)
        .map_err(|_| Error::not_found("History item not found"))?;
    blocking(move || hub.ledger.delete_entry(&auth.account_id, &id)).await?;
    Ok(Envelope::ok().message("History item deleted successfully"))
}

pub async fn stats(
    State(hub): State<Arc<Hub>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Envelope> {
    let stats = blocking(move || hub.ledger.stats(&auth.account_id)).await?;
    Ok(Envelope::ok().field("stats", stats))
}

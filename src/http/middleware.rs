//! Request middleware: rate limiting, credential verification, admin gate.

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::auth::AuthContext;
use crate::hub::{Hub, RateLimiter};
use crate::types::Error;

const ADMIN_REQUIRED: &str = "Access denied. Admin privileges required.";

/// Which configured window a route group is counted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitScope {
    Api,
    Auth,
    Ai,
}

impl LimitScope {
    fn limiter(self, hub: &Hub) -> &RateLimiter {
        match self {
            LimitScope::Api => &hub.limiters.api,
            LimitScope::Auth => &hub.limiters.auth,
            LimitScope::Ai => &hub.limiters.ai,
        }
    }
}

/// Client address: socket peer, else the first `X-Forwarded-For` hop.
pub fn client_key(req: &Request) -> String {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn set_limit_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, reset: u64) {
    for (name, value) in [
        ("ratelimit-limit", u64::from(limit)),
        ("ratelimit-remaining", u64::from(remaining)),
        ("ratelimit-reset", reset),
    ] {
        headers.insert(HeaderName::from_static(name), HeaderValue::from(value));
    }
}

/// Count the request against the scope's window; 429 once it is exhausted.
pub async fn rate_limit(
    State((hub, scope)): State<(Arc<Hub>, LimitScope)>,
    req: Request,
    next: Next,
) -> Response {
    let limiter = scope.limiter(&hub);
    let standard_headers = limiter.limit().standard_headers;
    let client = client_key(&req);

    let decision = match limiter.check(&client) {
        Ok(decision) => decision,
        Err(err) => {
            tracing::warn!(scope = limiter.scope(), client = %client, "Rate limit exceeded");
            let retry_after = match &err {
                Error::RateLimited {
                    retry_after_secs, ..
                } => *retry_after_secs,
                _ => 0,
            };
            let mut response = err.into_response();
            if standard_headers {
                let max = limiter.limit().max_requests;
                set_limit_headers(response.headers_mut(), max, 0, retry_after);
            }
            return response;
        }
    };

    let mut response = next.run(req).await;

    if limiter.limit().skip_successful && response.status().as_u16() < 400 {
        limiter.release(&decision);
    }
    if standard_headers {
        set_limit_headers(
            response.headers_mut(),
            decision.limit,
            decision.remaining,
            decision.reset_after_secs,
        );
    }
    response
}

/// Verify the bearer token and attach its [`AuthContext`] to the request.
pub async fn authenticate(
    State(hub): State<Arc<Hub>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Error> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let auth = hub.verifier.verify_header(header)?;
    tracing::debug!(account_id = %auth.account_id, role = auth.role.as_str(), "Authenticated");

    req.extensions_mut().insert(auth);
    Ok(next.run(req).await)
}

/// Reject callers without the admin role. Runs after [`authenticate`].
pub async fn require_admin(req: Request, next: Next) -> Result<Response, Error> {
    let is_admin = req
        .extensions()
        .get::<AuthContext>()
        .is_some_and(|auth| auth.is_admin());
    if !is_admin {
        return Err(Error::forbidden(ADMIN_REQUIRED));
    }
    Ok(next.run(req).await)
}

//! Route table and the layer stack around it.

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::http::handlers::{admin, ai, auth, system, user};
use crate::http::middleware::{authenticate, rate_limit, require_admin, LimitScope};
use crate::hub::Hub;

fn cors(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);
    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(e) => {
            tracing::warn!(origin, error = %e, "Invalid FRONTEND_URL; cross-origin requests disabled");
            layer
        }
    }
}

/// Build the full application router over a shared [`Hub`].
pub fn build_router(hub: Arc<Hub>) -> Router {
    let auth_public: Router<Arc<Hub>> = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route_layer(from_fn_with_state((hub.clone(), LimitScope::Auth), rate_limit));

    let auth_private: Router<Arc<Hub>> = Router::new()
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout))
        .route_layer(from_fn_with_state(hub.clone(), authenticate));

    let user_routes: Router<Arc<Hub>> = Router::new()
        .route("/profile", get(user::get_profile).put(user::update_profile))
        .route("/history", get(user::history))
        .route("/history/{id}", delete(user::delete_history))
        .route("/stats", get(user::stats))
        .route_layer(from_fn_with_state(hub.clone(), authenticate));

    let ai_routes: Router<Arc<Hub>> = Router::new()
        .route("/chat", post(ai::chat))
        .route("/image", post(ai::image))
        .route("/resume", post(ai::resume))
        .route("/code", post(ai::code))
        .route("/study", post(ai::study))
        .route("/content", post(ai::content))
        .route_layer(from_fn_with_state((hub.clone(), LimitScope::Ai), rate_limit))
        .route_layer(from_fn_with_state(hub.clone(), authenticate));

    let admin_routes: Router<Arc<Hub>> = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}", put(admin::update_user))
        .route("/users/{id}/reconcile", post(admin::reconcile_user))
        .route("/analytics", get(admin::analytics))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(hub.clone(), authenticate));

    let api: Router<Arc<Hub>> = Router::new()
        .nest("/auth", auth_public.merge(auth_private))
        .nest("/user", user_routes)
        .nest("/ai", ai_routes)
        .nest("/admin", admin_routes)
        .route("/tools", get(system::tools))
        .fallback(system::not_found)
        .layer(from_fn_with_state((hub.clone(), LimitScope::Api), rate_limit));

    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .nest("/api", api)
        .fallback(system::not_found)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=15552000; includeSubDomains"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("cross-origin-resource-policy"),
            HeaderValue::from_static("same-origin"),
        ))
        .layer(cors(&hub.config.server.frontend_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(hub)
}

//! HTTP integration tests: router → middleware → hub → store, with a scripted
//! provider standing in for the model vendor.

use aihub_core::gateway::{
    Completion, CompletionRequest, GeneratedImage, ImageRequest, ProviderClient,
};
use aihub_core::http::build_router;
use aihub_core::store::{AccountUpdate, Role, Store};
use aihub_core::types::AccountId;
use aihub_core::{Config, Error, Hub, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

// =============================================================================
// Harness
// =============================================================================

#[derive(Debug, Default)]
struct ScriptedProvider {
    text: String,
    error: Option<String>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn replying(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderClient for ScriptedProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.error {
            Some(message) => Err(Error::provider(message.clone())),
            None => Ok(Completion {
                text: self.text.clone(),
                model: request.model.clone(),
                total_tokens: 42,
            }),
        }
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<GeneratedImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(GeneratedImage {
            url: Some("https://img.example/1.png".to_string()),
            revised_prompt: Some(request.prompt.clone()),
        })
    }
}

struct TestApp {
    router: Router,
    hub: Arc<Hub>,
    provider: Arc<ScriptedProvider>,
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.auth.jwt_secret = "integration-secret".to_string();
    config.auth.password_rounds = 10;
    config
}

fn app_with(provider: ScriptedProvider, tweak: impl FnOnce(&mut Config)) -> TestApp {
    let mut config = test_config();
    tweak(&mut config);
    let provider = Arc::new(provider);
    let hub = Arc::new(
        Hub::new(config, Store::open_in_memory().unwrap(), provider.clone()).unwrap(),
    );
    TestApp {
        router: build_router(hub.clone()),
        hub,
        provider,
    }
}

fn app(provider: ScriptedProvider) -> TestApp {
    app_with(provider, |_| {})
}

impl TestApp {
    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
        client: &str,
    ) -> Reply {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", client);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        Reply {
            status,
            headers,
            body,
        }
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> Reply {
        self.send("GET", uri, token, None, "10.0.0.1").await
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Reply {
        self.send("POST", uri, token, Some(body), "10.0.0.1").await
    }

    /// Register a fresh account and return `(token, account id)`.
    async fn register(&self, email: &str) -> (String, AccountId) {
        let reply = self
            .post(
                "/api/auth/register",
                None,
                json!({"name": "Ada", "email": email, "password": "secret123"}),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        let token = reply.body["token"].as_str().unwrap().to_string();
        let id = AccountId::from_string(reply.body["user"]["id"].as_str().unwrap().to_string())
            .unwrap();
        (token, id)
    }
}

fn assert_no_credential(body: &Value) {
    let text = body.to_string();
    assert!(!text.contains("password"), "credential leaked: {}", text);
    assert!(!text.contains("pbkdf2"), "credential leaked: {}", text);
}

// =============================================================================
// Accounts
// =============================================================================

#[tokio::test]
async fn test_register_login_and_me_never_expose_credential() {
    let app = app(ScriptedProvider::replying("hi"));

    let reply = app
        .post(
            "/api/auth/register",
            None,
            json!({"name": "Ada", "email": "Ada@Example.com", "password": "secret123"}),
        )
        .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.body["success"], true);
    assert_eq!(reply.body["message"], "User registered successfully");
    assert_eq!(reply.body["user"]["email"], "ada@example.com");
    assert_eq!(reply.body["user"]["plan_type"], "free");
    assert_no_credential(&reply.body);

    let reply = app
        .post(
            "/api/auth/login",
            None,
            json!({"email": "ada@example.com", "password": "secret123"}),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["message"], "Login successful");
    assert!(reply.body["user"]["last_login"].is_string());
    assert_no_credential(&reply.body);

    let token = reply.body["token"].as_str().unwrap().to_string();
    let auth = app.hub.verifier.verify(&token).unwrap();
    assert_eq!(auth.role, Role::User);

    let reply = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["user"]["name"], "Ada");
    assert_no_credential(&reply.body);

    let reply = app.get("/api/user/profile", Some(&token)).await;
    assert_no_credential(&reply.body);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = app(ScriptedProvider::replying("hi"));
    app.register("ada@example.com").await;

    let reply = app
        .post(
            "/api/auth/register",
            None,
            json!({"name": "Other", "email": "ADA@example.com", "password": "secret123"}),
        )
        .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.body["success"], false);
    assert_eq!(app.hub.accounts.list().unwrap().len(), 1);
}

#[tokio::test]
async fn test_register_missing_field() {
    let app = app(ScriptedProvider::replying("hi"));
    let reply = app
        .post(
            "/api/auth/register",
            None,
            json!({"email": "ada@example.com", "password": "secret123"}),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["message"], "Please provide all required fields");
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = app(ScriptedProvider::replying("hi"));
    app.register("ada@example.com").await;

    let reply = app
        .post(
            "/api/auth/login",
            None,
            json!({"email": "ada@example.com", "password": "nope-nope"}),
        )
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_profile_update() {
    let app = app(ScriptedProvider::replying("hi"));
    let (token, _) = app.register("ada@example.com").await;

    let reply = app
        .send(
            "PUT",
            "/api/user/profile",
            Some(&token),
            Some(json!({"name": "Ada Lovelace"})),
            "10.0.0.1",
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["message"], "Profile updated successfully");
    assert_eq!(reply.body["user"]["name"], "Ada Lovelace");
}

// =============================================================================
// Credentials
// =============================================================================

#[tokio::test]
async fn test_missing_token() {
    let app = app(ScriptedProvider::replying("hi"));
    let reply = app.get("/api/user/profile", None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["message"], "No token provided. Authorization denied.");
}

#[tokio::test]
async fn test_expired_token_rejected_everywhere() {
    let app = app(ScriptedProvider::replying("hi"));
    let (_, id) = app.register("ada@example.com").await;

    let issued_long_ago = chrono::Utc::now() - chrono::Duration::days(2);
    let expired = app
        .hub
        .verifier
        .issue_at(&id, Role::User, issued_long_ago)
        .unwrap();

    for uri in ["/api/auth/me", "/api/user/profile", "/api/user/stats"] {
        let reply = app.get(uri, Some(&expired.token)).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(reply.body["message"], "Token expired. Please login again.");
    }
    let reply = app
        .post("/api/ai/chat", Some(&expired.token), json!({"prompt": "hi"}))
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.provider.calls(), 0);
}

#[tokio::test]
async fn test_tampered_token() {
    let app = app(ScriptedProvider::replying("hi"));
    let (token, _) = app.register("ada@example.com").await;
    let tampered = format!("{}x", token);

    let reply = app.get("/api/auth/me", Some(&tampered)).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["message"], "Invalid token. Authorization denied.");
}

// =============================================================================
// Tool invocations and the ledger
// =============================================================================

#[tokio::test]
async fn test_successful_invocation_records_one_event() {
    let app = app(ScriptedProvider::replying("Hello there"));
    let (token, _) = app.register("ada@example.com").await;

    let reply = app
        .post("/api/ai/chat", Some(&token), json!({"prompt": "Say hello"}))
        .await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert_eq!(reply.body["data"]["response"], "Hello there");
    assert_eq!(reply.body["data"]["tokensUsed"], 42);

    let history = app.get("/api/user/history", Some(&token)).await;
    assert_eq!(history.status, StatusCode::OK);
    let items = history.body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["status"], "success");
    assert_eq!(items[0]["tokens_used"], 42);
    assert_eq!(items[0]["tool_name"], "AI Chat Assistant");
    assert_eq!(history.body["pagination"]["totalItems"], 1);
    assert_eq!(history.body["pagination"]["currentPage"], 1);

    let stats = app.get("/api/user/stats", Some(&token)).await;
    assert_eq!(stats.body["stats"]["totalUsage"], 1);
    assert_eq!(stats.body["stats"]["usageCount"]["chat"], 1);
    assert_eq!(stats.body["stats"]["planType"], "free");
}

#[tokio::test]
async fn test_image_invocation() {
    let app = app(ScriptedProvider::replying("unused"));
    let (token, _) = app.register("ada@example.com").await;

    let reply = app
        .post("/api/ai/image", Some(&token), json!({"prompt": "a lighthouse"}))
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["imageUrl"], "https://img.example/1.png");

    let profile = app.get("/api/user/profile", Some(&token)).await;
    assert_eq!(profile.body["user"]["usage_count"]["image"], 1);
}

#[tokio::test]
async fn test_provider_failure_records_failed_event() {
    let app = app(ScriptedProvider::failing("Rate limit reached for requests"));
    let (token, _) = app.register("ada@example.com").await;

    let reply = app
        .post(
            "/api/ai/code",
            Some(&token),
            json!({"description": "fizzbuzz", "language": "rust"}),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_GATEWAY);
    assert_eq!(reply.body["success"], false);
    assert_eq!(reply.body["message"], "Rate limit reached for requests");

    let history = app.get("/api/user/history", Some(&token)).await;
    let items = history.body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["status"], "failed");
    assert!(items[0]["error"].is_string());
    assert_eq!(items[0]["tokens_used"], 0);

    let profile = app.get("/api/user/profile", Some(&token)).await;
    assert_eq!(profile.body["user"]["usage_count"], json!({}));
}

#[tokio::test]
async fn test_missing_field_records_nothing() {
    let app = app(ScriptedProvider::replying("hi"));
    let (token, _) = app.register("ada@example.com").await;

    let reply = app.post("/api/ai/chat", Some(&token), json!({})).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["message"], "Prompt is required");

    let reply = app
        .post("/api/ai/resume", Some(&token), json!({"name": "Ada"}))
        .await;
    assert_eq!(reply.body["message"], "Name and email are required");

    assert_eq!(app.provider.calls(), 0);
    let history = app.get("/api/user/history", Some(&token)).await;
    assert_eq!(history.body["data"], json!([]));
    assert_eq!(history.body["pagination"]["totalItems"], 0);
}

#[tokio::test]
async fn test_quiz_with_malformed_json_returns_raw_text() {
    let raw = "Here is your quiz:\n1. What is ownership?";
    let app = app(ScriptedProvider::replying(raw));
    let (token, _) = app.register("ada@example.com").await;

    let reply = app
        .post(
            "/api/ai/study",
            Some(&token),
            json!({"topic": "Rust ownership", "type": "quiz"}),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert_eq!(reply.body["data"]["content"], raw);
    assert_eq!(reply.body["data"]["type"], "quiz");
}

#[tokio::test]
async fn test_flashcards_parse_into_structure() {
    let app = app(ScriptedProvider::replying(
        r#"[{"question": "What is a borrow?", "answer": "A reference"}]"#,
    ));
    let (token, _) = app.register("ada@example.com").await;

    let reply = app
        .post(
            "/api/ai/study",
            Some(&token),
            json!({"topic": "Rust", "type": "flashcards"}),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["content"][0]["answer"], "A reference");
}

#[tokio::test]
async fn test_history_filter_and_delete() {
    let app = app(ScriptedProvider::replying("done"));
    let (token, _) = app.register("ada@example.com").await;
    app.post("/api/ai/chat", Some(&token), json!({"prompt": "a"}))
        .await;
    app.post(
        "/api/ai/content",
        Some(&token),
        json!({"topic": "launch", "contentType": "blog"}),
    )
    .await;

    let reply = app
        .get(
            "/api/user/history?tool=AI%20Chat%20Assistant&limit=5",
            Some(&token),
        )
        .await;
    let items = reply.body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(reply.body["pagination"]["itemsPerPage"], 5);

    let id = items[0]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/user/history/{}", id);
    let reply = app.send("DELETE", &uri, Some(&token), None, "10.0.0.1").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["message"], "History item deleted successfully");

    let reply = app.send("DELETE", &uri, Some(&token), None, "10.0.0.1").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    // Another account cannot delete someone else's entry.
    let remaining = app.get("/api/user/history", Some(&token)).await;
    let other_id = remaining.body["data"][0]["id"].as_str().unwrap().to_string();
    let (intruder, _) = app.register("eve@example.com").await;
    let reply = app
        .send(
            "DELETE",
            &format!("/api/user/history/{}", other_id),
            Some(&intruder),
            None,
            "10.0.0.1",
        )
        .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_enforced_plan_ceiling() {
    let app = app_with(ScriptedProvider::replying("resume"), |config| {
        config.quota.enforce_plan_limits = true;
    });
    let (token, _) = app.register("ada@example.com").await;
    let body = json!({"name": "Ada", "email": "ada@example.com"});

    for _ in 0..3 {
        let reply = app.post("/api/ai/resume", Some(&token), body.clone()).await;
        assert_eq!(reply.status, StatusCode::OK);
    }
    let reply = app.post("/api/ai/resume", Some(&token), body).await;
    assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(app.provider.calls(), 3);
}

// =============================================================================
// Rate limits
// =============================================================================

#[tokio::test]
async fn test_auth_window_counts_failures_only() {
    let app = app(ScriptedProvider::replying("hi"));
    app.register("ada@example.com").await;

    // Successful logins are given back.
    for _ in 0..6 {
        let reply = app
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"email": "ada@example.com", "password": "secret123"})),
                "192.0.2.1",
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK);
    }

    let bad = json!({"email": "ada@example.com", "password": "wrong-pass"});
    for _ in 0..5 {
        let reply = app
            .send("POST", "/api/auth/login", None, Some(bad.clone()), "192.0.2.2")
            .await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    }
    let reply = app
        .send("POST", "/api/auth/login", None, Some(bad), "192.0.2.2")
        .await;
    assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        reply.body["message"],
        "Too many authentication attempts, please try again later."
    );
    assert!(reply.headers.get("retry-after").is_some());

    // Other clients are unaffected.
    let reply = app
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "ada@example.com", "password": "secret123"})),
            "192.0.2.3",
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn test_ai_window() {
    let app = app_with(ScriptedProvider::replying("hi"), |config| {
        config.rate_limits.ai.max_requests = 2;
    });
    let (token, _) = app.register("ada@example.com").await;

    for _ in 0..2 {
        let reply = app
            .post("/api/ai/chat", Some(&token), json!({"prompt": "hi"}))
            .await;
        assert_eq!(reply.status, StatusCode::OK);
    }
    let reply = app
        .post("/api/ai/chat", Some(&token), json!({"prompt": "hi"}))
        .await;
    assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        reply.body["message"],
        "AI tool usage limit reached. Please try again later or upgrade your plan."
    );
    assert_eq!(app.provider.calls(), 2);
}

#[tokio::test]
async fn test_ai_window_ignores_unauthenticated_requests() {
    let app = app_with(ScriptedProvider::replying("hi"), |config| {
        config.rate_limits.ai.max_requests = 2;
    });
    let (token, _) = app.register("ada@example.com").await;

    for _ in 0..2 {
        let reply = app.post("/api/ai/chat", None, json!({"prompt": "hi"})).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    }
    for _ in 0..2 {
        let reply = app
            .post("/api/ai/chat", Some(&token), json!({"prompt": "hi"}))
            .await;
        assert_eq!(reply.status, StatusCode::OK);
    }
    assert_eq!(app.provider.calls(), 2);
}

#[tokio::test]
async fn test_api_window_sends_standard_headers() {
    let app = app(ScriptedProvider::replying("hi"));

    let reply = app.get("/api/tools", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.headers.get("ratelimit-limit").unwrap(), "100");
    assert_eq!(reply.headers.get("ratelimit-remaining").unwrap(), "99");
    assert!(reply.headers.get("ratelimit-reset").is_some());

    // Outside `/api` nothing is counted.
    let reply = app.get("/health", None).await;
    assert!(reply.headers.get("ratelimit-limit").is_none());
}

// =============================================================================
// Admin
// =============================================================================

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let app = app(ScriptedProvider::replying("hi"));
    let (user_token, user_id) = app.register("ada@example.com").await;

    let reply = app.get("/api/admin/users", Some(&user_token)).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body["message"], "Access denied. Admin privileges required.");

    let reply = app.get("/api/admin/users", None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    app.hub
        .accounts
        .update(
            &user_id,
            &AccountUpdate {
                role: Some(Role::Admin),
                ..AccountUpdate::default()
            },
        )
        .unwrap();
    let admin = app
        .post(
            "/api/auth/login",
            None,
            json!({"email": "ada@example.com", "password": "secret123"}),
        )
        .await;
    let admin_token = admin.body["token"].as_str().unwrap().to_string();

    let reply = app.get("/api/admin/users", Some(&admin_token)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["count"], 1);
    assert_no_credential(&reply.body);

    let (_, other) = app.register("bob@example.com").await;
    let reply = app
        .send(
            "PUT",
            &format!("/api/admin/users/{}", other),
            Some(&admin_token),
            Some(json!({"plan_type": "pro"})),
            "10.0.0.1",
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["user"]["plan_type"], "pro");

    let reply = app
        .post(
            &format!("/api/admin/users/{}/reconcile", other),
            Some(&admin_token),
            json!({}),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["changed"], false);

    let reply = app.get("/api/admin/analytics", Some(&admin_token)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body["data"].is_array());
}

// =============================================================================
// Service endpoints
// =============================================================================

#[tokio::test]
async fn test_service_endpoints() {
    let app = app(ScriptedProvider::replying("hi"));

    let reply = app.get("/", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["message"], "Welcome to AI Hub API");

    let reply = app.get("/health", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["database"], "connected");
    assert_eq!(reply.headers.get("x-content-type-options").unwrap(), "nosniff");

    let reply = app.get("/api/tools", None).await;
    assert_eq!(reply.body["count"], 6);
    let slugs: Vec<&str> = reply.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["slug"].as_str().unwrap())
        .collect();
    assert!(slugs.contains(&"ai-chat"));
}

#[tokio::test]
async fn test_unknown_route_is_404_envelope() {
    let app = app(ScriptedProvider::replying("hi"));
    let reply = app.get("/api/nope", None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["success"], false);
    assert_eq!(reply.body["message"], "Not Found - /api/nope");
}

#[tokio::test]
async fn test_unknown_api_path_counts_against_api_window() {
    let app = app(ScriptedProvider::replying("hi"));

    let reply = app.get("/api/unknown", None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["message"], "Not Found - /api/unknown");
    assert_eq!(reply.headers.get("ratelimit-remaining").unwrap(), "99");

    let reply = app.get("/api/tools", None).await;
    assert_eq!(reply.headers.get("ratelimit-remaining").unwrap(), "98");

    let reply = app.get("/nope", None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert!(reply.headers.get("ratelimit-limit").is_none());
}

//! Configuration structures.
//!
//! Configuration is loaded from environment variables (optionally seeded from a
//! `.env` file by the binary). Durations use humantime notation (`15m`, `24h`).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::errors::{Error, Result};

/// Global service configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Credential issuing and verification.
    #[serde(default)]
    pub auth: AuthConfig,

    /// External AI provider.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Document store.
    #[serde(default)]
    pub store: StoreConfig,

    /// Per-client request windows.
    #[serde(default)]
    pub rate_limits: RateLimitConfig,

    /// Usage accounting behavior.
    #[serde(default)]
    pub quota: QuotaConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP bind address.
    pub listen_addr: String,

    /// Origin allowed by CORS (the dashboard).
    pub frontend_origin: String,

    /// Deployment label reported by `/health`.
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5000".to_string(),
            frontend_origin: "http://localhost:5173".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing bearer tokens.
    #[serde(skip_serializing)]
    pub jwt_secret: String,

    /// Token validity window.
    #[serde(with = "humantime_serde")]
    pub token_ttl: Duration,

    /// PBKDF2 iteration count for new password hashes.
    pub password_rounds: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl: Duration::from_secs(24 * 60 * 60),
            password_rounds: 100_000,
        }
    }
}

/// External provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider API key. `None` means AI tools fail with `ProviderUnconfigured`.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,

    /// Model used when the caller does not choose one.
    pub default_model: String,

    /// Optional whole-request timeout. Unset keeps the client default.
    #[serde(default, with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            default_model: "gpt-3.5-turbo".to_string(),
            request_timeout: None,
        }
    }
}

/// Store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file.
    pub database_path: String,

    /// Maximum pooled connections.
    pub pool_size: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: "aihub.db".to_string(),
            pool_size: 8,
        }
    }
}

/// Where rate-limit windows live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitBackend {
    /// Process-local counters (single instance).
    #[default]
    Memory,
    /// Counters in the shared store (multiple instances on one database).
    Store,
}

/// One fixed request window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowLimit {
    /// Requests allowed per window.
    pub max_requests: u32,

    /// Window length.
    #[serde(with = "humantime_serde")]
    pub window: Duration,

    /// Do not count requests that end with a status below 400.
    pub skip_successful: bool,

    /// Emit `RateLimit-*` headers on every response.
    pub standard_headers: bool,

    /// Body message when the window is exhausted.
    pub message: String,
}

/// Rate limit windows per route group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub backend: RateLimitBackend,
    /// Every `/api` route.
    pub api: WindowLimit,
    /// Register and login.
    pub auth: WindowLimit,
    /// AI tool endpoints.
    pub ai: WindowLimit,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            backend: RateLimitBackend::Memory,
            api: WindowLimit {
                max_requests: 100,
                window: Duration::from_secs(15 * 60),
                skip_successful: false,
                standard_headers: true,
                message: "Too many requests from this IP, please try again later.".to_string(),
            },
            auth: WindowLimit {
                max_requests: 5,
                window: Duration::from_secs(15 * 60),
                skip_successful: true,
                standard_headers: false,
                message: "Too many authentication attempts, please try again later.".to_string(),
            },
            ai: WindowLimit {
                max_requests: 50,
                window: Duration::from_secs(60 * 60),
                skip_successful: false,
                standard_headers: false,
                message: "AI tool usage limit reached. Please try again later or upgrade your plan."
                    .to_string(),
            },
        }
    }
}

/// Usage accounting configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QuotaConfig {
    /// Reject tool calls once the plan ceiling for the category is reached.
    pub enforce_plan_limits: bool,

    /// Write the success event and the counter increment in one transaction.
    pub atomic_accounting: bool,
}

impl Config {
    /// Build configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Unset keys keep their defaults; `JWT_SECRET` is mandatory.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(addr) = get("AIHUB_LISTEN_ADDR") {
            config.server.listen_addr = addr;
        } else if let Some(port) = get("PORT") {
            let port: u16 = port
                .parse()
                .map_err(|_| Error::validation(format!("PORT is not a valid port: {}", port)))?;
            config.server.listen_addr = format!("0.0.0.0:{}", port);
        }
        if let Some(origin) = get("FRONTEND_URL") {
            config.server.frontend_origin = origin;
        }
        if let Some(env) = get("AIHUB_ENV") {
            config.server.environment = env;
        }

        if let Some(level) = get("AIHUB_LOG_LEVEL") {
            config.observability.log_level = level;
        }
        if let Some(format) = get("AIHUB_LOG_FORMAT") {
            config.observability.json_logs = format.eq_ignore_ascii_case("json");
        }

        config.auth.jwt_secret = get("JWT_SECRET")
            .ok_or_else(|| Error::validation("JWT_SECRET must be set"))?;
        if let Some(ttl) = get("JWT_EXPIRES_IN") {
            config.auth.token_ttl = parse_duration("JWT_EXPIRES_IN", &ttl)?;
        }
        if let Some(rounds) = get("AIHUB_PASSWORD_ROUNDS") {
            config.auth.password_rounds = parse_number("AIHUB_PASSWORD_ROUNDS", &rounds)?;
        }

        config.provider.api_key = get("OPENAI_API_KEY");
        if let Some(url) = get("OPENAI_BASE_URL") {
            config.provider.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = get("OPENAI_MODEL") {
            config.provider.default_model = model;
        }
        if let Some(timeout) = get("AIHUB_PROVIDER_TIMEOUT") {
            config.provider.request_timeout =
                Some(parse_duration("AIHUB_PROVIDER_TIMEOUT", &timeout)?);
        }

        if let Some(path) = get("DATABASE_PATH") {
            config.store.database_path = path;
        }
        if let Some(size) = get("AIHUB_DB_POOL_SIZE") {
            config.store.pool_size = parse_number("AIHUB_DB_POOL_SIZE", &size)?;
        }

        if let Some(backend) = get("AIHUB_RATE_LIMIT_BACKEND") {
            config.rate_limits.backend = match backend.to_ascii_lowercase().as_str() {
                "memory" => RateLimitBackend::Memory,
                "store" => RateLimitBackend::Store,
                other => {
                    return Err(Error::validation(format!(
                        "AIHUB_RATE_LIMIT_BACKEND must be 'memory' or 'store', got '{}'",
                        other
                    )))
                }
            };
        }

        if let Some(flag) = get("AIHUB_ENFORCE_PLAN_LIMITS") {
            config.quota.enforce_plan_limits = parse_flag("AIHUB_ENFORCE_PLAN_LIMITS", &flag)?;
        }
        if let Some(flag) = get("AIHUB_ATOMIC_ACCOUNTING") {
            config.quota.atomic_accounting = parse_flag("AIHUB_ATOMIC_ACCOUNTING", &flag)?;
        }

        Ok(config)
    }
}

fn parse_duration(key: &str, value: &str) -> Result<Duration> {
    humantime_serde::re::humantime::parse_duration(value)
        .map_err(|e| Error::validation(format!("{} is not a valid duration: {}", key, e)))
}

fn parse_number(key: &str, value: &str) -> Result<u32> {
    value
        .parse()
        .map_err(|_| Error::validation(format!("{} must be a positive integer", key)))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::validation(format!("{} must be a boolean", key))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_requires_jwt_secret() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_defaults_match_published_limits() {
        let config = Config::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();

        assert_eq!(config.server.listen_addr, "0.0.0.0:5000");
        assert_eq!(config.auth.token_ttl, Duration::from_secs(86_400));
        assert!(config.provider.api_key.is_none());
        assert_eq!(config.rate_limits.api.max_requests, 100);
        assert_eq!(config.rate_limits.api.window, Duration::from_secs(900));
        assert_eq!(config.rate_limits.auth.max_requests, 5);
        assert!(config.rate_limits.auth.skip_successful);
        assert_eq!(config.rate_limits.ai.max_requests, 50);
        assert_eq!(config.rate_limits.ai.window, Duration::from_secs(3600));
        assert!(!config.quota.enforce_plan_limits);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "s3cret"),
            ("PORT", "8080"),
            ("JWT_EXPIRES_IN", "2h"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:9999/v1/"),
            ("AIHUB_RATE_LIMIT_BACKEND", "store"),
            ("AIHUB_ENFORCE_PLAN_LIMITS", "true"),
            ("AIHUB_LOG_FORMAT", "JSON"),
        ]))
        .unwrap();

        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.auth.token_ttl, Duration::from_secs(7200));
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.provider.base_url, "http://localhost:9999/v1");
        assert_eq!(config.rate_limits.backend, RateLimitBackend::Store);
        assert!(config.quota.enforce_plan_limits);
        assert!(config.observability.json_logs);
    }

    #[test]
    fn test_blank_api_key_counts_as_unset() {
        let config =
            Config::from_lookup(lookup(&[("JWT_SECRET", "s"), ("OPENAI_API_KEY", "  ")])).unwrap();
        assert!(config.provider.api_key.is_none());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::from_lookup(lookup(&[("JWT_SECRET", "s"), ("PORT", "http")])).is_err());
        assert!(
            Config::from_lookup(lookup(&[("JWT_SECRET", "s"), ("JWT_EXPIRES_IN", "soon")]))
                .is_err()
        );
        assert!(Config::from_lookup(lookup(&[
            ("JWT_SECRET", "s"),
            ("AIHUB_RATE_LIMIT_BACKEND", "redis")
        ]))
        .is_err());
    }
}

//! Fixed-window request limits keyed by client address.
//!
//! Counters live behind [`RateLimitStore`]: an in-process map by default, or
//! the shared SQLite table so several server processes see the same windows.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::store::Store;
use crate::types::{Error, RateLimitBackend, RateLimitConfig, Result, WindowLimit};

// =============================================================================
// Counter storage
// =============================================================================

/// Window counter backend. `window_start` and `before` are epoch millis.
pub trait RateLimitStore: Send + Sync + fmt::Debug {
    /// Count a hit and return the total for the window, this hit included.
    fn hit(&self, key: &str, window_start: i64) -> Result<u32>;

    /// Undo one hit in the given window, if it is still current.
    fn release(&self, key: &str, window_start: i64) -> Result<()>;

    /// Forget windows that started before `before`.
    fn prune(&self, before: i64) -> Result<usize>;
}

#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    /// key → (window_start, count)
    windows: Mutex<HashMap<String, (i64, u32)>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    fn hit(&self, key: &str, window_start: i64) -> Result<u32> {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let entry = windows.entry(key.to_string()).or_insert((window_start, 0));
        if entry.0 != window_start {
            *entry = (window_start, 0);
        }
        entry.1 = entry.1.saturating_add(1);
        Ok(entry.1)
    }

    fn release(&self, key: &str, window_start: i64) -> Result<()> {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = windows.get_mut(key) {
            if entry.0 == window_start {
                entry.1 = entry.1.saturating_sub(1);
            }
        }
        Ok(())
    }

    fn prune(&self, before: i64) -> Result<usize> {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let len = windows.len();
        windows.retain(|_, (start, _)| *start >= before);
        Ok(len - windows.len())
    }
}

/// Windows kept in the `rate_limit_windows` table.
#[derive(Debug, Clone)]
pub struct SqliteRateLimitStore {
    store: Store,
}

impl SqliteRateLimitStore {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

impl RateLimitStore for SqliteRateLimitStore {
    fn hit(&self, key: &str, window_start: i64) -> Result<u32> {
        self.store.hit_window(key, window_start)
    }

    fn release(&self, key: &str, window_start: i64) -> Result<()> {
        self.store.release_window(key, window_start)
    }

    fn prune(&self, before: i64) -> Result<usize> {
        self.store.prune_windows(before)
    }
}

// =============================================================================
// Limiter
// =============================================================================

/// Result of an admitted request, used for `RateLimit-*` headers and release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub limit: u32,
    pub remaining: u32,
    /// Seconds until the window resets.
    pub reset_after_secs: u64,
    key: String,
    window_start: i64,
    counted: bool,
}

#[derive(Debug, Clone)]
pub struct RateLimiter {
    scope: &'static str,
    limit: WindowLimit,
    store: Arc<dyn RateLimitStore>,
}

impl RateLimiter {
    pub fn new(scope: &'static str, limit: WindowLimit, store: Arc<dyn RateLimitStore>) -> Self {
        Self {
            scope,
            limit,
            store,
        }
    }

    pub fn scope(&self) -> &'static str {
        self.scope
    }

    pub fn limit(&self) -> &WindowLimit {
        &self.limit
    }

    fn window_millis(&self) -> i64 {
        i64::try_from(self.limit.window.as_millis())
            .unwrap_or(i64::MAX)
            .max(1)
    }

    pub fn check(&self, client: &str) -> Result<RateLimitDecision> {
        self.check_at(client, chrono::Utc::now().timestamp_millis())
    }

    /// Count a request from `client` at `now_ms` and admit or reject it.
    ///
    /// A backend failure admits the request uncounted.
    pub fn check_at(&self, client: &str, now_ms: i64) -> Result<RateLimitDecision> {
        let window = self.window_millis();
        let window_start = now_ms - now_ms.rem_euclid(window);
        let reset_after_ms = window_start + window - now_ms;
        let reset_after_secs = u64::try_from((reset_after_ms + 999) / 1000)
            .unwrap_or(1)
            .max(1);
        let key = format!("{}:{}", self.scope, client);
        let max = self.limit.max_requests;

        let count = match self.store.hit(&key, window_start) {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(scope = self.scope, error = %e, "Rate limit store failed; admitting request");
                return Ok(RateLimitDecision {
                    limit: max,
                    remaining: max,
                    reset_after_secs,
                    key,
                    window_start,
                    counted: false,
                });
            }
        };

        if count > max {
            tracing::debug!(scope = self.scope, client, count, "Rate limit exceeded");
            return Err(Error::RateLimited {
                message: self.limit.message.clone(),
                retry_after_secs: reset_after_secs,
            });
        }

        Ok(RateLimitDecision {
            limit: max,
            remaining: max - count,
            reset_after_secs,
            key,
            window_start,
            counted: true,
        })
    }

    /// Give back the hit recorded by `decision`.
    pub fn release(&self, decision: &RateLimitDecision) {
        if !decision.counted {
            return;
        }
        if let Err(e) = self.store.release(&decision.key, decision.window_start) {
            tracing::warn!(scope = self.scope, error = %e, "Failed to release rate limit hit");
        }
    }
}

/// The three limiters guarding the HTTP surface.
#[derive(Debug, Clone)]
pub struct RateLimiters {
    pub api: RateLimiter,
    pub auth: RateLimiter,
    pub ai: RateLimiter,
    store: Arc<dyn RateLimitStore>,
}

impl RateLimiters {
    pub fn new(config: &RateLimitConfig, store: &Store) -> Self {
        let backend: Arc<dyn RateLimitStore> = match config.backend {
            RateLimitBackend::Memory => Arc::new(InMemoryRateLimitStore::new()),
            RateLimitBackend::Store => Arc::new(SqliteRateLimitStore::new(store.clone())),
        };
        Self::with_store(config, backend)
    }

    pub fn with_store(config: &RateLimitConfig, store: Arc<dyn RateLimitStore>) -> Self {
        Self {
            api: RateLimiter::new("api", config.api.clone(), store.clone()),
            auth: RateLimiter::new("auth", config.auth.clone(), store.clone()),
            ai: RateLimiter::new("ai", config.ai.clone(), store.clone()),
            store,
        }
    }

    /// Drop windows older than the longest configured window.
    pub fn prune_expired(&self, now_ms: i64) -> Result<usize> {
        let longest = [&self.api, &self.auth, &self.ai]
            .iter()
            .map(|l| l.window_millis())
            .max()
            .unwrap_or(0);
        self.store.prune(now_ms.saturating_sub(longest))
    }
}

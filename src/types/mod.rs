//! Core types for the AI Hub backend.
//!
//! This module provides foundational types used throughout the system:
//! - **IDs**: Strongly-typed identifiers (AccountId, UsageEventId, RequestId)
//! - **Errors**: Application error types with thiserror derives and HTTP mapping
//! - **Config**: Configuration structures for server, auth, provider, store and limits

mod config;
mod errors;
mod ids;

pub use config::{
    AuthConfig, Config, ObservabilityConfig, ProviderConfig, QuotaConfig, RateLimitBackend,
    RateLimitConfig, ServerConfig, StoreConfig, WindowLimit,
};
pub use errors::{Error, Result};
pub use ids::{AccountId, RequestId, UsageEventId};

//! Service wiring: everything a request handler needs, shared behind `Arc`.

pub mod accounts;
pub mod ledger;
pub mod orchestrator;
pub mod rate_limiter;
pub mod types;

pub use accounts::{AccountService, LoginRequest, RegisterRequest, Session};
pub use ledger::{Attempt, QuotaLedger, ReconcileReport, UsageStats};
pub use orchestrator::RequestOrchestrator;
pub use rate_limiter::{
    InMemoryRateLimitStore, RateLimitDecision, RateLimitStore, RateLimiter, RateLimiters,
    SqliteRateLimitStore,
};
pub use types::{Invocation, InvocationPhase};

use std::sync::Arc;

use crate::auth::CredentialVerifier;
use crate::gateway::{OpenAiProvider, ProviderClient, ToolGateway};
use crate::store::Store;
use crate::tools::{builtin_tools, ToolAccessPolicy, ToolCatalog};
use crate::types::{Config, Error, Result};

/// Run synchronous store or hashing work on the blocking pool so a slow
/// connection checkout never stalls the async workers.
pub async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::internal(format!("blocking task failed: {}", e)))?
}

#[derive(Debug)]
pub struct Hub {
    pub config: Config,
    pub store: Store,
    pub verifier: CredentialVerifier,
    pub catalog: Arc<ToolCatalog>,
    pub accounts: AccountService,
    pub ledger: QuotaLedger,
    pub orchestrator: RequestOrchestrator,
    pub limiters: RateLimiters,
}

impl Hub {
    /// Seed the builtin tools, load the catalog and wire the services.
    pub fn new(config: Config, store: Store, provider: Arc<dyn ProviderClient>) -> Result<Self> {
        let seeded = store.seed_tools(&builtin_tools())?;
        let catalog = Arc::new(ToolCatalog::from_definitions(store.list_tools(true)?)?);
        tracing::info!(seeded, tools = catalog.len(), "Tool catalog loaded");

        let verifier = CredentialVerifier::new(&config.auth.jwt_secret, config.auth.token_ttl)?;
        let ledger = QuotaLedger::new(store.clone(), config.quota.atomic_accounting);
        let policy = ToolAccessPolicy::new(config.quota.enforce_plan_limits);
        let gateway = ToolGateway::new(provider, config.provider.default_model.clone());

        Ok(Self {
            accounts: AccountService::new(
                store.clone(),
                verifier.clone(),
                config.auth.password_rounds,
            ),
            orchestrator: RequestOrchestrator::new(
                gateway,
                ledger.clone(),
                catalog.clone(),
                policy,
                store.clone(),
            ),
            limiters: RateLimiters::new(&config.rate_limits, &store),
            ledger,
            verifier,
            catalog,
            store,
            config,
        })
    }

    /// Open the store and build the OpenAI-compatible provider from config.
    pub fn from_config(config: Config) -> Result<Self> {
        let store = Store::open(&config.store)?;
        let provider = OpenAiProvider::new(&config.provider)?;
        if !provider.is_configured() {
            tracing::warn!("OPENAI_API_KEY not set; AI tools will answer 503");
        }
        Self::new(config, store, Arc::new(provider))
    }
}

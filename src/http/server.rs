//! HTTP server: listener, graceful shutdown and background maintenance.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::http::router::build_router;
use crate::hub::Hub;
use crate::types::{Error, Result};

/// How often expired rate-limit windows are dropped.
const PRUNE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// HTTP server wrapping the hub.
#[derive(Debug)]
pub struct HttpServer {
    hub: Arc<Hub>,
    addr: SocketAddr,
    cancel: CancellationToken,
}

impl HttpServer {
    pub fn new(hub: Arc<Hub>, addr: SocketAddr) -> Self {
        Self {
            hub,
            addr,
            cancel: CancellationToken::new(),
        }
    }

    /// Parse the configured listen address.
    pub fn from_hub(hub: Arc<Hub>) -> Result<Self> {
        let raw = &hub.config.server.listen_addr;
        let addr = raw
            .parse()
            .map_err(|e| Error::validation(format!("Invalid listen address {}: {}", raw, e)))?;
        Ok(Self::new(hub, addr))
    }

    /// Token that stops the server when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Bind and serve until cancelled. In-flight requests are drained.
    pub async fn serve(&self) -> Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve_on(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve_on(&self, listener: TcpListener) -> Result<()> {
        let local = listener.local_addr()?;
        tracing::info!(addr = %local, "HTTP server listening");

        let pruner = tokio::spawn(prune_windows(self.hub.clone(), self.cancel.clone()));

        let app = build_router(self.hub.clone());
        let cancel = self.cancel.clone();
        let served = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await;

        self.cancel.cancel();
        if let Err(e) = pruner.await {
            tracing::warn!(error = %e, "Rate limit pruner ended abnormally");
        }
        served?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

async fn prune_windows(hub: Arc<Hub>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(PRUNE_INTERVAL);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let now = chrono::Utc::now().timestamp_millis();
                match hub.limiters.prune_expired(now) {
                    Ok(0) => {}
                    Ok(pruned) => tracing::debug!(pruned, "Pruned expired rate limit windows"),
                    Err(e) => tracing::warn!(error = %e, "Failed to prune rate limit windows"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::OpenAiProvider;
    use crate::store::Store;
    use crate::types::{Config, ProviderConfig};

    fn hub() -> Arc<Hub> {
        let mut config = Config::default();
        config.auth.jwt_secret = "secret".into();
        config.server.listen_addr = "127.0.0.1:0".into();
        let provider = Arc::new(OpenAiProvider::new(&ProviderConfig::default()).unwrap());
        Arc::new(Hub::new(config, Store::open_in_memory().unwrap(), provider).unwrap())
    }

    #[test]
    fn test_from_hub_rejects_bad_addr() {
        let hub = hub();
        assert!(HttpServer::from_hub(hub).is_ok());

        let mut config = Config::default();
        config.auth.jwt_secret = "secret".into();
        config.server.listen_addr = "localhost".into();
        let provider = Arc::new(OpenAiProvider::new(&ProviderConfig::default()).unwrap());
        let hub = Arc::new(Hub::new(config, Store::open_in_memory().unwrap(), provider).unwrap());
        assert!(matches!(HttpServer::from_hub(hub), Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_serves_until_cancelled() {
        let server = Arc::new(HttpServer::from_hub(hub()).unwrap());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let task = {
            let server = server.clone();
            tokio::spawn(async move { server.serve_on(listener).await })
        };

        let body: serde_json::Value = reqwest::get(format!("http://{}/health", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["success"], true);

        server.shutdown();
        task.await.unwrap().unwrap();
    }
}

//! External provider client (OpenAI-compatible chat and image endpoints).
//!
//! One HTTP call per invocation, no retries. A provider error without a usable
//! message comes back as `Error::Provider` with an empty string; the gateway
//! substitutes the per-tool fallback text.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Error, ProviderConfig, Result};

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Body of `POST /chat/completions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub model: String,
    pub total_tokens: i64,
}

/// Body of `POST /images/generations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
    pub n: u32,
    pub size: String,
    pub quality: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub url: Option<String>,
    pub revised_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionBody {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChoiceBody>,
    #[serde(default)]
    usage: Option<UsageBody>,
}

#[derive(Debug, Deserialize)]
struct ChoiceBody {
    message: ChoiceMessageBody,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessageBody {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageBody {
    #[serde(default)]
    total_tokens: i64,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationBody {
    #[serde(default)]
    data: Vec<ImageDataBody>,
}

#[derive(Debug, Deserialize)]
struct ImageDataBody {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    revised_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

// =============================================================================
// Provider trait
// =============================================================================

/// Seam between the gateway and the model vendor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion>;

    async fn generate_image(&self, request: &ImageRequest) -> Result<GeneratedImage>;
}

// =============================================================================
// OpenAI-compatible HTTP client
// =============================================================================

pub struct OpenAiProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("base_url", &self.base_url)
            .field("configured", &self.api_key.is_some())
            .finish()
    }
}

fn unreachable_err(e: reqwest::Error) -> Error {
    Error::ProviderUnreachable(e.to_string())
}

impl OpenAiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::internal(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let api_key = self.api_key.as_deref().ok_or(Error::ProviderUnconfigured)?;

        let resp = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(unreachable_err)?;

        let status = resp.status();
        let text = resp.text().await.map_err(unreachable_err)?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or_default();
            tracing::warn!(status = status.as_u16(), path, %message, "Provider returned error");
            return Err(Error::Provider(message));
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::warn!(path, error = %e, "Provider response did not parse");
            Error::Provider(String::new())
        })
    }
}

#[async_trait]
impl ProviderClient for OpenAiProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let body: ChatCompletionBody = self.post_json("/chat/completions", request).await?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Provider(String::new()))?;

        Ok(Completion {
            text,
            model: body.model.unwrap_or_else(|| request.model.clone()),
            total_tokens: body.usage.map(|u| u.total_tokens).unwrap_or(0),
        })
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<GeneratedImage> {
        let body: ImageGenerationBody = self.post_json("/images/generations", request).await?;

        let first = body
            .data
            .into_iter()
            .next()
            .ok_or_else(|| Error::Provider(String::new()))?;

        Ok(GeneratedImage {
            url: first.url,
            revised_prompt: first.revised_prompt,
        })
    }
}

//! Tool Gateway: turns a validated [`ToolRequest`] into one provider call and
//! normalizes the answer into a [`ToolResult`].

pub mod prompts;
pub mod provider;
pub mod request;
pub mod structured;

pub use provider::{
    ChatMessage, Completion, CompletionRequest, GeneratedImage, ImageRequest, OpenAiProvider,
    ProviderClient,
};
pub use request::{
    ChatInput, ChatOptions, CodeInput, ContentInput, ContentOptions, ImageInput, ImageOptions,
    ResumeInput, StudyInput, StudyMode, ToolRequest,
};
pub use structured::{parse_structured, Flashcard, Parsed, QuizQuestion};

use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

use crate::tools::ToolKind;
use crate::types::{Error, Result};

// =============================================================================
// Normalized results
// =============================================================================

/// Study output: prose, or flashcards/quiz that may have failed to parse.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StudyContent {
    Flashcards(Parsed<Vec<Flashcard>>),
    Quiz(Parsed<Vec<QuizQuestion>>),
    Text(String),
}

/// Provider answer in tool-specific shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Chat {
        text: String,
        model: String,
        tokens: i64,
    },
    Image {
        image_url: Option<String>,
        revised_prompt: Option<String>,
    },
    Resume {
        resume: String,
        tokens: i64,
    },
    Code {
        code: String,
        language: String,
        tokens: i64,
    },
    Study {
        content: StudyContent,
        mode: String,
        tokens: i64,
    },
    Content {
        content: String,
        content_type: Option<String>,
        tokens: i64,
    },
}

impl ToolResult {
    /// Token count charged to the ledger. Images report none.
    pub fn tokens_used(&self) -> i64 {
        match self {
            ToolResult::Image { .. } => 0,
            ToolResult::Chat { tokens, .. }
            | ToolResult::Resume { tokens, .. }
            | ToolResult::Code { tokens, .. }
            | ToolResult::Study { tokens, .. }
            | ToolResult::Content { tokens, .. } => *tokens,
        }
    }

    /// `data` object returned to the client.
    pub fn response_data(&self, execution_time: f64) -> Value {
        match self {
            ToolResult::Chat {
                text,
                model,
                tokens,
            } => json!({
                "response": text,
                "model": model,
                "tokensUsed": tokens,
                "executionTime": execution_time,
            }),
            ToolResult::Image {
                image_url,
                revised_prompt,
            } => json!({
                "imageUrl": image_url,
                "revisedPrompt": revised_prompt,
                "executionTime": execution_time,
            }),
            ToolResult::Resume { resume, tokens } => json!({
                "resume": resume,
                "tokensUsed": tokens,
                "executionTime": execution_time,
            }),
            ToolResult::Code {
                code,
                language,
                tokens,
            } => json!({
                "code": code,
                "language": language,
                "tokensUsed": tokens,
                "executionTime": execution_time,
            }),
            ToolResult::Study {
                content,
                mode,
                tokens,
            } => json!({
                "content": content,
                "type": mode,
                "tokensUsed": tokens,
                "executionTime": execution_time,
            }),
            ToolResult::Content {
                content,
                content_type,
                tokens,
            } => json!({
                "content": content,
                "contentType": content_type,
                "tokensUsed": tokens,
                "executionTime": execution_time,
            }),
        }
    }

    /// Output payload captured in the usage log.
    pub fn ledger_output(&self) -> Value {
        match self {
            ToolResult::Chat {
                text,
                model,
                tokens,
            } => json!({ "text": text, "model": model, "tokens_used": tokens }),
            ToolResult::Image {
                image_url,
                revised_prompt,
            } => json!({ "image_url": image_url, "revised_prompt": revised_prompt }),
            ToolResult::Resume { resume, tokens } => {
                json!({ "resume": resume, "tokens_used": tokens })
            }
            ToolResult::Code {
                code,
                language,
                tokens,
            } => json!({ "code": code, "language": language, "tokens_used": tokens }),
            ToolResult::Study {
                content,
                mode,
                tokens,
            } => json!({ "content": content, "type": mode, "tokens_used": tokens }),
            ToolResult::Content {
                content,
                content_type,
                tokens,
            } => json!({ "content": content, "contentType": content_type, "tokens_used": tokens }),
        }
    }
}

// =============================================================================
// Gateway
// =============================================================================

#[derive(Clone)]
pub struct ToolGateway {
    provider: Arc<dyn ProviderClient>,
    default_model: String,
}

impl fmt::Debug for ToolGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolGateway")
            .field("default_model", &self.default_model)
            .finish_non_exhaustive()
    }
}

impl ToolGateway {
    pub fn new(provider: Arc<dyn ProviderClient>, default_model: impl Into<String>) -> Self {
        Self {
            provider,
            default_model: default_model.into(),
        }
    }

    /// Issue the provider call for `request`.
    pub async fn invoke(&self, request: &ToolRequest) -> Result<ToolResult> {
        let kind = request.kind();
        self.dispatch(request)
            .await
            .map_err(|e| with_fallback_message(e, kind))
    }

    async fn dispatch(&self, request: &ToolRequest) -> Result<ToolResult> {
        let model = self.default_model.as_str();
        match request {
            ToolRequest::Chat(input) => {
                let completion = self.provider.complete(&prompts::chat(input, model)).await?;
                Ok(ToolResult::Chat {
                    text: completion.text,
                    model: completion.model,
                    tokens: completion.total_tokens,
                })
            }
            ToolRequest::Image(input) => {
                let image = self.provider.generate_image(&prompts::image(input)).await?;
                Ok(ToolResult::Image {
                    image_url: image.url,
                    revised_prompt: image.revised_prompt,
                })
            }
            ToolRequest::Resume(input) => {
                let completion = self.provider.complete(&prompts::resume(input, model)).await?;
                Ok(ToolResult::Resume {
                    resume: completion.text,
                    tokens: completion.total_tokens,
                })
            }
            ToolRequest::Code(input) => {
                let completion = self.provider.complete(&prompts::code(input, model)).await?;
                Ok(ToolResult::Code {
                    code: completion.text,
                    language: input.language.clone(),
                    tokens: completion.total_tokens,
                })
            }
            ToolRequest::Study(input) => {
                let completion = self.provider.complete(&prompts::study(input, model)).await?;
                let content = match input.mode {
                    StudyMode::Flashcards => {
                        StudyContent::Flashcards(parse_structured(&completion.text))
                    }
                    StudyMode::Quiz => StudyContent::Quiz(parse_structured(&completion.text)),
                    StudyMode::Explain | StudyMode::Freeform(_) => {
                        StudyContent::Text(completion.text)
                    }
                };
                Ok(ToolResult::Study {
                    content,
                    mode: input.mode.as_str().to_string(),
                    tokens: completion.total_tokens,
                })
            }
            ToolRequest::Content(input) => {
                let completion = self.provider.complete(&prompts::content(input, model)).await?;
                Ok(ToolResult::Content {
                    content: completion.text,
                    content_type: input.content_type.clone(),
                    tokens: completion.total_tokens,
                })
            }
        }
    }
}

fn with_fallback_message(err: Error, kind: ToolKind) -> Error {
    match err {
        Error::Provider(message) if message.trim().is_empty() => {
            Error::provider(kind.failure_message())
        }
        other => other,
    }
}

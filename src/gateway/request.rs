//! Typed tool inputs parsed from request bodies.
//!
//! Parsing is lenient about types the way a form-backed client is: strings are
//! trimmed, while empty strings, `false` and zero count as absent. Other numbers
//! and lists are rendered as text. Required-field checks happen here so a bad
//! request never reaches the provider.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::tools::ToolKind;
use crate::types::{Error, Result};

// =============================================================================
// Field helpers
// =============================================================================

fn text_field(body: &Value, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.trim().to_string(),
                    other => other.to_string(),
                })
                .filter(|s| !s.is_empty())
                .collect();
            Some(parts.join(", ")).filter(|s| !s.is_empty())
        }
        obj @ Value::Object(_) => Some(obj.to_string()),
    }
}

fn options_field<T: for<'de> Deserialize<'de> + Default>(body: &Value, key: &str) -> Result<T> {
    match body.get(key) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| Error::validation(format!("Invalid {}: {}", key, e))),
    }
}

// =============================================================================
// Inputs
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatInput {
    pub prompt: String,
    pub options: ChatOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    pub prompt: String,
    pub options: ImageOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResumeInput {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub education: Option<String>,
    pub experience: Option<String>,
    pub skills: Option<String>,
    pub additional: Option<String>,
    /// Body as submitted, kept for the ledger.
    pub submitted: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeInput {
    pub description: String,
    pub language: String,
}

/// What the study assistant should produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudyMode {
    Explain,
    Flashcards,
    Quiz,
    /// Any other requested type; the topic is sent as a free-form prompt.
    Freeform(String),
}

impl StudyMode {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("explain") => StudyMode::Explain,
            Some("flashcards") => StudyMode::Flashcards,
            Some("quiz") => StudyMode::Quiz,
            Some(other) => StudyMode::Freeform(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StudyMode::Explain => "explain",
            StudyMode::Flashcards => "flashcards",
            StudyMode::Quiz => "quiz",
            StudyMode::Freeform(other) => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudyInput {
    pub topic: String,
    pub mode: StudyMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentInput {
    pub content_type: Option<String>,
    pub topic: String,
    pub options: ContentOptions,
}

// =============================================================================
// Tool request
// =============================================================================

/// A validated invocation for one tool kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    Chat(ChatInput),
    Image(ImageInput),
    Resume(ResumeInput),
    Code(CodeInput),
    Study(StudyInput),
    Content(ContentInput),
}

impl ToolRequest {
    /// Validate `body` for `kind`. Missing required fields fail with the
    /// message the client shows to the user.
    pub fn parse(kind: ToolKind, body: &Value) -> Result<Self> {
        if !body.is_object() {
            return Err(Error::validation("Request body must be a JSON object"));
        }

        match kind {
            ToolKind::Chat => Ok(ToolRequest::Chat(ChatInput {
                prompt: text_field(body, "prompt")
                    .ok_or_else(|| Error::validation("Prompt is required"))?,
                options: options_field(body, "options")?,
            })),
            ToolKind::Image => Ok(ToolRequest::Image(ImageInput {
                prompt: text_field(body, "prompt")
                    .ok_or_else(|| Error::validation("Prompt is required"))?,
                options: options_field(body, "options")?,
            })),
            ToolKind::Resume => {
                let (Some(name), Some(email)) =
                    (text_field(body, "name"), text_field(body, "email"))
                else {
                    return Err(Error::validation("Name and email are required"));
                };
                Ok(ToolRequest::Resume(ResumeInput {
                    name,
                    email,
                    phone: text_field(body, "phone"),
                    location: text_field(body, "location"),
                    education: text_field(body, "education"),
                    experience: text_field(body, "experience"),
                    skills: text_field(body, "skills"),
                    additional: text_field(body, "additional"),
                    submitted: body.clone(),
                }))
            }
            ToolKind::Code => Ok(ToolRequest::Code(CodeInput {
                description: text_field(body, "description")
                    .ok_or_else(|| Error::validation("Code description is required"))?,
                language: text_field(body, "language")
                    .unwrap_or_else(|| "javascript".to_string()),
            })),
            ToolKind::Study => Ok(ToolRequest::Study(StudyInput {
                topic: text_field(body, "topic")
                    .ok_or_else(|| Error::validation("Topic is required"))?,
                mode: StudyMode::parse(text_field(body, "type").as_deref()),
            })),
            ToolKind::Content => Ok(ToolRequest::Content(ContentInput {
                content_type: text_field(body, "contentType"),
                topic: text_field(body, "topic")
                    .ok_or_else(|| Error::validation("Topic is required"))?,
                options: options_field(body, "options")?,
            })),
        }
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ToolRequest::Chat(_) => ToolKind::Chat,
            ToolRequest::Image(_) => ToolKind::Image,
            ToolRequest::Resume(_) => ToolKind::Resume,
            ToolRequest::Code(_) => ToolKind::Code,
            ToolRequest::Study(_) => ToolKind::Study,
            ToolRequest::Content(_) => ToolKind::Content,
        }
    }

    /// Input payload captured in the usage log.
    pub fn ledger_input(&self) -> Value {
        match self {
            ToolRequest::Chat(input) => json!({
                "prompt": input.prompt,
                "parameters": input.options,
            }),
            ToolRequest::Image(input) => json!({
                "prompt": input.prompt,
                "parameters": input.options,
            }),
            ToolRequest::Resume(input) => json!({ "userData": input.submitted }),
            ToolRequest::Code(input) => json!({
                "description": input.description,
                "language": input.language,
            }),
            ToolRequest::Study(input) => json!({
                "topic": input.topic,
                "type": input.mode.as_str(),
            }),
            ToolRequest::Content(input) => {
                let mut map = Map::new();
                if let Some(content_type) = &input.content_type {
                    map.insert("contentType".into(), json!(content_type));
                }
                map.insert("topic".into(), json!(input.topic));
                map.insert("options".into(), json!(input.options));
                Value::Object(map)
            }
        }
    }
}

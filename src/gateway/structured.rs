//! Structured study output: flashcards and quizzes.
//!
//! The model is asked for a JSON array. What comes back is checked against a
//! JSON schema derived from the Rust type; anything that does not fit is kept
//! verbatim as [`Parsed::Raw`].

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`.
    pub correct_answer: u32,
}

/// Either a value that matched its schema or the raw model text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Parsed<T> {
    Structured(T),
    Raw(String),
}

impl<T> Parsed<T> {
    pub fn is_structured(&self) -> bool {
        matches!(self, Parsed::Structured(_))
    }
}

/// Models like to wrap JSON in a Markdown fence.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop an info string such as `json` on the opening line.
    match body.split_once('\n') {
        Some((info, inner)) if !info.trim().contains(' ') => inner.trim(),
        _ => body.trim(),
    }
}

fn schema_value<T: JsonSchema>() -> Option<serde_json::Value> {
    serde_json::to_value(schemars::schema_for!(T)).ok()
}

/// Parse `raw` as `T`, accepting it only when it validates against `T`'s
/// schema.
pub fn parse_structured<T>(raw: &str) -> Parsed<T>
where
    T: DeserializeOwned + JsonSchema,
{
    let Ok(instance) = serde_json::from_str::<serde_json::Value>(strip_code_fence(raw)) else {
        return Parsed::Raw(raw.to_string());
    };

    let valid = schema_value::<T>()
        .and_then(|schema| jsonschema::validator_for(&schema).ok())
        .is_some_and(|validator| validator.is_valid(&instance));
    if !valid {
        tracing::debug!(
            target_type = std::any::type_name::<T>(),
            "Structured output failed schema check; returning raw text"
        );
        return Parsed::Raw(raw.to_string());
    }

    match serde_json::from_value(instance) {
        Ok(value) => Parsed::Structured(value),
        Err(_) => Parsed::Raw(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flashcards_parse() {
        let raw = r#"[{"question":"2+2?","answer":"4"},{"question":"Capital of France?","answer":"Paris"}]"#;
        let parsed = parse_structured::<Vec<Flashcard>>(raw);
        match parsed {
            Parsed::Structured(cards) => {
                assert_eq!(cards.len(), 2);
                assert_eq!(cards[1].answer, "Paris");
            }
            Parsed::Raw(_) => panic!("expected structured flashcards"),
        }
    }

    #[test]
    fn test_quiz_in_code_fence() {
        let raw = "```json\n[{\"question\":\"Q\",\"options\":[\"a\",\"b\"],\"correctAnswer\":1}]\n```";
        let parsed = parse_structured::<Vec<QuizQuestion>>(raw);
        assert_eq!(
            parsed,
            Parsed::Structured(vec![QuizQuestion {
                question: "Q".into(),
                options: vec!["a".into(), "b".into()],
                correct_answer: 1,
            }])
        );
    }

    #[test]
    fn test_malformed_json_is_raw() {
        let raw = "Here are your questions: 1. What is Rust?";
        assert_eq!(
            parse_structured::<Vec<QuizQuestion>>(raw),
            Parsed::Raw(raw.to_string())
        );
    }

    #[test]
    fn test_schema_mismatch_is_raw() {
        // Valid JSON, wrong shape: answer index is a letter.
        let raw = r#"[{"question":"Q","options":["a","b"],"correctAnswer":"b"}]"#;
        assert!(!parse_structured::<Vec<QuizQuestion>>(raw).is_structured());

        let raw = r#"{"question":"not an array","answer":"x"}"#;
        assert!(!parse_structured::<Vec<Flashcard>>(raw).is_structured());
    }

    #[test]
    fn test_untagged_serialization() {
        let raw: Parsed<Vec<Flashcard>> = Parsed::Raw("text".into());
        assert_eq!(serde_json::to_value(&raw).unwrap(), serde_json::json!("text"));

        let structured = Parsed::Structured(vec![Flashcard {
            question: "q".into(),
            answer: "a".into(),
        }]);
        assert_eq!(
            serde_json::to_value(&structured).unwrap(),
            serde_json::json!([{"question": "q", "answer": "a"}])
        );
    }
}

//! Prompt templates per tool kind.

use super::provider::{ChatMessage, CompletionRequest, ImageRequest};
use super::request::{ChatInput, CodeInput, ContentInput, ImageInput, ResumeInput, StudyInput, StudyMode};

const NOT_PROVIDED: &str = "Not provided";

pub fn chat(input: &ChatInput, default_model: &str) -> CompletionRequest {
    let options = &input.options;
    CompletionRequest {
        model: options
            .model
            .clone()
            .unwrap_or_else(|| default_model.to_string()),
        messages: vec![
            ChatMessage::system(
                options
                    .system_prompt
                    .as_deref()
                    .unwrap_or("You are a helpful AI assistant."),
            ),
            ChatMessage::user(input.prompt.as_str()),
        ],
        temperature: options.temperature.unwrap_or(0.7),
        max_tokens: options.max_tokens.unwrap_or(1000),
    }
}

pub fn image(input: &ImageInput) -> ImageRequest {
    let options = &input.options;
    ImageRequest {
        prompt: input.prompt.clone(),
        n: options.n.unwrap_or(1),
        size: options
            .size
            .clone()
            .unwrap_or_else(|| "1024x1024".to_string()),
        quality: options
            .quality
            .clone()
            .unwrap_or_else(|| "standard".to_string()),
    }
}

pub fn resume(input: &ResumeInput, model: &str) -> CompletionRequest {
    let field = |v: &Option<String>| v.clone().unwrap_or_else(|| NOT_PROVIDED.to_string());
    let prompt = format!(
        "Create a professional resume in markdown format based on the following information:\n\n\
         Name: {}\n\
         Email: {}\n\
         Phone: {}\n\
         Location: {}\n\n\
         Education:\n{}\n\n\
         Experience:\n{}\n\n\
         Skills:\n{}\n\n\
         Additional Information:\n{}\n\n\
         Please create a well-structured, ATS-friendly resume with proper sections and formatting.",
        input.name,
        input.email,
        field(&input.phone),
        field(&input.location),
        field(&input.education),
        field(&input.experience),
        field(&input.skills),
        field(&input.additional),
    );

    CompletionRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(
                "You are a professional resume writer. Create clean, ATS-friendly resumes in markdown format.",
            ),
            ChatMessage::user(prompt),
        ],
        temperature: 0.7,
        max_tokens: 2000,
    }
}

pub fn code(input: &CodeInput, model: &str) -> CompletionRequest {
    let language = &input.language;
    CompletionRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(format!(
                "You are an expert {} developer. Generate clean, efficient, and well-documented code.",
                language
            )),
            ChatMessage::user(format!(
                "Generate {} code for the following requirement:\n\n{}\n\nProvide clean, well-commented, production-ready code.",
                language, input.description
            )),
        ],
        temperature: 0.5,
        max_tokens: 2000,
    }
}

pub fn study(input: &StudyInput, model: &str) -> CompletionRequest {
    let topic = &input.topic;
    let (system, user) = match &input.mode {
        StudyMode::Explain => (
            "You are a patient and knowledgeable tutor. Explain concepts clearly with examples."
                .to_string(),
            format!("Explain the following topic in detail with examples: {}", topic),
        ),
        StudyMode::Flashcards => (
            "You are a study assistant. Create flashcards in JSON format with question and answer pairs."
                .to_string(),
            format!(
                "Create 5 flashcards for studying: {}. Return as JSON array with \"question\" and \"answer\" fields.",
                topic
            ),
        ),
        StudyMode::Quiz => (
            "You are a quiz creator. Create multiple choice questions in JSON format.".to_string(),
            format!(
                "Create 5 multiple choice questions about: {}. Return as JSON array with \"question\", \"options\" (array), and \"correctAnswer\" (index) fields.",
                topic
            ),
        ),
        StudyMode::Freeform(_) => (
            "You are a helpful study assistant.".to_string(),
            topic.clone(),
        ),
    };

    CompletionRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
        temperature: 0.7,
        max_tokens: 1500,
    }
}

pub fn content(input: &ContentInput, model: &str) -> CompletionRequest {
    let topic = &input.topic;
    let options = &input.options;
    let (system, user) = match input.content_type.as_deref() {
        Some("blog") => (
            "You are a professional blog writer. Create engaging, SEO-friendly blog posts.",
            format!(
                "Write a {}-length blog post about: {}",
                options.length.as_deref().unwrap_or("medium"),
                topic
            ),
        ),
        Some("social") => (
            "You are a social media expert. Create engaging social media posts.",
            format!(
                "Create a {} social media post about: {}",
                options.platform.as_deref().unwrap_or("general"),
                topic
            ),
        ),
        Some("email") => (
            "You are a professional email writer. Create clear, professional emails.",
            format!(
                "Write a {} email about: {}",
                options.tone.as_deref().unwrap_or("professional"),
                topic
            ),
        ),
        Some("article") => (
            "You are a professional article writer. Create informative, well-researched articles.",
            format!("Write an article about: {}", topic),
        ),
        _ => (
            "You are a professional content writer.",
            format!("Create content about: {}", topic),
        ),
    };

    CompletionRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
        temperature: 0.8,
        max_tokens: 2000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::request::{ChatOptions, ContentOptions, ImageOptions};

    #[test]
    fn test_chat_defaults_and_overrides() {
        let input = ChatInput {
            prompt: "hi".into(),
            options: ChatOptions::default(),
        };
        let req = chat(&input, "gpt-3.5-turbo");
        assert_eq!(req.model, "gpt-3.5-turbo");
        assert_eq!(req.messages[0].content, "You are a helpful AI assistant.");
        assert_eq!(req.temperature, 0.7);
        assert_eq!(req.max_tokens, 1000);

        let input = ChatInput {
            prompt: "hi".into(),
            options: ChatOptions {
                model: Some("gpt-4o".into()),
                system_prompt: Some("Be terse.".into()),
                temperature: Some(0.1),
                max_tokens: Some(64),
            },
        };
        let req = chat(&input, "gpt-3.5-turbo");
        assert_eq!(req.model, "gpt-4o");
        assert_eq!(req.messages[0].content, "Be terse.");
        assert_eq!(req.max_tokens, 64);
    }

    #[test]
    fn test_image_defaults() {
        let req = image(&ImageInput {
            prompt: "a cat".into(),
            options: ImageOptions::default(),
        });
        assert_eq!(req.n, 1);
        assert_eq!(req.size, "1024x1024");
        assert_eq!(req.quality, "standard");
    }

    #[test]
    fn test_resume_marks_missing_fields() {
        let input = ResumeInput {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            phone: None,
            location: Some("London".into()),
            education: None,
            experience: None,
            skills: None,
            additional: None,
            submitted: serde_json::json!({}),
        };
        let req = resume(&input, "m");
        let user = &req.messages[1].content;
        assert!(user.contains("Phone: Not provided"));
        assert!(user.contains("Location: London"));
        assert_eq!(req.max_tokens, 2000);
    }

    #[test]
    fn test_code_uses_language() {
        let req = code(
            &CodeInput {
                description: "fizzbuzz".into(),
                language: "rust".into(),
            },
            "m",
        );
        assert!(req.messages[0].content.contains("expert rust developer"));
        assert_eq!(req.temperature, 0.5);
    }

    #[test]
    fn test_study_modes_pick_prompts() {
        let quiz = study(
            &StudyInput {
                topic: "ownership".into(),
                mode: StudyMode::Quiz,
            },
            "m",
        );
        assert!(quiz.messages[1].content.contains("correctAnswer"));

        let freeform = study(
            &StudyInput {
                topic: "ownership".into(),
                mode: StudyMode::Freeform("summary".into()),
            },
            "m",
        );
        assert_eq!(freeform.messages[1].content, "ownership");
        assert_eq!(freeform.max_tokens, 1500);
    }

    #[test]
    fn test_content_types() {
        let blog = content(
            &ContentInput {
                content_type: Some("blog".into()),
                topic: "tokio".into(),
                options: ContentOptions::default(),
            },
            "m",
        );
        assert_eq!(blog.messages[1].content, "Write a medium-length blog post about: tokio");
        assert_eq!(blog.temperature, 0.8);

        let general = content(
            &ContentInput {
                content_type: None,
                topic: "tokio".into(),
                options: ContentOptions::default(),
            },
            "m",
        );
        assert_eq!(general.messages[1].content, "Create content about: tokio");
    }
}

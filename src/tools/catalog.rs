//! Tool catalog: typed tool definitions, plan ceilings and builtin seed data.
//!
//! Definitions are seeded into the store once and loaded into an in-memory
//! catalog at startup; request handling only reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::store::Plan;
use crate::types::{Error, Result};

// =============================================================================
// Tool kinds
// =============================================================================

/// The AI capabilities exposed under `/api/ai/*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Chat,
    Image,
    Resume,
    Code,
    Study,
    Content,
}

impl ToolKind {
    pub const ALL: [ToolKind; 6] = [
        ToolKind::Chat,
        ToolKind::Image,
        ToolKind::Resume,
        ToolKind::Code,
        ToolKind::Study,
        ToolKind::Content,
    ];

    /// Usage counter key and route segment.
    pub fn as_str(self) -> &'static str {
        match self {
            ToolKind::Chat => "chat",
            ToolKind::Image => "image",
            ToolKind::Resume => "resume",
            ToolKind::Code => "code",
            ToolKind::Study => "study",
            ToolKind::Content => "content",
        }
    }

    /// Catalog slug of the builtin definition.
    pub fn slug(self) -> &'static str {
        match self {
            ToolKind::Chat => "ai-chat",
            ToolKind::Image => "ai-image",
            ToolKind::Resume => "ai-resume",
            ToolKind::Code => "ai-code",
            ToolKind::Study => "ai-study",
            ToolKind::Content => "ai-content",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ToolKind::Chat => "AI Chat Assistant",
            ToolKind::Image => "AI Image Generator",
            ToolKind::Resume => "AI Resume Builder",
            ToolKind::Code => "AI Code Generator",
            ToolKind::Study => "AI Study Assistant",
            ToolKind::Content => "AI Content Generator",
        }
    }

    /// Fallback message when the provider fails without saying why.
    pub fn failure_message(self) -> &'static str {
        match self {
            ToolKind::Chat => "Failed to generate chat response",
            ToolKind::Image => "Failed to generate image",
            ToolKind::Resume => "Failed to generate resume",
            ToolKind::Code => "Failed to generate code",
            ToolKind::Study => "Failed to generate study content",
            ToolKind::Content => "Failed to generate content",
        }
    }
}

impl FromStr for ToolKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ToolKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| Error::not_found(format!("Unknown tool: {}", s)))
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog grouping shown by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    Communication,
    Creative,
    Productivity,
    Development,
    Education,
    Content,
}

impl ToolCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolCategory::Communication => "communication",
            ToolCategory::Creative => "creative",
            ToolCategory::Productivity => "productivity",
            ToolCategory::Development => "development",
            ToolCategory::Education => "education",
            ToolCategory::Content => "content",
        }
    }
}

impl FromStr for ToolCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "communication" => Ok(ToolCategory::Communication),
            "creative" => Ok(ToolCategory::Creative),
            "productivity" => Ok(ToolCategory::Productivity),
            "development" => Ok(ToolCategory::Development),
            "education" => Ok(ToolCategory::Education),
            "content" => Ok(ToolCategory::Content),
            other => Err(Error::validation(format!("Unknown tool category: {}", other))),
        }
    }
}

// =============================================================================
// Plan ceilings
// =============================================================================

/// Per-plan usage ceilings. [`UsageLimits::UNLIMITED`] means no ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLimits {
    pub free: i64,
    pub pro: i64,
    pub enterprise: i64,
}

impl UsageLimits {
    pub const UNLIMITED: i64 = -1;

    pub const fn new(free: i64, pro: i64) -> Self {
        Self {
            free,
            pro,
            enterprise: Self::UNLIMITED,
        }
    }

    /// Ceiling for a plan; `None` when unlimited.
    pub fn limit_for(&self, plan: Plan) -> Option<u64> {
        let raw = match plan {
            Plan::Free => self.free,
            Plan::Pro => self.pro,
            Plan::Enterprise => self.enterprise,
        };
        u64::try_from(raw).ok()
    }
}

impl Default for UsageLimits {
    fn default() -> Self {
        Self::new(10, 100)
    }
}

// =============================================================================
// Tool definition
// =============================================================================

/// Complete catalog entry for one AI tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub category: ToolCategory,
    pub kind: ToolKind,
    pub icon: String,
    pub features: Vec<String>,
    pub usage_limits: UsageLimits,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ToolDefinition {
    fn builtin(
        kind: ToolKind,
        description: &str,
        category: ToolCategory,
        icon: &str,
        features: &[&str],
        usage_limits: UsageLimits,
    ) -> Self {
        Self {
            slug: kind.slug().to_string(),
            name: kind.display_name().to_string(),
            description: description.to_string(),
            category,
            kind,
            icon: icon.to_string(),
            features: features.iter().map(|f| f.to_string()).collect(),
            usage_limits,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Check slug shape: non-empty lowercase ASCII, digits and dashes.
    pub fn validate(&self) -> Result<()> {
        if self.slug.is_empty() {
            return Err(Error::validation("Tool slug cannot be empty"));
        }
        if !self
            .slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(Error::validation(format!(
                "Tool slug must be lowercase: {}",
                self.slug
            )));
        }
        if self.name.trim().is_empty() {
            return Err(Error::validation("Tool name cannot be empty"));
        }
        Ok(())
    }
}

/// The six tools shipped with the service.
pub fn builtin_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::builtin(
            ToolKind::Chat,
            "Have intelligent conversations with AI. Get answers, brainstorm ideas, or just chat!",
            ToolCategory::Communication,
            "💬",
            &[
                "Natural language processing",
                "Context-aware responses",
                "Multi-language support",
                "Conversation history",
            ],
            UsageLimits::new(10, 100),
        ),
        ToolDefinition::builtin(
            ToolKind::Image,
            "Create stunning images from text descriptions. Turn your imagination into reality!",
            ToolCategory::Creative,
            "🎨",
            &[
                "Text-to-image generation",
                "Multiple art styles",
                "High-resolution output",
                "Image customization",
            ],
            UsageLimits::new(5, 50),
        ),
        ToolDefinition::builtin(
            ToolKind::Resume,
            "Build professional, ATS-friendly resumes in minutes. Stand out from the crowd!",
            ToolCategory::Productivity,
            "📄",
            &[
                "Professional templates",
                "ATS-friendly format",
                "PDF export",
                "Customizable sections",
            ],
            UsageLimits::new(3, 30),
        ),
        ToolDefinition::builtin(
            ToolKind::Code,
            "Generate code in any programming language. From snippets to full functions!",
            ToolCategory::Development,
            "💻",
            &[
                "Multi-language support",
                "Code explanation",
                "Syntax highlighting",
                "Best practices",
            ],
            UsageLimits::new(10, 100),
        ),
        ToolDefinition::builtin(
            ToolKind::Study,
            "Your personal study companion. Get explanations, flashcards, and quizzes!",
            ToolCategory::Education,
            "📚",
            &[
                "Topic explanations",
                "Flashcard generation",
                "Quiz creation",
                "Study tips",
            ],
            UsageLimits::new(10, 100),
        ),
        ToolDefinition::builtin(
            ToolKind::Content,
            "Create engaging content effortlessly. Blog posts, social media, emails, and more!",
            ToolCategory::Content,
            "✍️",
            &[
                "Blog post generation",
                "Social media captions",
                "Email templates",
                "SEO optimization",
            ],
            UsageLimits::new(5, 50),
        ),
    ]
}

// =============================================================================
// Tool catalog
// =============================================================================

/// In-memory, read-mostly view of the tool table.
#[derive(Debug, Default)]
pub struct ToolCatalog {
    entries: HashMap<String, ToolDefinition>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Build a catalog from definitions loaded from the store.
    pub fn from_definitions(definitions: Vec<ToolDefinition>) -> Result<Self> {
        let mut catalog = Self::new();
        for def in definitions {
            catalog.register(def)?;
        }
        Ok(catalog)
    }

    /// Register a definition. Slugs are immutable: a second registration under
    /// the same slug is rejected.
    pub fn register(&mut self, def: ToolDefinition) -> Result<()> {
        def.validate()?;
        if self.entries.contains_key(&def.slug) {
            return Err(Error::conflict(format!(
                "Tool already registered: {}",
                def.slug
            )));
        }
        self.entries.insert(def.slug.clone(), def);
        Ok(())
    }

    pub fn get(&self, slug: &str) -> Option<&ToolDefinition> {
        self.entries.get(slug)
    }

    /// Definition backing a tool kind, if seeded.
    pub fn for_kind(&self, kind: ToolKind) -> Option<&ToolDefinition> {
        self.entries
            .get(kind.slug())
            .or_else(|| self.entries.values().find(|d| d.kind == kind))
    }

    pub fn has_tool(&self, slug: &str) -> bool {
        self.entries.contains_key(slug)
    }

    /// List all slugs, sorted.
    pub fn list_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// List definitions sorted by slug.
    pub fn list_entries(&self, include_inactive: bool) -> Vec<&ToolDefinition> {
        let mut entries: Vec<&ToolDefinition> = self
            .entries
            .values()
            .filter(|d| include_inactive || d.is_active)
            .collect();
        entries.sort_by(|a, b| a.slug.cmp(&b.slug));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tools_cover_every_kind() {
        let tools = builtin_tools();
        assert_eq!(tools.len(), ToolKind::ALL.len());
        for kind in ToolKind::ALL {
            let def = tools.iter().find(|t| t.kind == kind).unwrap();
            assert_eq!(def.slug, kind.slug());
            assert!(def.validate().is_ok());
        }
    }

    #[test]
    fn test_limit_for_plan() {
        let limits = UsageLimits::new(5, 50);
        assert_eq!(limits.limit_for(Plan::Free), Some(5));
        assert_eq!(limits.limit_for(Plan::Pro), Some(50));
        assert_eq!(limits.limit_for(Plan::Enterprise), None);
    }

    #[test]
    fn test_register_rejects_duplicate_slug() {
        let mut catalog = ToolCatalog::new();
        let tools = builtin_tools();
        catalog.register(tools[0].clone()).unwrap();

        let err = catalog.register(tools[0].clone()).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_register_rejects_bad_slug() {
        let mut catalog = ToolCatalog::new();
        let mut def = builtin_tools().remove(0);
        def.slug = "AI Chat".into();
        assert!(catalog.register(def).is_err());
    }

    #[test]
    fn test_lookup_and_listing() {
        let mut tools = builtin_tools();
        tools[1].is_active = false;
        let catalog = ToolCatalog::from_definitions(tools).unwrap();

        assert!(catalog.has_tool("ai-code"));
        assert_eq!(catalog.for_kind(ToolKind::Study).unwrap().slug, "ai-study");
        assert_eq!(catalog.list_entries(true).len(), 6);
        assert_eq!(catalog.list_entries(false).len(), 5);
        assert_eq!(catalog.list_ids()[0], "ai-chat");
    }

    #[test]
    fn test_kind_from_route_segment() {
        assert_eq!("quiz".parse::<ToolKind>().is_err(), true);
        assert_eq!("study".parse::<ToolKind>().unwrap(), ToolKind::Study);
    }
}

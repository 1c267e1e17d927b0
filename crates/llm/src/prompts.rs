//! Prompt templates for summarization

use serde::Serialize;

/// Marker replaced by chunk or partial-summary text
pub const PLACEHOLDER: &str = "{text}";

/// Label of the fragment appended to custom prompts that lack the placeholder
pub const PLACEHOLDER_LABEL: &str = "Text";

/// Process-wide default template
pub const DEFAULT_PROMPT: &str = r#"
Please provide a comprehensive yet concise summary of the following text.
Focus on the main ideas, key points, and important conclusions.
Make the summary informative and well-structured.

Text to summarize:
{text}

SUMMARY:
"#;

/// Where a template came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptKind {
    /// Per-user override
    Custom,
    /// Built-in default
    Default,
}

impl PromptKind {
    /// Lowercase name, e.g. for progress details
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::Default => "default",
        }
    }

    /// Capitalized name for result messages
    pub fn title(&self) -> &'static str {
        match self {
            Self::Custom => "Custom",
            Self::Default => "Default",
        }
    }
}

impl std::fmt::Display for PromptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instruction template that always contains [`PLACEHOLDER`]
///
/// Only constructible through [`PromptTemplate::default_template`] or
/// [`PromptTemplate::from_user_text`], so substitution never silently drops
/// the chunk text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PromptTemplate(String);

impl PromptTemplate {
    /// The built-in default template
    pub fn default_template() -> Self {
        Self(DEFAULT_PROMPT.to_string())
    }

    /// Build a template from user-supplied instructions
    ///
    /// Instructions without the placeholder get `"\n\nText: {text}"` appended;
    /// they are never rejected.
    pub fn from_user_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.contains(PLACEHOLDER) {
            Self(trimmed.to_string())
        } else {
            Self(format!("{}\n\n{}: {}", trimmed, PLACEHOLDER_LABEL, PLACEHOLDER))
        }
    }

    /// Substitute `text` into the placeholder
    pub fn render(&self, text: &str) -> String {
        self.0.replace(PLACEHOLDER, text)
    }

    /// Template source text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `max_chars` characters, with an ellipsis when cut
    pub fn preview(&self, max_chars: usize) -> String {
        let mut preview: String = self.0.chars().take(max_chars).collect();
        if self.0.chars().count() > max_chars {
            preview.push_str("...");
        }
        preview
    }
}

impl std::fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

use serde::{Deserialize, Serialize};

use crate::prompts::PromptKind;

/// Sampling settings passed with every completion call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingOptions {
    /// Temperature; low values give focused, repeatable output
    pub temperature: f32,

    /// Top-p sampling
    pub top_p: Option<f32>,

    /// Maximum tokens to generate
    pub max_output_tokens: Option<i32>,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            top_p: Some(0.9),
            max_output_tokens: None,
        }
    }
}

impl SamplingOptions {
    /// Default options with a specific temperature
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature,
            ..Self::default()
        }
    }
}

/// Ollama generate request
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    /// Model name (e.g., "llama3.2", "gemma2")
    pub model: String,

    /// Prompt text
    pub prompt: String,

    /// Disable streaming
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,

    /// Generation options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerateOptions>,
}

/// Generation options
#[derive(Debug, Clone, Serialize, Default)]
pub struct GenerateOptions {
    /// Temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Top-p sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
}

impl From<&SamplingOptions> for GenerateOptions {
    fn from(sampling: &SamplingOptions) -> Self {
        Self {
            temperature: Some(sampling.temperature),
            top_p: sampling.top_p,
            num_predict: sampling.max_output_tokens,
        }
    }
}

/// Ollama generate response
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    /// Model name
    pub model: String,

    /// Generated text
    pub response: String,

    /// Whether generation is complete
    pub done: bool,
}

/// Summarization result
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    /// Final summary text, trimmed
    pub text: String,

    /// Number of chunks in the map phase
    pub chunk_count: usize,

    /// Which template class was used
    pub prompt_kind: PromptKind,

    /// Reduce passes that had to re-chunk partial summaries
    pub reduce_levels: usize,

    /// Total completion calls issued
    pub completion_calls: usize,
}

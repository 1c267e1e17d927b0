use async_trait::async_trait;
use pagebrief_common::Result;

use crate::types::SamplingOptions;

/// Common trait for text completion backends
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete a prompt, returning the generated text
    async fn complete(&self, prompt: &str, sampling: &SamplingOptions) -> Result<String>;

    /// Test connection/availability
    async fn test_connection(&self) -> Result<bool>;

    /// Backend and model, for logs
    fn describe(&self) -> String;
}

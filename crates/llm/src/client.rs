use async_trait::async_trait;
use pagebrief_common::{PageBriefError, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::llm_trait::LlmClient;
use crate::types::{GenerateOptions, GenerateRequest, GenerateResponse, SamplingOptions};

/// Ollama API client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    max_attempts: u32,
    client: Client,
}

impl OllamaClient {
    /// Create new Ollama client
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let model = model.into();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PageBriefError::network(format!("Failed to create HTTP client: {}", e)))?;

        info!("Ollama client initialized: {} ({})", base_url, model);
        Ok(Self {
            base_url,
            model,
            max_attempts: 1,
            client,
        })
    }

    /// Attempts per request at the HTTP level (at least 1)
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Generate text, retrying transport failures up to `max_attempts`
    pub async fn generate(&self, request: GenerateRequest) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        debug!(
            "Sending generate request to Ollama - Model: {}, Prompt length: {}",
            request.model,
            request.prompt.len()
        );

        let mut attempt = 1;
        loop {
            match self.try_generate(&url, &request).await {
                Ok(response) => {
                    debug!("Received response from Ollama - Length: {}", response.len());
                    return Ok(response);
                }
                Err(e) if attempt < self.max_attempts => {
                    let delay = retry_delay(attempt);
                    warn!(
                        "Ollama request failed (attempt {}/{}): {}. Retrying in {:?}...",
                        attempt, self.max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Single attempt to generate text
    async fn try_generate(&self, url: &str, request: &GenerateRequest) -> Result<String> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| PageBriefError::network(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(PageBriefError::network("Ollama rate limit reached"));
        }
        let response = response
            .error_for_status()
            .map_err(|e| PageBriefError::llm(format!("Ollama API error: {}", e)))?;

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| PageBriefError::llm(format!("Failed to parse response: {}", e)))?;

        if result.response.trim().is_empty() {
            return Err(PageBriefError::llm("Empty response from Ollama"));
        }

        Ok(result.response)
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, prompt: &str, sampling: &SamplingOptions) -> Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: Some(false),
            options: Some(GenerateOptions::from(sampling)),
        };

        self.generate(request).await
    }

    async fn test_connection(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PageBriefError::network(format!("Failed to connect to Ollama: {}", e)))?;
        Ok(response.status().is_success())
    }

    fn describe(&self) -> String {
        format!("ollama:{}", self.model)
    }
}

/// Longest wait between two attempts
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Exponential backoff after the given failed attempt, starting at one second
pub(crate) fn retry_delay(attempt: u32) -> Duration {
    let secs = 2u64.saturating_pow(attempt.saturating_sub(1));
    Duration::from_secs(secs).min(MAX_RETRY_DELAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OllamaClient::new("http://localhost:11434/", "llama3.2", Duration::from_secs(5))
            .unwrap()
            .with_max_attempts(0);

        assert_eq!(client.base_url, "http://localhost:11434");
        assert_eq!(client.max_attempts, 1);
        assert_eq!(client.describe(), "ollama:llama3.2");
    }

    #[test]
    fn test_retry_delay_is_capped() {
        assert_eq!(retry_delay(1), Duration::from_secs(1));
        assert_eq!(retry_delay(3), Duration::from_secs(4));
        assert_eq!(retry_delay(7), MAX_RETRY_DELAY);
        assert_eq!(retry_delay(100), MAX_RETRY_DELAY);
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerateRequest {
            model: "llama3.2".to_string(),
            prompt: "hi".to_string(),
            stream: Some(false),
            options: Some(GenerateOptions::from(&SamplingOptions::with_temperature(0.2))),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert!((json["options"]["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
        assert!(json["options"].get("num_predict").is_none());
    }
}

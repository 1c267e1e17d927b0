use async_trait::async_trait;
use pagebrief_common::{PageBriefError, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::client::retry_delay;
use crate::llm_trait::LlmClient;
use crate::types::SamplingOptions;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().map(|p| p.text).collect();
        Some(text)
    }
}

/// Google Gemini API client
#[derive(Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    model: String,
    max_attempts: u32,
    client: Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create new Gemini client
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PageBriefError::network(format!("Failed to create HTTP client: {}", e)))?;
        let model = model.into();

        info!("Gemini client initialized: {}", model);
        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model,
            max_attempts: 1,
            client,
        })
    }

    /// Point the client at another endpoint (proxies, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Attempts per request at the HTTP level (at least 1)
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    fn build_request<'a>(prompt: &'a str, sampling: &SamplingOptions) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: sampling.temperature,
                top_p: sampling.top_p,
                max_output_tokens: sampling.max_output_tokens,
            },
        }
    }

    async fn try_generate(&self, url: &str, body: &GenerateContentRequest<'_>) -> Result<String> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| PageBriefError::network(format!("Failed to send request: {}", e)))?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(PageBriefError::network("Gemini quota exhausted (429)"));
        }
        let response = response
            .error_for_status()
            .map_err(|e| PageBriefError::llm(format!("Gemini API error: {}", e)))?;

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| PageBriefError::llm(format!("Failed to parse response: {}", e)))?;

        match parsed.into_text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(PageBriefError::llm("Empty response from Gemini")),
        }
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, prompt: &str, sampling: &SamplingOptions) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = Self::build_request(prompt, sampling);

        debug!("Sending request to Gemini - Model: {}, Prompt length: {}", self.model, prompt.len());

        let mut attempt = 1;
        loop {
            match self.try_generate(&url, &body).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < self.max_attempts => {
                    let delay = retry_delay(attempt);
                    warn!(
                        "Gemini request failed (attempt {}/{}): {}. Retrying in {:?}...",
                        attempt, self.max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn test_connection(&self) -> Result<bool> {
        let url = format!("{}/models/{}", self.base_url, self.model);
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| PageBriefError::network(format!("Failed to connect to Gemini: {}", e)))?;
        Ok(response.status().is_success())
    }

    fn describe(&self) -> String {
        format!("gemini:{}", self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let sampling = SamplingOptions::with_temperature(0.3);
        let body = GeminiClient::build_request("Summarize this", &sampling);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Summarize this");
        assert!((json["generationConfig"]["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        assert!(json["generationConfig"].get("maxOutputTokens").is_none());
    }

    #[test]
    fn test_response_text_extraction() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"world"}],"role":"model"}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.into_text().as_deref(), Some("Hello world"));

        let blocked: GenerateContentResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(blocked.into_text().is_none());
    }

    #[test]
    fn test_debug_hides_key() {
        let client = GeminiClient::new("secret-key", "gemini-2.0-flash", Duration::from_secs(5)).unwrap();
        assert!(!format!("{:?}", client).contains("secret-key"));
    }
}

use crate::error::PageBriefError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Smallest accepted `max_message_len`
pub const MIN_MESSAGE_LEN: usize = 100;

/// Upper bound for `LLM_MAX_ATTEMPTS`
pub const MAX_LLM_ATTEMPTS: u32 = 10;

/// Which completion backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Local Ollama server
    Ollama,
    /// Google Gemini API
    Gemini,
}

impl std::str::FromStr for LlmProvider {
    type Err = PageBriefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "gemini" => Ok(Self::Gemini),
            other => Err(PageBriefError::config(format!("Unknown LLM provider: {}", other))),
        }
    }
}

/// PageBrief application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Working directory for downloaded documents
    pub download_dir: PathBuf,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,

    /// Completion backend
    pub llm_provider: LlmProvider,

    /// Ollama API base URL
    pub ollama_base_url: String,

    /// Ollama model name
    pub llm_model: String,

    /// Gemini API key (required when the provider is gemini)
    #[serde(skip_serializing)]
    pub gemini_api_key: Option<String>,

    /// Gemini model name
    pub gemini_model: String,

    /// Sampling temperature, kept low for focused summaries
    pub temperature: f32,

    /// Timeout for a single completion call
    pub llm_timeout_secs: u64,

    /// Attempts per completion call at the HTTP level
    pub llm_max_attempts: u32,

    /// Maximum chunk length in characters
    pub max_chunk_len: usize,

    /// Characters shared between adjacent chunks
    pub chunk_overlap: usize,

    /// Maximum number of re-chunking levels in the reduce phase
    pub max_reduce_depth: usize,

    /// Largest accepted document, in bytes
    pub max_file_size: u64,

    /// Character budget of the delivered summary message
    pub max_message_len: usize,

    /// Maximum number of stored custom prompts
    pub prompt_store_capacity: usize,

    /// Maximum number of messages kept by the in-memory chat
    pub board_capacity: usize,

    /// Seconds a started prompt setup waits for the user's text
    pub prompt_setup_timeout_secs: u64,

    /// Server bind address
    pub server_host: String,

    /// Server port
    pub server_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("./downloads"),
            log_dir: PathBuf::from("./logs"),
            log_level: "info".to_string(),
            llm_provider: LlmProvider::Ollama,
            ollama_base_url: "http://localhost:11434".to_string(),
            llm_model: "llama3.2:latest".to_string(),
            gemini_api_key: None,
            gemini_model: "gemini-2.0-flash".to_string(),
            temperature: 0.3,
            llm_timeout_secs: 300,
            llm_max_attempts: 1,
            max_chunk_len: 4000,
            chunk_overlap: 200,
            max_reduce_depth: 4,
            max_file_size: 20 * 1024 * 1024,
            max_message_len: 4000,
            prompt_store_capacity: 10_000,
            board_capacity: 10_000,
            prompt_setup_timeout_secs: 600,
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, PageBriefError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        let defaults = Self::default();
        let llm_provider = match std::env::var("LLM_PROVIDER") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.llm_provider,
        };

        let config = Self {
            download_dir: Self::get_env_path("DOWNLOAD_DIR").unwrap_or(defaults.download_dir),
            log_dir: Self::get_env_path("LOG_DIR").unwrap_or(defaults.log_dir),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            llm_provider,
            ollama_base_url: std::env::var("OLLAMA_BASE_URL").unwrap_or(defaults.ollama_base_url),
            llm_model: std::env::var("LLM_MODEL").unwrap_or(defaults.llm_model),
            gemini_api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            gemini_model: std::env::var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            temperature: Self::get_env_parsed("LLM_TEMPERATURE").unwrap_or(defaults.temperature),
            llm_timeout_secs: Self::get_env_parsed("LLM_TIMEOUT_SECS")
                .unwrap_or(defaults.llm_timeout_secs),
            llm_max_attempts: Self::get_env_parsed("LLM_MAX_ATTEMPTS")
                .unwrap_or(defaults.llm_max_attempts),
            max_chunk_len: Self::get_env_parsed("MAX_CHUNK_LEN").unwrap_or(defaults.max_chunk_len),
            chunk_overlap: Self::get_env_parsed("CHUNK_OVERLAP").unwrap_or(defaults.chunk_overlap),
            max_reduce_depth: Self::get_env_parsed("MAX_REDUCE_DEPTH")
                .unwrap_or(defaults.max_reduce_depth),
            max_file_size: Self::get_env_parsed("MAX_FILE_SIZE").unwrap_or(defaults.max_file_size),
            max_message_len: Self::get_env_parsed("MAX_MESSAGE_LEN")
                .unwrap_or(defaults.max_message_len),
            prompt_store_capacity: Self::get_env_parsed("PROMPT_STORE_CAPACITY")
                .unwrap_or(defaults.prompt_store_capacity),
            board_capacity: Self::get_env_parsed("BOARD_CAPACITY").unwrap_or(defaults.board_capacity),
            prompt_setup_timeout_secs: Self::get_env_parsed("PROMPT_SETUP_TIMEOUT_SECS")
                .unwrap_or(defaults.prompt_setup_timeout_secs),
            server_host: std::env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: Self::get_env_parsed("SERVER_PORT").unwrap_or(defaults.server_port),
        };

        config.validate()?;

        // Ensure required directories exist
        config.ensure_directories()?;

        Ok(config)
    }

    /// Get PathBuf from environment variable
    fn get_env_path(key: &str) -> Option<PathBuf> {
        std::env::var(key).ok().map(PathBuf::from)
    }

    /// Parse an environment variable, ignoring unparsable values
    fn get_env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
        let raw = std::env::var(key).ok()?;
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring unparsable value for {}: {:?}", key, raw);
                None
            }
        }
    }

    /// Ensure required directories exist, create if not
    pub fn ensure_directories(&self) -> Result<(), PageBriefError> {
        for dir in [&self.download_dir, &self.log_dir] {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    PageBriefError::config(format!(
                        "Failed to create directory {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(())
    }

    /// Get server bind address (host:port)
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), PageBriefError> {
        if self.max_chunk_len == 0 {
            return Err(PageBriefError::config("Chunk length must be greater than 0"));
        }

        if self.chunk_overlap >= self.max_chunk_len {
            return Err(PageBriefError::config(format!(
                "Chunk overlap ({}) must be smaller than chunk length ({})",
                self.chunk_overlap, self.max_chunk_len
            )));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(PageBriefError::config(format!(
                "Temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }

        if !(1..=MAX_LLM_ATTEMPTS).contains(&self.llm_max_attempts) {
            return Err(PageBriefError::config(format!(
                "LLM attempts must be within 1..={}, got {}",
                MAX_LLM_ATTEMPTS, self.llm_max_attempts
            )));
        }

        if self.board_capacity == 0 {
            return Err(PageBriefError::config("Board capacity must be greater than 0"));
        }

        if self.max_file_size == 0 || self.max_message_len == 0 {
            return Err(PageBriefError::config(
                "File size and message length limits must be greater than 0",
            ));
        }

        // Room for the truncation notice
        if self.max_message_len < MIN_MESSAGE_LEN {
            return Err(PageBriefError::config(format!(
                "Message length limit must be at least {}",
                MIN_MESSAGE_LEN
            )));
        }

        match self.llm_provider {
            LlmProvider::Ollama => {
                if !self.ollama_base_url.starts_with("http://")
                    && !self.ollama_base_url.starts_with("https://")
                {
                    return Err(PageBriefError::config(
                        "Ollama base URL must start with http:// or https://",
                    ));
                }
            }
            LlmProvider::Gemini => {
                if self.gemini_api_key.is_none() {
                    return Err(PageBriefError::config(
                        "GEMINI_API_KEY is required when LLM_PROVIDER=gemini",
                    ));
                }
            }
        }

        // Validate port range
        if self.server_port == 0 {
            return Err(PageBriefError::config("Server port cannot be 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.max_chunk_len, 4000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.max_file_size, 20 * 1024 * 1024);
        assert_eq!(config.max_message_len, 4000);
        assert!(config.temperature < 0.5);
    }

    #[test]
    fn test_server_bind_address() {
        let config = AppConfig::default();
        assert_eq!(config.server_bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_validate() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        let mut invalid_config = AppConfig::default();
        invalid_config.chunk_overlap = invalid_config.max_chunk_len;
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = AppConfig::default();
        invalid_config.temperature = 3.5;
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = AppConfig::default();
        invalid_config.max_message_len = MIN_MESSAGE_LEN - 1;
        assert!(invalid_config.validate().is_err());
    }

    #[test]
    fn test_validate_attempts_and_board() {
        let mut config = AppConfig::default();
        config.llm_max_attempts = MAX_LLM_ATTEMPTS;
        assert!(config.validate().is_ok());

        config.llm_max_attempts = 0;
        assert!(config.validate().is_err());

        config.llm_max_attempts = 65;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.board_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_gemini_requires_key() {
        let mut config = AppConfig::default();
        config.llm_provider = LlmProvider::Gemini;
        assert!(config.validate().is_err());

        config.gemini_api_key = Some("test-key".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!("ollama".parse::<LlmProvider>().unwrap(), LlmProvider::Ollama);
        assert_eq!(" Gemini ".parse::<LlmProvider>().unwrap(), LlmProvider::Gemini);
        assert!("openai".parse::<LlmProvider>().is_err());
    }
}

/// PageBrief error types
#[derive(Debug, thiserror::Error)]
pub enum PageBriefError {
    /// Document rejected before any resource was consumed (format, size)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Retrieving the document bytes failed
    #[error("Download error: {0}")]
    Download(String),

    /// Document unreadable or without recoverable text
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// A completion call failed during the map or reduce phase
    #[error("Summarization failed: {0}")]
    Summarization(#[source] Box<PageBriefError>),

    /// LLM backend related error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Chat transport error (send/edit/delete message)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PageBriefError {
    /// Create validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create download error
    pub fn download<S: Into<String>>(msg: S) -> Self {
        Self::Download(msg.into())
    }

    /// Create extraction error
    pub fn extraction<S: Into<String>>(msg: S) -> Self {
        Self::Extraction(msg.into())
    }

    /// Wrap the underlying cause of a failed completion call
    pub fn summarization(cause: PageBriefError) -> Self {
        Self::Summarization(Box::new(cause))
    }

    /// Create LLM error
    pub fn llm<S: Into<String>>(msg: S) -> Self {
        Self::Llm(msg.into())
    }

    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Create transport error
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Self::Transport(msg.into())
    }

    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create not found error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

// HTTP response conversion
impl PageBriefError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::InvalidInput(_) => 400,
            Self::NotFound(_) => 404,
            Self::Download(_) => 502,
            Self::Extraction(_) => 422,
            Self::Summarization(_) => 502,
            Self::Llm(_) => 502,
            Self::Network(_) => 503,
            Self::Transport(_) => 500,
            Self::Config(_) => 500,
            Self::Internal(_) => 500,
            Self::Io(_) => 500,
            Self::Json(_) => 400,
            Self::Other(_) => 500,
        }
    }
}

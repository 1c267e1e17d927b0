use pagebrief_common::AppConfig;
use pagebrief_extract::PdfExtractor;
use pagebrief_llm::{LlmClient, PromptResolver, SamplingOptions, Summarizer, SummarizerOptions, UserPromptStore};
use std::sync::Arc;
use std::time::Duration;

use crate::board::MessageBoard;
use crate::conversation::ConversationManager;
use crate::pipeline::{Pipeline, PipelineOptions};
use crate::service::ChatService;

/// Shared application state
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// In-memory chat the HTTP API reads and writes
    pub board: Arc<MessageBoard>,

    /// Document-to-summary orchestrator
    pub pipeline: Arc<Pipeline>,

    /// Text and button events
    pub chat: ChatService,

    /// Completion backend, for health checks
    pub llm: Arc<dyn LlmClient>,
}

impl AppState {
    /// Wire up the pipeline around a completion backend
    pub fn new(config: AppConfig, llm: Arc<dyn LlmClient>) -> Self {
        let board = Arc::new(MessageBoard::with_capacity(config.board_capacity));
        let prompts = PromptResolver::new(Arc::new(UserPromptStore::new(
            config.prompt_store_capacity,
        )));

        let summarizer = Arc::new(Summarizer::new(
            llm.clone(),
            summarizer_options(&config),
        ));
        let pipeline = Arc::new(Pipeline::new(
            PipelineOptions::from_config(&config),
            Arc::new(PdfExtractor::new()),
            summarizer,
            prompts.clone(),
            board.clone(),
        ));
        let chat = ChatService::new(board.clone(), prompts, config.max_file_size).with_conversations(
            ConversationManager::with_timeout(Duration::from_secs(config.prompt_setup_timeout_secs)),
        );

        Self {
            config,
            board,
            pipeline,
            chat,
            llm,
        }
    }
}

/// Map-reduce settings from the configuration
pub fn summarizer_options(config: &AppConfig) -> SummarizerOptions {
    SummarizerOptions {
        max_chunk_len: config.max_chunk_len,
        chunk_overlap: config.chunk_overlap,
        max_reduce_depth: config.max_reduce_depth,
        sampling: SamplingOptions::with_temperature(config.temperature),
    }
}

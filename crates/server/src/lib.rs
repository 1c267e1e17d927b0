//! PageBrief HTTP server
//!
//! Actix-web API acting as the chat transport around the summary pipeline

pub mod actions;
pub mod board;
pub mod conversation;
pub mod document;
pub mod format;
pub mod pipeline;
pub mod progress;
pub mod routes;
pub mod service;
pub mod state;
pub mod transport;
pub mod types;

use actix_web::{web, App, HttpServer};
use pagebrief_common::{AppConfig, LlmProvider, PageBriefError, Result};
use pagebrief_llm::{GeminiClient, LlmClient, OllamaClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_actix_web::TracingLogger;

pub use pipeline::{Pipeline, PipelineOptions, PipelineOutcome, PipelineState};
pub use state::AppState;

/// Completion backend selected by the configuration
pub fn build_llm_client(config: &AppConfig) -> Result<Arc<dyn LlmClient>> {
    let timeout = Duration::from_secs(config.llm_timeout_secs);

    let client: Arc<dyn LlmClient> = match config.llm_provider {
        LlmProvider::Ollama => Arc::new(
            OllamaClient::new(&config.ollama_base_url, &config.llm_model, timeout)?
                .with_max_attempts(config.llm_max_attempts),
        ),
        LlmProvider::Gemini => {
            let api_key = config
                .gemini_api_key
                .as_deref()
                .ok_or_else(|| PageBriefError::config("GEMINI_API_KEY is not set"))?;
            Arc::new(
                GeminiClient::new(api_key, &config.gemini_model, timeout)?
                    .with_max_attempts(config.llm_max_attempts),
            )
        }
    };

    info!("Using LLM backend {}", client.describe());
    Ok(client)
}

/// Run the HTTP server until shutdown
pub async fn start_server(config: AppConfig) -> Result<()> {
    let bind_address = config.server_bind_address();
    let llm = build_llm_client(&config)?;
    let state = web::Data::new(Arc::new(AppState::new(config, llm)));

    info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(TracingLogger::default())
            .configure(routes::configure)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}

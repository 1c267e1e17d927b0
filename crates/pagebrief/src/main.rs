mod console;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use pagebrief_common::{logger, AppConfig};
use pagebrief_extract::PdfExtractor;
use pagebrief_llm::{PromptResolver, Summarizer, UserPromptStore};
use pagebrief_server::document::LocalFileDocument;
use pagebrief_server::state::summarizer_options;
use pagebrief_server::{build_llm_client, Pipeline, PipelineOptions, PipelineState};
use std::path::PathBuf;
use std::sync::Arc;

use crate::console::ConsoleTransport;

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root
fn load_dotenv_from_project_root() {
    if let Some(root) = find_project_root() {
        let env_path = root.join(".env");
        if env_path.exists() {
            dotenv::from_path(&env_path).ok();
        }
    } else {
        // Fallback to default dotenv behavior
        dotenv::dotenv().ok();
    }
}

#[derive(Parser)]
#[command(name = "pagebrief")]
#[command(about = "PageBrief - PDF summaries with map-reduce over an LLM", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long)]
        port: Option<u16>,
    },

    /// Summarize a local PDF and print the result
    Summarize {
        /// PDF file
        file: PathBuf,

        /// Custom instructions; "{text}" marks where the content goes
        #[arg(long)]
        prompt: Option<String>,

        /// User the run is attributed to
        #[arg(long, default_value_t = 0)]
        user_id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // AppConfig::from_env() loads ./.env as well
    load_dotenv_from_project_root();

    match cli.command {
        Some(Commands::Serve { host, port }) => {
            if let Some(host) = &host {
                std::env::set_var("SERVER_HOST", host);
            }
            if let Some(port) = port {
                std::env::set_var("SERVER_PORT", port.to_string());
            }
            serve().await
        }
        Some(Commands::Summarize {
            file,
            prompt,
            user_id,
        }) => summarize(file, prompt, user_id).await,
        None => serve().await,
    }
}

async fn serve() -> Result<()> {
    let config = AppConfig::from_env()?;
    logger::setup_logging(&config.log_dir, &config.log_level)?;

    tracing::info!("PageBrief starting...");
    tracing::info!("  Bind: {}", config.server_bind_address());
    tracing::info!("  Downloads: {}", config.download_dir.display());
    tracing::info!("  Provider: {:?}", config.llm_provider);

    println!("Server listening on http://{}", config.server_bind_address());

    pagebrief_server::start_server(config).await?;
    Ok(())
}

async fn summarize(file: PathBuf, prompt: Option<String>, user_id: i64) -> Result<()> {
    let config = AppConfig::from_env()?;
    // stdout carries only the summary
    logger::setup_console_logging(&config.log_level)?;

    let llm = build_llm_client(&config)?;
    let prompts = PromptResolver::new(Arc::new(UserPromptStore::new(
        config.prompt_store_capacity,
    )));
    if let Some(prompt) = prompt {
        prompts.set(user_id, &prompt).await;
    }

    let pipeline = Pipeline::new(
        PipelineOptions::from_config(&config),
        Arc::new(PdfExtractor::new()),
        Arc::new(Summarizer::new(llm, summarizer_options(&config))),
        prompts,
        Arc::new(ConsoleTransport::new()),
    );

    let document = LocalFileDocument::open(&file).await?;
    let outcome = pipeline.run(&document, user_id, 0).await;

    println!("{}", outcome.text);
    if outcome.state != PipelineState::Delivered {
        bail!("{} was not summarized ({:?})", file.display(), outcome.state);
    }
    Ok(())
}

use pagebrief_llm::{PromptResolver, UserId};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::format;
use crate::transport::{Reply, CLOSE_ONLY, MAIN_MENU};

pub const CANCEL_COMMAND: &str = "/cancel";
pub const START_COMMAND: &str = "/start";

/// How long a started prompt setup waits for the user's text
pub const DEFAULT_PROMPT_SETUP_TIMEOUT: Duration = Duration::from_secs(600);

/// Per-user conversation state for the custom prompt flow
///
/// A setup nobody answers expires after `timeout`; expired entries are
/// dropped whenever a new setup begins.
pub struct ConversationManager {
    awaiting_prompt: RwLock<HashMap<UserId, Instant>>,
    timeout: Duration,
}

impl Default for ConversationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationManager {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_PROMPT_SETUP_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            awaiting_prompt: RwLock::new(HashMap::new()),
            timeout,
        }
    }

    /// The next text from `user_id` becomes their prompt
    pub async fn begin_prompt_setup(&self, user_id: UserId) {
        let mut awaiting = self.awaiting_prompt.write().await;
        let before = awaiting.len();
        awaiting.retain(|_, started| started.elapsed() < self.timeout);
        if awaiting.len() < before {
            debug!("Expired {} pending prompt setups", before - awaiting.len());
        }
        awaiting.insert(user_id, Instant::now());
    }

    pub async fn is_awaiting_prompt(&self, user_id: UserId) -> bool {
        self.awaiting_prompt
            .read()
            .await
            .get(&user_id)
            .is_some_and(|started| started.elapsed() < self.timeout)
    }

    /// Leave the prompt flow, returning whether it was active
    pub async fn finish(&self, user_id: UserId) -> bool {
        self.awaiting_prompt
            .write()
            .await
            .remove(&user_id)
            .is_some_and(|started| started.elapsed() < self.timeout)
    }

    /// Pending setups, expired or not
    pub async fn pending(&self) -> usize {
        self.awaiting_prompt.read().await.len()
    }
}

/// Answer an inbound text event
pub async fn reply_to_text(
    conversations: &ConversationManager,
    prompts: &PromptResolver,
    user_id: UserId,
    text: &str,
    max_file_size: u64,
) -> Reply {
    let text = text.trim();

    if text == START_COMMAND {
        conversations.finish(user_id).await;
        return Reply::new(format::welcome(max_file_size), MAIN_MENU);
    }

    if !conversations.is_awaiting_prompt(user_id).await {
        return Reply::new(format::send_pdf(max_file_size), MAIN_MENU);
    }

    if text == CANCEL_COMMAND {
        conversations.finish(user_id).await;
        info!("Prompt setup cancelled by user {}", user_id);
        return Reply::new(format::PROMPT_CANCELLED, CLOSE_ONLY);
    }

    if text.is_empty() {
        return Reply::new(format::PROMPT_SETUP, &[]);
    }

    let template = prompts.set(user_id, text).await;
    conversations.finish(user_id).await;
    Reply::new(format::prompt_saved(&template), CLOSE_ONLY)
}

use futures::future::BoxFuture;
use pagebrief_common::{PageBriefError, Result};
use pagebrief_llm::{PromptResolver, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::conversation::ConversationManager;
use crate::format;
use crate::transport::{ChatId, MessageId, Reply, CLOSE_ONLY};

/// Everything an action handler may touch
pub struct ActionContext {
    pub user_id: UserId,
    pub chat_id: ChatId,

    /// Message whose button was pressed
    pub message_id: Option<MessageId>,

    pub prompts: PromptResolver,
    pub conversations: Arc<ConversationManager>,
    pub max_file_size: u64,
}

/// What the transport should do after an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Send(Reply),
    Delete(MessageId),
}

pub type ActionHandler = for<'a> fn(&'a ActionContext) -> BoxFuture<'a, Result<ActionOutcome>>;

/// Dispatch table from opaque action ids to handlers
pub struct ActionRegistry {
    handlers: HashMap<&'static str, ActionHandler>,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionRegistry {
    /// Registry with the built-in actions
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
        };
        registry.register("set_prompt", set_prompt);
        registry.register("show_prompt", show_prompt);
        registry.register("reset_prompt", reset_prompt);
        registry.register("help", help);
        registry.register("close_message", close_message);
        registry
    }

    pub fn register(&mut self, action: &'static str, handler: ActionHandler) {
        self.handlers.insert(action, handler);
    }

    pub fn actions(&self) -> Vec<&'static str> {
        let mut actions: Vec<_> = self.handlers.keys().copied().collect();
        actions.sort_unstable();
        actions
    }

    pub async fn dispatch(&self, action: &str, ctx: &ActionContext) -> Result<ActionOutcome> {
        let handler = self
            .handlers
            .get(action)
            .ok_or_else(|| PageBriefError::not_found(format!("Action {}", action)))?;
        debug!("Dispatching action {} for user {}", action, ctx.user_id);
        handler(ctx).await
    }
}

fn set_prompt(ctx: &ActionContext) -> BoxFuture<'_, Result<ActionOutcome>> {
    Box::pin(async move {
        ctx.conversations.begin_prompt_setup(ctx.user_id).await;
        Ok(ActionOutcome::Send(Reply::new(format::PROMPT_SETUP, &[])))
    })
}

fn show_prompt(ctx: &ActionContext) -> BoxFuture<'_, Result<ActionOutcome>> {
    Box::pin(async move {
        let resolved = ctx.prompts.resolve(ctx.user_id).await;
        Ok(ActionOutcome::Send(Reply::new(
            format::prompt_overview(&resolved.template, resolved.kind),
            CLOSE_ONLY,
        )))
    })
}

fn reset_prompt(ctx: &ActionContext) -> BoxFuture<'_, Result<ActionOutcome>> {
    Box::pin(async move {
        let text = if ctx.prompts.reset(ctx.user_id).await {
            format::PROMPT_RESET
        } else {
            format::PROMPT_ALREADY_DEFAULT
        };
        Ok(ActionOutcome::Send(Reply::new(text, CLOSE_ONLY)))
    })
}

fn help(ctx: &ActionContext) -> BoxFuture<'_, Result<ActionOutcome>> {
    Box::pin(async move {
        Ok(ActionOutcome::Send(Reply::new(
            format::help(ctx.max_file_size),
            CLOSE_ONLY,
        )))
    })
}

fn close_message(ctx: &ActionContext) -> BoxFuture<'_, Result<ActionOutcome>> {
    Box::pin(async move {
        ctx.message_id
            .map(ActionOutcome::Delete)
            .ok_or_else(|| PageBriefError::invalid_input("close_message needs a message id"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagebrief_llm::{PromptKind, UserPromptStore};

    fn context(message_id: Option<MessageId>) -> ActionContext {
        ActionContext {
            user_id: 5,
            chat_id: 50,
            message_id,
            prompts: PromptResolver::new(Arc::new(UserPromptStore::new(8))),
            conversations: Arc::new(ConversationManager::new()),
            max_file_size: 20 * 1024 * 1024,
        }
    }

    fn reply_text(outcome: ActionOutcome) -> String {
        match outcome {
            ActionOutcome::Send(reply) => reply.text,
            other => panic!("expected a reply, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_action_not_found() {
        let registry = ActionRegistry::new();
        let result = registry.dispatch("launch_rockets", &context(None)).await;
        assert!(matches!(result, Err(PageBriefError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_set_prompt_enters_flow() {
        let registry = ActionRegistry::new();
        let ctx = context(None);

        let text = reply_text(registry.dispatch("set_prompt", &ctx).await.unwrap());

        assert_eq!(text, format::PROMPT_SETUP);
        assert!(ctx.conversations.is_awaiting_prompt(5).await);
    }

    #[tokio::test]
    async fn test_show_prompt_previews_default() {
        let registry = ActionRegistry::new();

        let text = reply_text(registry.dispatch("show_prompt", &context(None)).await.unwrap());

        assert!(text.starts_with("📋 Default Prompt"));
        assert!(text.contains(pagebrief_llm::PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_reset_prompt_reports_previous_state() {
        let registry = ActionRegistry::new();
        let ctx = context(None);

        let text = reply_text(registry.dispatch("reset_prompt", &ctx).await.unwrap());
        assert_eq!(text, format::PROMPT_ALREADY_DEFAULT);

        ctx.prompts.set(5, "Short").await;
        let text = reply_text(registry.dispatch("reset_prompt", &ctx).await.unwrap());
        assert_eq!(text, format::PROMPT_RESET);
        assert_eq!(ctx.prompts.resolve(5).await.kind, PromptKind::Default);
    }

    #[tokio::test]
    async fn test_close_message() {
        let registry = ActionRegistry::new();

        let outcome = registry.dispatch("close_message", &context(Some(9))).await.unwrap();
        assert_eq!(outcome, ActionOutcome::Delete(9));

        let result = registry.dispatch("close_message", &context(None)).await;
        assert!(matches!(result, Err(PageBriefError::InvalidInput(_))));
    }

    #[test]
    fn test_builtin_actions() {
        assert_eq!(
            ActionRegistry::new().actions(),
            vec!["close_message", "help", "reset_prompt", "set_prompt", "show_prompt"]
        );
    }
}

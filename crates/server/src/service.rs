use pagebrief_common::Result;
use pagebrief_llm::{PromptResolver, UserId};
use std::sync::Arc;
use tracing::info;

use crate::actions::{ActionContext, ActionOutcome, ActionRegistry};
use crate::conversation::{reply_to_text, ConversationManager};
use crate::transport::{ChatId, ChatTransport, MessageId};

/// Text and action events of the chat transport
pub struct ChatService {
    transport: Arc<dyn ChatTransport>,
    prompts: PromptResolver,
    conversations: Arc<ConversationManager>,
    actions: ActionRegistry,
    max_file_size: u64,
}

impl ChatService {
    pub fn new(transport: Arc<dyn ChatTransport>, prompts: PromptResolver, max_file_size: u64) -> Self {
        Self {
            transport,
            prompts,
            conversations: Arc::new(ConversationManager::new()),
            actions: ActionRegistry::new(),
            max_file_size,
        }
    }

    /// Replace the conversation state, e.g. to change the setup timeout
    pub fn with_conversations(mut self, conversations: ConversationManager) -> Self {
        self.conversations = Arc::new(conversations);
        self
    }

    /// Answer a text message, returning the id of the reply
    pub async fn handle_text(&self, chat_id: ChatId, user_id: UserId, text: &str) -> Result<MessageId> {
        let reply = reply_to_text(
            &self.conversations,
            &self.prompts,
            user_id,
            text,
            self.max_file_size,
        )
        .await;
        self.transport
            .send_message(chat_id, &reply.text, reply.buttons)
            .await
    }

    /// Run an action; returns the id of a new message if one was sent
    pub async fn handle_action(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        action: &str,
        message_id: Option<MessageId>,
    ) -> Result<Option<MessageId>> {
        let ctx = ActionContext {
            user_id,
            chat_id,
            message_id,
            prompts: self.prompts.clone(),
            conversations: self.conversations.clone(),
            max_file_size: self.max_file_size,
        };

        match self.actions.dispatch(action, &ctx).await? {
            ActionOutcome::Send(reply) => {
                let id = self
                    .transport
                    .send_message(chat_id, &reply.text, reply.buttons)
                    .await?;
                Ok(Some(id))
            }
            ActionOutcome::Delete(id) => {
                self.transport.delete_message(id).await?;
                info!("Closed message {} for user {}", id, user_id);
                Ok(None)
            }
        }
    }
}

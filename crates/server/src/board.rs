use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagebrief_common::{PageBriefError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::transport::{Button, ChatId, ChatTransport, MessageId};

/// A message as currently shown in a chat
#[derive(Debug, Clone, Serialize)]
pub struct BoardMessage {
    pub message_id: MessageId,
    pub chat_id: ChatId,
    pub text: String,
    pub buttons: Vec<Button>,
    /// Number of times the message was edited in place
    pub edits: u32,
    pub updated_at: DateTime<Utc>,
}

/// Messages kept by [`MessageBoard::new`]
pub const DEFAULT_BOARD_CAPACITY: usize = 10_000;

/// In-memory chat transport
///
/// Messages are kept until deleted; edits overwrite text and buttons.
/// Holds at most `capacity` messages; sending into a full board evicts the
/// least recently updated message.
pub struct MessageBoard {
    messages: Arc<RwLock<HashMap<MessageId, BoardMessage>>>,
    next_id: AtomicU64,
    capacity: usize,
}

impl Default for MessageBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBoard {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BOARD_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }

    /// Messages of a chat, oldest first
    pub async fn chat_messages(&self, chat_id: ChatId) -> Vec<BoardMessage> {
        let mut messages: Vec<BoardMessage> = self
            .messages
            .read()
            .await
            .values()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.message_id);
        messages
    }

    pub async fn get(&self, message_id: MessageId) -> Option<BoardMessage> {
        self.messages.read().await.get(&message_id).cloned()
    }
}

#[async_trait]
impl ChatTransport for MessageBoard {
    async fn send_message(&self, chat_id: ChatId, text: &str, buttons: &[Button]) -> Result<MessageId> {
        let message_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let message = BoardMessage {
            message_id,
            chat_id,
            text: text.to_string(),
            buttons: buttons.to_vec(),
            edits: 0,
            updated_at: Utc::now(),
        };

        let mut messages = self.messages.write().await;
        if messages.len() >= self.capacity {
            let oldest = messages
                .values()
                .min_by_key(|m| (m.updated_at, m.message_id))
                .map(|m| m.message_id);
            if let Some(oldest) = oldest {
                messages.remove(&oldest);
                debug!("Board full, evicted message {}", oldest);
            }
        }
        messages.insert(message_id, message);
        Ok(message_id)
    }

    async fn edit_message(&self, message_id: MessageId, text: &str, buttons: &[Button]) -> Result<()> {
        let mut messages = self.messages.write().await;
        let message = messages
            .get_mut(&message_id)
            .ok_or_else(|| PageBriefError::transport(format!("Message {} not found", message_id)))?;

        message.text = text.to_string();
        message.buttons = buttons.to_vec();
        message.edits += 1;
        message.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_message(&self, message_id: MessageId) -> Result<()> {
        match self.messages.write().await.remove(&message_id) {
            Some(_) => Ok(()),
            None => Err(PageBriefError::not_found(format!("Message {}", message_id))),
        }
    }
}

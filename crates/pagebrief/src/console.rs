use async_trait::async_trait;
use pagebrief_common::Result;
use pagebrief_server::transport::{Button, ChatId, ChatTransport, MessageId};
use std::sync::atomic::{AtomicU64, Ordering};

/// Chat transport for one-shot CLI runs
///
/// Every message shows up as its first line on stderr; the caller prints
/// the final text itself.
pub struct ConsoleTransport {
    next_id: AtomicU64,
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleTransport {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }
}

fn status_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn send_message(&self, _chat_id: ChatId, text: &str, _buttons: &[Button]) -> Result<MessageId> {
        eprintln!("{}", status_line(text));
        Ok(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    async fn edit_message(&self, _message_id: MessageId, text: &str, _buttons: &[Button]) -> Result<()> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        match (lines.next(), lines.next()) {
            (Some(head), Some(detail)) => eprintln!("{} - {}", head, detail),
            (Some(head), None) => eprintln!("{}", head),
            _ => {}
        }
        Ok(())
    }

    async fn delete_message(&self, _message_id: MessageId) -> Result<()> {
        Ok(())
    }
}

use async_trait::async_trait;
use pagebrief_common::Result;
use serde::Serialize;

/// Transport-assigned chat identifier
pub type ChatId = i64;

/// Transport-assigned message identifier
pub type MessageId = u64;

/// Interactive choice attached to a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Button {
    /// Action id dispatched when the button is pressed
    pub action: &'static str,

    /// Text shown on the button
    pub label: &'static str,
}

/// Main menu shown under results and help texts
pub const MAIN_MENU: &[Button] = &[
    Button {
        action: "set_prompt",
        label: "🔧 Custom Prompt",
    },
    Button {
        action: "show_prompt",
        label: "👀 View Prompt",
    },
    Button {
        action: "reset_prompt",
        label: "🔄 Reset Prompt",
    },
    Button {
        action: "help",
        label: "❓ Help",
    },
];

/// Single close button for popup messages
pub const CLOSE_ONLY: &[Button] = &[Button {
    action: "close_message",
    label: "✅ Close",
}];

/// Outbound side of a chat transport
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a new message, returning its id
    async fn send_message(&self, chat_id: ChatId, text: &str, buttons: &[Button]) -> Result<MessageId>;

    /// Replace the text and buttons of an existing message
    async fn edit_message(&self, message_id: MessageId, text: &str, buttons: &[Button]) -> Result<()>;

    /// Delete a message
    async fn delete_message(&self, message_id: MessageId) -> Result<()>;
}

/// Text plus follow-up choices, ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub buttons: &'static [Button],
}

impl Reply {
    pub fn new(text: impl Into<String>, buttons: &'static [Button]) -> Self {
        Self {
            text: text.into(),
            buttons,
        }
    }
}

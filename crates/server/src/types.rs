use serde::{Deserialize, Serialize};

use crate::transport::MessageId;

/// Query of the document upload endpoint
#[derive(Debug, Deserialize)]
pub struct DocumentQuery {
    /// Sender of the document
    pub user_id: i64,
}

/// Upload acknowledgement; the run continues in the background
#[derive(Debug, Serialize)]
pub struct DocumentAccepted {
    /// Identifier of the background run
    pub run_id: String,

    /// Original filename
    pub file_name: String,

    /// Size of the received content
    pub size: u64,
}

/// Inbound text event
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub user_id: i64,
    pub text: String,
}

/// Button press
#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub user_id: i64,

    /// Message that carried the button
    #[serde(default)]
    pub message_id: Option<MessageId>,
}

/// Id of the message sent in reply, if any
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message_id: Option<MessageId>,
}

/// Health check
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,

    /// Completion backend and model
    pub llm_backend: String,

    pub llm_reachable: bool,
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

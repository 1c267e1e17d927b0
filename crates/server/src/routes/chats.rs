use actix_web::{get, post, web, HttpResponse};
use std::sync::Arc;

use super::error_response;
use crate::state::AppState;
use crate::transport::ChatId;
use crate::types::{ActionRequest, MessageResponse, TextRequest};

/// Inbound text event
#[post("/chats/{chat_id}/text")]
pub async fn post_text(
    chat_id: web::Path<ChatId>,
    req: web::Json<TextRequest>,
    state: web::Data<Arc<AppState>>,
) -> actix_web::Result<HttpResponse> {
    match state
        .chat
        .handle_text(chat_id.into_inner(), req.user_id, &req.text)
        .await
    {
        Ok(message_id) => Ok(HttpResponse::Ok().json(MessageResponse {
            message_id: Some(message_id),
        })),
        Err(e) => Ok(error_response(&e)),
    }
}

/// Button press
#[post("/chats/{chat_id}/actions/{action}")]
pub async fn post_action(
    path: web::Path<(ChatId, String)>,
    req: web::Json<ActionRequest>,
    state: web::Data<Arc<AppState>>,
) -> actix_web::Result<HttpResponse> {
    let (chat_id, action) = path.into_inner();

    match state
        .chat
        .handle_action(chat_id, req.user_id, &action, req.message_id)
        .await
    {
        Ok(message_id) => Ok(HttpResponse::Ok().json(MessageResponse { message_id })),
        Err(e) => Ok(error_response(&e)),
    }
}

/// Current messages of a chat, oldest first
#[get("/chats/{chat_id}/messages")]
pub async fn get_messages(
    chat_id: web::Path<ChatId>,
    state: web::Data<Arc<AppState>>,
) -> actix_web::Result<HttpResponse> {
    let messages = state.board.chat_messages(chat_id.into_inner()).await;
    Ok(HttpResponse::Ok().json(messages))
}

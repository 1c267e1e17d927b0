use actix_web::{delete, web, HttpResponse};
use std::sync::Arc;

use super::error_response;
use crate::state::AppState;
use crate::transport::{ChatTransport, MessageId};

#[delete("/messages/{message_id}")]
pub async fn delete_message(
    message_id: web::Path<MessageId>,
    state: web::Data<Arc<AppState>>,
) -> actix_web::Result<HttpResponse> {
    match state.board.delete_message(message_id.into_inner()).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Ok(error_response(&e)),
    }
}

pub mod chats;
pub mod documents;
pub mod messages;
pub mod system;

use actix_web::{http::StatusCode, web, HttpResponse};
use pagebrief_common::PageBriefError;

use crate::types::ErrorResponse;

/// Register every route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(documents::upload_document)
        .service(chats::post_text)
        .service(chats::post_action)
        .service(chats::get_messages)
        .service(messages::delete_message)
        .service(system::health);
}

/// JSON error body with the status of `err`
pub(crate) fn error_response(err: &PageBriefError) -> HttpResponse {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(ErrorResponse {
        error: err.to_string(),
    })
}

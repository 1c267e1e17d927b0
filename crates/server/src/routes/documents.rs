use actix_multipart::Multipart;
use actix_web::{post, web, HttpResponse};
use futures::StreamExt;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::document::{DocumentMeta, InMemoryDocument};
use crate::state::AppState;
use crate::transport::ChatId;
use crate::types::{DocumentAccepted, DocumentQuery, ErrorResponse};

/// Accept a document and summarize it in the background
///
/// Content beyond the size ceiling is drained but not kept; the pipeline
/// then rejects the document by its size.
#[post("/chats/{chat_id}/documents")]
pub async fn upload_document(
    chat_id: web::Path<ChatId>,
    query: web::Query<DocumentQuery>,
    mut payload: Multipart,
    state: web::Data<Arc<AppState>>,
) -> actix_web::Result<HttpResponse> {
    let chat_id = chat_id.into_inner();
    let limit = state.config.max_file_size;
    let mut upload = None;

    while let Some(field) = payload.next().await {
        let mut field = field?;
        let content_disposition = field.content_disposition();

        if content_disposition.get_name() != Some("file") {
            continue;
        }
        let file_name = content_disposition
            .get_filename()
            .unwrap_or("unknown")
            .to_string();

        let mut bytes = Vec::new();
        let mut size: u64 = 0;
        while let Some(chunk) = field.next().await {
            let data = chunk?;
            size += data.len() as u64;
            if size <= limit {
                bytes.extend_from_slice(&data);
            }
        }
        upload = Some((file_name, bytes, size));
    }

    let Some((file_name, bytes, size)) = upload else {
        return Ok(HttpResponse::BadRequest().json(ErrorResponse {
            error: "No file uploaded".to_string(),
        }));
    };

    let run_id = Uuid::new_v4().simple().to_string();
    let document = InMemoryDocument::new(DocumentMeta::new(file_name.clone(), size, run_id.clone()), bytes);
    let pipeline = state.pipeline.clone();
    let user_id = query.user_id;
    let run = run_id.clone();

    tokio::spawn(async move {
        let outcome = pipeline.run(&document, user_id, chat_id).await;
        info!("Run {} finished: {:?}", run, outcome.state);
    });

    Ok(HttpResponse::Accepted().json(DocumentAccepted {
        run_id,
        file_name,
        size,
    }))
}

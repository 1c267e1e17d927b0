use actix_web::{get, web, HttpResponse};
use std::sync::Arc;
use tracing::warn;

use crate::state::AppState;
use crate::types::HealthResponse;

/// Liveness and completion backend reachability
#[get("/health")]
pub async fn health(state: web::Data<Arc<AppState>>) -> actix_web::Result<HttpResponse> {
    let llm_reachable = match state.llm.test_connection().await {
        Ok(reachable) => reachable,
        Err(e) => {
            warn!("LLM backend unreachable: {}", e);
            false
        }
    };

    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        llm_backend: state.llm.describe(),
        llm_reachable,
    }))
}

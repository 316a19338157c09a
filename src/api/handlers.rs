use axum::{extract::State, Json};
use tracing::debug;

use crate::api::models::*;
use crate::config::Settings;
use crate::retrieval::{ChatAnswer, HybridRetriever};
use crate::{Error, Result};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub retriever: HybridRetriever,
    pub settings: Settings,
}

/// POST /api/chat - Answer a free-text question with matching recipes
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatAnswer>> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(Error::Validation("Query must not be empty".to_string()));
    }

    let top_k = request
        .top_k
        .unwrap_or_else(|| state.retriever.default_top_k());
    debug!("Chat request: {:?} (top_k {})", query, top_k);

    let answer = state.retriever.answer(query, top_k).await?;
    Ok(Json(answer))
}

/// GET /api/health - Health check endpoint
pub async fn health_check() -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}

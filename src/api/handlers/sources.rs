use axum::{extract::State, response::Json, http::StatusCode};
use std::sync::Arc;
use tracing::error;
use crate::{AppState, SourcesResponse};

pub async fn get_sources(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SourcesResponse>, StatusCode> {
    let sources = state.reader().available_sources().await.map_err(|e| {
        error!("Failed to list processed sources: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(SourcesResponse { sources }))
}

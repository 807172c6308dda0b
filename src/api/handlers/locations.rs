use axum::{
    extract::{State, Query},
    response::Json,
    http::StatusCode,
};
use std::sync::Arc;
use tracing::info;
use crate::{
    AppState, LocationsQuery, LocationsResponse,
    api::handlers::common::{parse_source, storage_status},
};

/// Source cities with distinguished-operator data and the PoPs each one
/// measured against; feeds the `location` parameter of `/boxplot`.
pub async fn get_locations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LocationsQuery>,
) -> Result<Json<LocationsResponse>, StatusCode> {
    let source = parse_source(&params.source)?;

    let rows = state
        .reader()
        .read_summary_rows(source)
        .await
        .map_err(|e| storage_status("Failed to read summary rows", e))?;

    let cities = state.config.ordering.source_cities(&rows);
    info!("Found {} {} source cities", cities.len(), source);

    Ok(Json(LocationsResponse { source, cities }))
}

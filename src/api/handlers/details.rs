use axum::{
    extract::{State, Query},
    response::Json,
    http::StatusCode,
};
use std::sync::Arc;
use tracing::warn;
use crate::{
    group_details, AppState, DetailsQuery, GroupDetails, GroupIdentity,
    api::handlers::common::{parse_source, storage_status},
};

pub async fn get_group_details(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DetailsQuery>,
) -> Result<Json<GroupDetails>, StatusCode> {
    let source = parse_source(&params.source)?;
    let group = GroupIdentity::new(params.asn, params.name);

    let rows = state
        .reader()
        .read_summary_rows(source)
        .await
        .map_err(|e| storage_status("Failed to read summary rows", e))?;

    group_details(&rows, &group).map(Json).ok_or_else(|| {
        warn!("No {} data for {}", source, group);
        StatusCode::NOT_FOUND
    })
}

use axum::{
    extract::{State, Query},
    response::Json,
    http::StatusCode,
};
use std::sync::Arc;
use crate::{
    AppState, RegionValue, RegionsQuery, RegionsResponse, SUMMARY_METRICS,
    api::handlers::common::{parse_metric, parse_regional_table, storage_status},
};

pub async fn get_regions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RegionsQuery>,
) -> Result<Json<RegionsResponse>, StatusCode> {
    let metric = parse_metric(&params.metric)?;
    let provider = parse_regional_table(params.provider.as_deref())?;

    let means = state
        .reader()
        .read_regional_means(provider, &SUMMARY_METRICS)
        .await
        .map_err(|e| storage_status("Failed to read regional means", e))?;

    let regions = means
        .into_iter()
        .filter_map(|region| {
            let moments = region.metrics.get(&metric).copied()?;
            Some(RegionValue {
                region: region.region,
                country: region.country,
                mean: moments.mean,
                sample_count: moments.sample_count,
            })
        })
        .collect();

    Ok(Json(RegionsResponse {
        provider,
        metric: metric.to_string(),
        regions,
    }))
}

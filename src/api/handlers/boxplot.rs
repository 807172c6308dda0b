use axum::{
    extract::{State, Query},
    response::Json,
    http::StatusCode,
};
use rand::{rngs::StdRng, SeedableRng};
use std::sync::Arc;
use tracing::{info, warn};
use crate::{
    AppState, BoxSeries, BoxplotQuery, BoxplotResponse,
    api::handlers::common::{parse_metric, parse_source, storage_status},
};

pub async fn get_boxplot(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BoxplotQuery>,
) -> Result<Json<BoxplotResponse>, StatusCode> {
    let source = parse_source(&params.source)?;
    let metric = parse_metric(&params.metric)?;

    let rows = state
        .reader()
        .read_summary_rows(source)
        .await
        .map_err(|e| storage_status("Failed to read summary rows", e))?;

    let rows: Vec<_> = rows
        .into_iter()
        .filter(|row| params.location.as_ref().map_or(true, |loc| &row.key == loc))
        .collect();

    if rows.is_empty() {
        warn!("No summary rows for {} at {:?}", source, params.location);
        return Err(StatusCode::NOT_FOUND);
    }

    let ordering = &state.config.ordering;

    // A single location shows the distinguished groups and the busiest others
    let rows: Vec<_> = if params.location.is_some() {
        let kept = ordering.top_groups(&rows);
        rows.into_iter()
            .filter(|row| kept.contains(&row.group))
            .collect()
    } else {
        rows
    };

    let reconstructor = state.reconstructor();
    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut series = Vec::new();
    for group in ordering.order(rows.iter().map(|row| row.group.clone())) {
        let summaries = rows
            .iter()
            .filter(|row| row.group == group)
            .filter_map(|row| row.summary(metric));

        let points = reconstructor.reconstruct_many(summaries, &mut rng);
        if points.is_empty() {
            continue;
        }

        series.push(BoxSeries {
            label: group.label(),
            distinguished: ordering.is_distinguished(&group),
            asn: group.asn,
            name: group.name,
            points,
        });
    }

    info!(
        "Built {} {} box series for {} ({} rows)",
        series.len(), metric, source, rows.len()
    );

    Ok(Json(BoxplotResponse {
        source,
        metric: metric.to_string(),
        title: metric.title().to_string(),
        location: params.location,
        series,
    }))
}

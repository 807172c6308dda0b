use axum::http::StatusCode;
use std::str::FromStr;
use tracing::{error, warn};
use crate::{Error, Metric, RegionalTable, Source};

pub fn parse_source(raw: &str) -> Result<Source, StatusCode> {
    Source::from_str(raw).map_err(|e| {
        warn!("Invalid source requested: {}", e);
        StatusCode::BAD_REQUEST
    })
}

pub fn parse_metric(raw: &str) -> Result<Metric, StatusCode> {
    Metric::from_str(raw).map_err(|e| {
        warn!("Invalid metric requested: {}", e);
        StatusCode::BAD_REQUEST
    })
}

pub fn parse_regional_table(raw: Option<&str>) -> Result<RegionalTable, StatusCode> {
    match raw {
        Some(raw) => RegionalTable::from_str(raw).map_err(|e| {
            warn!("Invalid regional provider requested: {}", e);
            StatusCode::BAD_REQUEST
        }),
        None => Ok(RegionalTable::Cloudflare),
    }
}

/// A missing object means nothing was preprocessed for that source yet.
pub fn storage_status(context: &str, err: Error) -> StatusCode {
    match err {
        Error::Store(msg) => {
            warn!("{}: {}", context, msg);
            StatusCode::NOT_FOUND
        }
        other => {
            error!("{}: {}", context, other);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

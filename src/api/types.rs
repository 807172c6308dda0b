use serde::{Deserialize, Serialize};
use crate::{RegionalTable, Source, SourceCity};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct SourcesResponse {
    pub sources: Vec<Source>,
}

#[derive(Debug, Deserialize)]
pub struct BoxplotQuery {
    pub source: String,
    pub metric: String,
    /// Location key; every location when absent.
    pub location: Option<String>,
    /// Fixed seed for reproducible points.
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct BoxSeries {
    pub label: String,
    pub asn: u32,
    pub name: String,
    pub distinguished: bool,
    pub points: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct BoxplotResponse {
    pub source: Source,
    pub metric: String,
    pub title: String,
    pub location: Option<String>,
    pub series: Vec<BoxSeries>,
}

#[derive(Debug, Deserialize)]
pub struct DetailsQuery {
    pub source: String,
    pub asn: u32,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RegionsQuery {
    pub metric: String,
    /// `cloudflare` (default) or `starlink`.
    pub provider: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegionValue {
    pub region: String,
    pub country: String,
    pub mean: f64,
    pub sample_count: u64,
}

#[derive(Debug, Serialize)]
pub struct RegionsResponse {
    pub provider: RegionalTable,
    pub metric: String,
    pub regions: Vec<RegionValue>,
}

#[derive(Debug, Deserialize)]
pub struct LocationsQuery {
    pub source: String,
}

#[derive(Debug, Serialize)]
pub struct LocationsResponse {
    pub source: Source,
    pub cities: Vec<SourceCity>,
}

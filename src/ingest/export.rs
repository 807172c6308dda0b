use object_store::{path::Path, ObjectStore};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{info, warn};
use crate::{Observation, Result, Source, BITS_PER_MEGABIT};
use super::{CloudflareRow, MLabRow, StarlinkStateRow};

/// Layout of an input CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    MLab,
    Cloudflare,
    /// Cloudflare state-level export; throughput is in bits per second.
    CloudflareRegional,
    /// Starlink monthly per-state medians.
    StarlinkStates,
}

impl From<Source> for ExportFormat {
    fn from(source: Source) -> Self {
        match source {
            Source::MLab => ExportFormat::MLab,
            Source::Cloudflare => ExportFormat::Cloudflare,
        }
    }
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub observations: Vec<Observation>,
    /// Rows that could not be deserialized.
    pub skipped: usize,
}

fn parse_rows<T>(bytes: &[u8]) -> Result<IngestReport>
where
    T: DeserializeOwned + Into<Observation>,
{
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    // Fail fast on a missing or unreadable header row
    reader.headers()?;

    let mut report = IngestReport::default();
    for (line, record) in reader.deserialize::<T>().enumerate() {
        match record {
            Ok(row) => report.observations.push(row.into()),
            Err(e) => {
                report.skipped += 1;
                warn!("Skipping malformed row {}: {}", line + 2, e);
            }
        }
    }

    Ok(report)
}

/// Parses a whole export held in memory.
pub fn parse_export(bytes: &[u8], format: ExportFormat) -> Result<IngestReport> {
    match format {
        ExportFormat::MLab => parse_rows::<MLabRow>(bytes),
        ExportFormat::Cloudflare => parse_rows::<CloudflareRow>(bytes),
        ExportFormat::StarlinkStates => parse_rows::<StarlinkStateRow>(bytes),
        ExportFormat::CloudflareRegional => {
            let mut report = parse_rows::<CloudflareRow>(bytes)?;
            for obs in &mut report.observations {
                obs.download = obs.download.map(|bps| bps / BITS_PER_MEGABIT);
                obs.upload = obs.upload.map(|bps| bps / BITS_PER_MEGABIT);
            }
            Ok(report)
        }
    }
}

pub struct ObservationReader {
    object_store: Arc<dyn ObjectStore>,
}

impl ObservationReader {
    pub fn new(object_store: Arc<dyn ObjectStore>) -> Self {
        Self { object_store }
    }

    pub async fn read(&self, path: &Path, format: ExportFormat) -> Result<IngestReport> {
        let bytes = self.object_store.get(path).await?.bytes().await?;

        let report = parse_export(&bytes, format)?;

        info!(
            "Read {} observations from {} ({} rows skipped)",
            report.observations.len(),
            path,
            report.skipped
        );

        Ok(report)
    }
}

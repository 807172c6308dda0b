use object_store::{path::Path, ObjectStore};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{info, warn};
use crate::{
    regional_means, sorted_rows, Config, ExportFormat, GroupAggregator, ObservationReader,
    ProcessingMetadata, RegionalTable, Result, Source, SourceMetadata, SummaryWriter,
    DEFAULT_COUNTRY, SUMMARY_METRICS,
};

/// Object paths of the raw exports, relative to the store root. Absent
/// inputs are skipped.
#[derive(Debug, Clone)]
pub struct PreprocessInputs {
    pub mlab: Option<String>,
    pub cloudflare: Option<String>,
    /// Cloudflare state-level export.
    pub regional: Option<String>,
    /// Starlink monthly per-state medians.
    pub starlink_states: Option<String>,
    /// Country whose regions are averaged.
    pub country: String,
}

impl Default for PreprocessInputs {
    fn default() -> Self {
        Self {
            mlab: None,
            cloudflare: None,
            regional: None,
            starlink_states: None,
            country: DEFAULT_COUNTRY.to_string(),
        }
    }
}

/// Turns raw exports into the `processed/` objects the API serves.
pub struct Preprocessor {
    reader: ObservationReader,
    writer: SummaryWriter,
    aggregator: GroupAggregator,
}

impl Preprocessor {
    pub fn new(store: Arc<dyn ObjectStore>, config: &Config) -> Self {
        Self {
            reader: ObservationReader::new(Arc::clone(&store)),
            writer: SummaryWriter::new(store),
            aggregator: GroupAggregator::new(config.aggregation),
        }
    }

    pub async fn summarize_source(&self, source: Source, input: &str) -> Result<SourceMetadata> {
        info!("Summarizing {} export {}", source, input);

        let report = self.reader.read(&Path::from(input), ExportFormat::from(source)).await?;
        let rows = sorted_rows(self.aggregator.aggregate(&report.observations, &SUMMARY_METRICS));
        let locations: HashSet<&str> = rows.iter().map(|row| row.key.as_str()).collect();

        self.writer.write_summary_rows(source, &rows).await?;

        Ok(SourceMetadata {
            rows: rows.len(),
            locations: locations.len(),
            observations: report.observations.len(),
            skipped_rows: report.skipped,
        })
    }

    /// Averages one state-level export per region and persists it as `table`.
    pub async fn summarize_regions(
        &self,
        table: RegionalTable,
        format: ExportFormat,
        input: &str,
        country: &str,
    ) -> Result<usize> {
        let report = self.reader.read(&Path::from(input), format).await?;

        let means = regional_means(&report.observations, country, &SUMMARY_METRICS);
        if means.is_empty() {
            warn!("No {} regions found in {}", country, input);
        }
        self.writer.write_regional_means(table, &means, &SUMMARY_METRICS).await?;

        Ok(means.len())
    }

    /// Runs every configured input and writes `metadata.json`. Returns
    /// `None` when no input was given.
    pub async fn run(&self, inputs: &PreprocessInputs) -> Result<Option<ProcessingMetadata>> {
        let mut sources = BTreeMap::new();
        for (source, input) in [(Source::MLab, &inputs.mlab), (Source::Cloudflare, &inputs.cloudflare)] {
            let Some(input) = input else {
                continue;
            };
            let metadata = self.summarize_source(source, input).await?;
            info!(
                "{}: {} rows over {} locations",
                source, metadata.rows, metadata.locations
            );
            sources.insert(source.to_string(), metadata);
        }

        let mut regional_records = 0;
        if let Some(input) = &inputs.regional {
            regional_records = self
                .summarize_regions(
                    RegionalTable::Cloudflare,
                    ExportFormat::CloudflareRegional,
                    input,
                    &inputs.country,
                )
                .await?;
        }

        let mut starlink_state_records = 0;
        if let Some(input) = &inputs.starlink_states {
            starlink_state_records = self
                .summarize_regions(
                    RegionalTable::Starlink,
                    ExportFormat::StarlinkStates,
                    input,
                    &inputs.country,
                )
                .await?;
        }

        if sources.is_empty() && inputs.regional.is_none() && inputs.starlink_states.is_none() {
            warn!("Nothing to preprocess; no input exports were given");
            return Ok(None);
        }

        let metadata = ProcessingMetadata {
            processed_date: OffsetDateTime::now_utc().to_string(),
            sources,
            regional_records,
            starlink_state_records,
        };
        self.writer.write_metadata(&metadata).await?;

        info!("Successfully completed preprocessing");
        Ok(Some(metadata))
    }
}

use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use futures::StreamExt;
use object_store::{path::Path, ObjectStore};
use parquet::arrow::arrow_reader::ParquetRecordBatchReader;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};
use crate::{
    Error, GroupIdentity, LocationKey, Metric, MetricSummaries, MomentSummary, QuantileSummary,
    RegionalMeans, RegionalTable, Result, Source, SummaryRow, PROCESSED_PREFIX, SUMMARY_SUFFIX,
};
use super::{get_float64_column, get_string_column, get_uint64_column};

const BATCH_SIZE: usize = 1024;

/// Decodes one blob entry. Missing keys, wrong types and quartiles out of
/// order are all reported as [`Error::MalformedSummary`].
pub fn parse_summary(metric: Metric, value: serde_json::Value) -> Result<QuantileSummary> {
    let summary: QuantileSummary = serde_json::from_value(value)
        .map_err(|e| Error::MalformedSummary(format!("{}: {}", metric, e)))?;

    if !(summary.q1 <= summary.median && summary.median <= summary.q3) {
        return Err(Error::MalformedSummary(format!(
            "{}: quartiles out of order (q1={}, median={}, q3={})",
            metric, summary.q1, summary.median, summary.q3
        )));
    }

    Ok(summary)
}

/// Parses a persisted stats blob. Malformed metrics are skipped so their
/// siblings survive; unknown metric keys are ignored.
pub fn parse_stats_blob(text: &str) -> MetricSummaries {
    let entries: serde_json::Map<String, serde_json::Value> = match serde_json::from_str(text) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Unreadable stats blob, skipping row: {}", e);
            return MetricSummaries::new();
        }
    };

    let mut stats = MetricSummaries::new();
    for (name, value) in entries {
        let Ok(metric) = Metric::from_str(&name) else {
            debug!("Ignoring unknown metric {} in stats blob", name);
            continue;
        };

        match parse_summary(metric, value) {
            Ok(summary) => {
                stats.insert(metric, summary);
            }
            Err(e) => warn!("Skipping metric: {}", e),
        }
    }

    stats
}

pub fn rows_from_batch(batch: &RecordBatch) -> Result<Vec<SummaryRow>> {
    let keys = get_string_column(batch, "key")?;
    let asns = get_uint64_column(batch, "client_asn")?;
    let names = get_string_column(batch, "client_as_name")?;
    let cities = get_string_column(batch, "client_city")?;
    let countries = get_string_column(batch, "client_country")?;
    let pops = get_string_column(batch, "server_pop")?;
    let blobs = get_string_column(batch, "boxplot_stats")?;

    let mut rows = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        if blobs.is_null(i) {
            warn!("Row {} ({}) has no stats blob", i, keys.value(i));
            continue;
        }

        let asn = u32::try_from(asns.value(i)).map_err(|_| {
            Error::Processing(format!("ASN {} out of range", asns.value(i)))
        })?;

        rows.push(SummaryRow {
            key: keys.value(i).to_string(),
            location: LocationKey::new(cities.value(i), countries.value(i), pops.value(i)),
            group: GroupIdentity::new(asn, names.value(i)),
            stats: parse_stats_blob(blobs.value(i)),
        });
    }

    Ok(rows)
}

pub fn regional_from_batch(batch: &RecordBatch, metrics: &[Metric]) -> Result<Vec<RegionalMeans>> {
    let regions = get_string_column(batch, "region")?;
    let countries = get_string_column(batch, "country")?;

    let mut columns = Vec::new();
    for &metric in metrics {
        let name = format!("{}_mean", metric);
        if batch.schema().index_of(&name).is_err() {
            continue;
        }
        columns.push((
            metric,
            get_float64_column(batch, &name)?,
            get_float64_column(batch, &format!("{}_std_dev", metric))?,
            get_uint64_column(batch, &format!("{}_count", metric))?,
        ));
    }

    let mut means = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let mut per_metric = BTreeMap::new();
        for (metric, averages, spreads, counts) in &columns {
            if averages.is_null(i) {
                continue;
            }
            per_metric.insert(*metric, MomentSummary {
                mean: averages.value(i),
                std_dev: if spreads.is_null(i) { 0.0 } else { spreads.value(i) },
                sample_count: counts.value(i),
            });
        }

        means.push(RegionalMeans {
            region: regions.value(i).to_string(),
            country: countries.value(i).to_string(),
            metrics: per_metric,
        });
    }

    Ok(means)
}

pub struct SummaryReader {
    object_store: Arc<dyn ObjectStore>,
}

impl SummaryReader {
    pub fn new(object_store: Arc<dyn ObjectStore>) -> Self {
        Self { object_store }
    }

    async fn read_batches(&self, path: &Path) -> Result<Vec<RecordBatch>> {
        let bytes = self.object_store.get(path).await?.bytes().await?;
        let reader = ParquetRecordBatchReader::try_new(bytes, BATCH_SIZE)?;

        reader
            .map(|batch| batch.map_err(Error::from))
            .collect()
    }

    pub async fn read_summary_rows(&self, source: Source) -> Result<Vec<SummaryRow>> {
        let path = source.summary_path();
        let mut rows = Vec::new();

        for batch in self.read_batches(&path).await? {
            rows.extend(rows_from_batch(&batch)?);
        }

        info!("Loaded {} {} summary rows from {}", rows.len(), source, path);
        Ok(rows)
    }

    pub async fn read_regional_means(
        &self,
        table: RegionalTable,
        metrics: &[Metric],
    ) -> Result<Vec<RegionalMeans>> {
        let mut means = Vec::new();
        for batch in self.read_batches(&table.path()).await? {
            means.extend(regional_from_batch(&batch, metrics)?);
        }
        Ok(means)
    }

    /// Sources with a persisted summary object.
    pub async fn available_sources(&self) -> Result<Vec<Source>> {
        let prefix = Path::from(PROCESSED_PREFIX);
        let mut listing = self.object_store.list(Some(&prefix));
        let mut sources = Vec::new();

        while let Some(meta) = listing.next().await {
            let meta = meta?;
            let Some(name) = meta.location.filename() else {
                continue;
            };
            if let Some(source) = name
                .strip_suffix(SUMMARY_SUFFIX)
                .and_then(|stem| Source::from_str(stem).ok())
            {
                sources.push(source);
            }
        }

        sources.sort_by_key(|s| s.as_str());
        Ok(sources)
    }
}

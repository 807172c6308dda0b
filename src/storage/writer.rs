use arrow::{
    array::{ArrayRef, Float64Array, StringArray, UInt64Array},
    record_batch::RecordBatch,
};
use bytes::Bytes;
use object_store::{path::Path, ObjectStore};
use parquet::{
    arrow::ArrowWriter,
    basic::Compression,
    file::properties::WriterProperties,
};
use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use crate::{
    Error, Metric, MetricSummaries, RegionalMeans, RegionalTable, Result, Source, SummaryRow,
    METADATA_FILE,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub rows: usize,
    pub locations: usize,
    pub observations: usize,
    pub skipped_rows: usize,
}

/// Written next to the summaries after a preprocessing run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    pub processed_date: String,
    pub sources: BTreeMap<String, SourceMetadata>,
    pub regional_records: usize,
    #[serde(default)]
    pub starlink_state_records: usize,
}

pub struct SummaryWriter {
    object_store: Arc<dyn ObjectStore>,
    max_retries: u32,
}

impl SummaryWriter {
    pub fn new(object_store: Arc<dyn ObjectStore>) -> Self {
        Self {
            object_store,
            max_retries: 3,
        }
    }

    async fn put_with_retries(&self, path: &Path, buffer: Bytes) -> Result<()> {
        let mut retries = 0;
        while retries < self.max_retries {
            match self.object_store.put(path, buffer.clone().into()).await {
                Ok(_) => return Ok(()),
                Err(e) if retries < self.max_retries - 1 => {
                    retries += 1;
                    let delay = std::time::Duration::from_secs(2u64.pow(retries));
                    warn!(
                        "Write attempt {} failed for path {}: {}. Retrying in {} seconds...",
                        retries, path, e, delay.as_secs()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::Store(format!("Failed to write {} after {} retries", path, self.max_retries)))
    }

    async fn write_batch_to_store(&self, path: &Path, batch: RecordBatch) -> Result<()> {
        let buffer = tokio::task::spawn_blocking(move || encode_parquet(&batch)).await??;
        self.put_with_retries(path, Bytes::from(buffer)).await
    }

    pub async fn write_summary_rows(&self, source: Source, rows: &[SummaryRow]) -> Result<()> {
        if rows.is_empty() {
            warn!("No summary rows to write for {}", source);
        }

        let batch = summary_batch(rows)?;
        let path = source.summary_path();
        self.write_batch_to_store(&path, batch).await?;

        info!("Wrote {} {} summary rows to {}", rows.len(), source, path);
        Ok(())
    }

    pub async fn write_regional_means(
        &self,
        table: RegionalTable,
        means: &[RegionalMeans],
        metrics: &[Metric],
    ) -> Result<()> {
        let batch = regional_batch(means, metrics)?;
        let path = table.path();
        self.write_batch_to_store(&path, batch).await?;

        info!("Wrote {} {} regional rows to {}", means.len(), table, path);
        Ok(())
    }

    pub async fn write_metadata(&self, metadata: &ProcessingMetadata) -> Result<()> {
        let json = serde_json::to_vec_pretty(metadata)?;
        self.put_with_retries(&Path::from(METADATA_FILE), Bytes::from(json)).await?;

        info!("Wrote processing metadata: {:?}", metadata);
        Ok(())
    }
}

fn encode_parquet(batch: &RecordBatch) -> Result<Vec<u8>> {
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .set_write_batch_size(1024 * 1024)
        .build();

    let mut buffer = Vec::new();
    {
        let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), Some(props))?;
        writer.write(batch)?;
        writer.close()?;
    }
    Ok(buffer)
}

/// The JSON blob stored per row: `{metric: {min, q1, median, q3, max, outliers, count}}`.
pub fn stats_blob(stats: &MetricSummaries) -> Result<String> {
    Ok(serde_json::to_string(stats)?)
}

pub fn summary_batch(rows: &[SummaryRow]) -> Result<RecordBatch> {
    let mut rows: Vec<&SummaryRow> = rows.iter().collect();
    rows.sort_by(|a, b| a.group_key().cmp(&b.group_key()));

    let blobs = rows
        .iter()
        .map(|row| stats_blob(&row.stats))
        .collect::<Result<Vec<_>>>()?;

    let batch = RecordBatch::try_from_iter([
        ("key", Arc::new(StringArray::from(rows.iter().map(|r| r.key.clone()).collect::<Vec<_>>())) as ArrayRef),
        ("client_asn", Arc::new(UInt64Array::from(rows.iter().map(|r| r.group.asn as u64).collect::<Vec<_>>())) as ArrayRef),
        ("client_as_name", Arc::new(StringArray::from(rows.iter().map(|r| r.group.name.clone()).collect::<Vec<_>>())) as ArrayRef),
        ("client_city", Arc::new(StringArray::from(rows.iter().map(|r| r.location.city.clone()).collect::<Vec<_>>())) as ArrayRef),
        ("client_country", Arc::new(StringArray::from(rows.iter().map(|r| r.location.country.clone()).collect::<Vec<_>>())) as ArrayRef),
        ("server_pop", Arc::new(StringArray::from(rows.iter().map(|r| r.location.server_pop.clone()).collect::<Vec<_>>())) as ArrayRef),
        ("boxplot_stats", Arc::new(StringArray::from(blobs)) as ArrayRef),
    ])?;

    Ok(batch)
}

pub fn regional_batch(means: &[RegionalMeans], metrics: &[Metric]) -> Result<RecordBatch> {
    let mut columns: Vec<(String, ArrayRef)> = vec![
        ("region".to_string(), Arc::new(StringArray::from(means.iter().map(|m| m.region.clone()).collect::<Vec<_>>())) as ArrayRef),
        ("country".to_string(), Arc::new(StringArray::from(means.iter().map(|m| m.country.clone()).collect::<Vec<_>>())) as ArrayRef),
    ];

    for &metric in metrics {
        let averages: Vec<Option<f64>> = means.iter().map(|m| m.mean(metric)).collect();
        let spreads: Vec<Option<f64>> = means
            .iter()
            .map(|m| m.metrics.get(&metric).map(|s| s.std_dev))
            .collect();
        let counts: Vec<u64> = means
            .iter()
            .map(|m| m.metrics.get(&metric).map_or(0, |s| s.sample_count))
            .collect();

        columns.push((format!("{}_mean", metric), Arc::new(Float64Array::from(averages)) as ArrayRef));
        columns.push((format!("{}_std_dev", metric), Arc::new(Float64Array::from(spreads)) as ArrayRef));
        columns.push((format!("{}_count", metric), Arc::new(UInt64Array::from(counts)) as ArrayRef));
    }

    Ok(RecordBatch::try_from_iter(columns)?)
}

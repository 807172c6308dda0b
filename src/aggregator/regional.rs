use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use tracing::info;
use crate::{Metric, Observation};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MomentSummary {
    pub mean: f64,
    pub std_dev: f64,
    pub sample_count: u64,
}

/// Mean and second central moment of a batch of values.
#[derive(Debug, Clone, Default)]
pub struct Moments {
    n: u64,
    mean: f64,
    m2: f64,
}

impl Moments {
    pub fn create(values: &[f64]) -> Self {
        let n = values.len() as u64;
        if n == 0 {
            return Self::default();
        }

        let mean = values.iter().sum::<f64>() / n as f64;
        let m2 = values
            .iter()
            .map(|x| {
                let delta = x - mean;
                delta * delta
            })
            .sum();

        Self { n, mean, m2 }
    }

    pub fn to_summary(&self) -> MomentSummary {
        // Bessel's correction; a single sample has no spread
        let std_dev = if self.n < 2 {
            0.0
        } else {
            (self.m2 / (self.n as f64 - 1.0)).sqrt()
        };

        MomentSummary {
            mean: self.mean,
            std_dev,
            sample_count: self.n,
        }
    }
}

/// Per-region averages feeding the choropleth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalMeans {
    pub region: String,
    pub country: String,
    pub metrics: BTreeMap<Metric, MomentSummary>,
}

impl RegionalMeans {
    pub fn mean(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(&metric).map(|m| m.mean)
    }
}

/// Averages every metric per region for observations from `country`.
/// Observations without a region are ignored; regions come back sorted.
pub fn regional_means(observations: &[Observation], country: &str, metrics: &[Metric]) -> Vec<RegionalMeans> {
    let mut columns: BTreeMap<&str, BTreeMap<Metric, Vec<f64>>> = BTreeMap::new();

    for obs in observations.iter().filter(|obs| obs.location.country == country) {
        let Some(region) = obs.location.region.as_deref() else {
            continue;
        };
        let region_columns = columns.entry(region).or_default();
        for &metric in metrics {
            if let Some(value) = obs.value(metric) {
                region_columns.entry(metric).or_default().push(value);
            }
        }
    }

    let means: Vec<RegionalMeans> = columns
        .into_iter()
        .map(|(region, region_columns)| RegionalMeans {
            region: region.to_string(),
            country: country.to_string(),
            metrics: region_columns
                .into_iter()
                .map(|(metric, values)| (metric, Moments::create(&values).to_summary()))
                .collect(),
        })
        .collect();

    info!("Computed regional means for {} regions in {}", means.len(), country);
    means
}

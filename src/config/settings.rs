use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;
use crate::{Error, Result};
use super::{AggregationPolicy, OrderingPolicy, ReconstructionPolicy};

/// Runtime configuration, assembled from `SPEEDSTATS_*` variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub log_level: Level,
    pub aggregation: AggregationPolicy,
    pub reconstruction: ReconstructionPolicy,
    pub ordering: OrderingPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            log_level: Level::INFO,
            aggregation: AggregationPolicy::default(),
            reconstruction: ReconstructionPolicy::default(),
            ordering: OrderingPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let aggregation = AggregationPolicy {
            min_group_observations: parse_var(
                "SPEEDSTATS_MIN_GROUP",
                defaults.aggregation.min_group_observations,
            )?,
            min_location_observations: parse_var(
                "SPEEDSTATS_MIN_LOCATION",
                defaults.aggregation.min_location_observations,
            )?,
        };

        let reconstruction = ReconstructionPolicy {
            sample_cap: parse_var("SPEEDSTATS_SAMPLE_CAP", defaults.reconstruction.sample_cap)?,
            outlier_ceiling: parse_var(
                "SPEEDSTATS_OUTLIER_CEILING",
                defaults.reconstruction.outlier_ceiling,
            )?,
            ..defaults.reconstruction
        };

        let ordering = match env::var("SPEEDSTATS_DISTINGUISHED_ASNS") {
            Ok(raw) => OrderingPolicy::new(parse_asn_list(&raw)?),
            Err(_) => defaults.ordering.clone(),
        }
        .with_max_location_groups(parse_var(
            "SPEEDSTATS_MAX_LOCATION_GROUPS",
            defaults.ordering.max_location_groups,
        )?);

        let log_level = match env::var("SPEEDSTATS_LOG") {
            Ok(raw) => Level::from_str(&raw)
                .map_err(|_| Error::Config(format!("Invalid SPEEDSTATS_LOG level: {}", raw)))?,
            Err(_) => defaults.log_level,
        };

        Ok(Self {
            data_dir: env::var("SPEEDSTATS_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            log_level,
            aggregation,
            reconstruction,
            ordering,
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("Invalid {} format: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

pub fn parse_asn_list(raw: &str) -> Result<Vec<u32>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .map_err(|_| Error::Config(format!("Invalid ASN in SPEEDSTATS_DISTINGUISHED_ASNS: {}", s)))
        })
        .collect()
}

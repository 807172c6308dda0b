use lazy_static::lazy_static;
use crate::Metric;

lazy_static! {
    /// Starlink autonomous systems, always drawn first.
    pub static ref STARLINK_ASNS: Vec<u32> = vec![STARLINK_ASN, 27277, 45700];

    /// Metrics summarized for every group, in blob order.
    pub static ref SUMMARY_METRICS: Vec<Metric> = vec![
        Metric::Download,
        Metric::Upload,
        Metric::Latency,
        Metric::Jitter,
        Metric::Loss,
    ];
}

/// Operator the Starlink state export is attributed to.
pub const STARLINK_ASN: u32 = 14593;
pub const STARLINK_NAME: &str = "Starlink";

pub const MIN_GROUP_OBSERVATIONS: usize = 10;
pub const MIN_LOCATION_OBSERVATIONS: usize = 1000;

/// Series drawn for a single location, distinguished groups included.
pub const MAX_LOCATION_GROUPS: usize = 10;

pub const SAMPLE_CAP: usize = 50;
pub const MEDIAN_SHARE: f64 = 0.5;
pub const Q1_SHARE: f64 = 0.25;
pub const SPREAD_DIVISOR: f64 = 4.0;
pub const OUTLIER_CEILING: f64 = 2.0;
pub const SPREAD_EPSILON: f64 = 1e-9;

/// Tukey fence multiplier applied to the IQR.
pub const FENCE_MULTIPLIER: f64 = 1.5;

pub const BITS_PER_MEGABIT: f64 = 1e6;

pub const PROCESSED_PREFIX: &str = "processed";
pub const SUMMARY_SUFFIX: &str = "_boxplot_stats.parquet";
pub const REGIONAL_MEANS_FILE: &str = "processed/regional_means.parquet";
pub const STARLINK_STATES_FILE: &str = "processed/starlink_state_p50.parquet";
pub const METADATA_FILE: &str = "processed/metadata.json";

pub const DEFAULT_COUNTRY: &str = "US";

use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use object_store::path::Path;
use crate::{Error, PROCESSED_PREFIX, REGIONAL_MEANS_FILE, STARLINK_STATES_FILE, SUMMARY_SUFFIX};

/// A measured quantity. Serialized names double as the keys of the
/// persisted stats blob.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "download")]
    Download,
    #[serde(rename = "upload")]
    Upload,
    #[serde(rename = "latencyMs")]
    Latency,
    #[serde(rename = "jitter")]
    Jitter,
    #[serde(rename = "loss")]
    Loss,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Download => "download",
            Metric::Upload => "upload",
            Metric::Latency => "latencyMs",
            Metric::Jitter => "jitter",
            Metric::Loss => "loss",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Metric::Download => "Download Speed (Mbps)",
            Metric::Upload => "Upload Speed (Mbps)",
            Metric::Latency => "Latency (ms)",
            Metric::Jitter => "Jitter (ms)",
            Metric::Loss => "Packet Loss Ratio",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "download" => Ok(Metric::Download),
            "upload" => Ok(Metric::Upload),
            "latencyMs" | "latency" => Ok(Metric::Latency),
            "jitter" => Ok(Metric::Jitter),
            "loss" => Ok(Metric::Loss),
            other => Err(Error::Processing(format!("Unknown metric: {}", other))),
        }
    }
}

/// Which export a batch of observations came from.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    MLab,
    Cloudflare,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::MLab => "mlab",
            Source::Cloudflare => "cloudflare",
        }
    }

    pub fn summary_path(&self) -> Path {
        Path::from(format!("{}/{}{}", PROCESSED_PREFIX, self.as_str(), SUMMARY_SUFFIX))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Source {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mlab" | "m-lab" => Ok(Source::MLab),
            "cloudflare" => Ok(Source::Cloudflare),
            other => Err(Error::Processing(format!("Unknown source: {}", other))),
        }
    }
}

/// Persisted per-region table: Cloudflare state averages or Starlink's own
/// monthly state medians.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionalTable {
    Cloudflare,
    Starlink,
}

impl RegionalTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionalTable::Cloudflare => "cloudflare",
            RegionalTable::Starlink => "starlink",
        }
    }

    pub fn path(&self) -> Path {
        match self {
            RegionalTable::Cloudflare => Path::from(REGIONAL_MEANS_FILE),
            RegionalTable::Starlink => Path::from(STARLINK_STATES_FILE),
        }
    }
}

impl fmt::Display for RegionalTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RegionalTable {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cloudflare" => Ok(RegionalTable::Cloudflare),
            "starlink" => Ok(RegionalTable::Starlink),
            other => Err(Error::Processing(format!("Unknown regional table: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct LocationKey {
    pub city: String,
    pub country: String,
    pub server_pop: String,
    pub region: Option<String>,
}

impl LocationKey {
    pub fn new(city: impl Into<String>, country: impl Into<String>, server_pop: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            country: country.into(),
            server_pop: server_pop.into(),
            region: None,
        }
    }

    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {} (to {})", self.city, self.country, self.server_pop)
    }
}

/// The network operator a measurement is attributed to.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct GroupIdentity {
    pub asn: u32,
    pub name: String,
}

impl GroupIdentity {
    pub fn new(asn: u32, name: impl Into<String>) -> Self {
        Self { asn, name: name.into() }
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for GroupIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.asn, self.name)
    }
}

#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct GroupKey {
    pub location: String,
    pub group: GroupIdentity,
}

impl GroupKey {
    pub fn new(location: impl Into<String>, group: GroupIdentity) -> Self {
        Self { location: location.into(), group }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub location: LocationKey,
    pub group: GroupIdentity,
    pub download: Option<f64>,
    pub upload: Option<f64>,
    pub latency: Option<f64>,
    pub jitter: Option<f64>,
    pub loss: Option<f64>,
}

impl Observation {
    pub fn new(location: LocationKey, group: GroupIdentity) -> Self {
        Self {
            location,
            group,
            download: None,
            upload: None,
            latency: None,
            jitter: None,
            loss: None,
        }
    }

    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        let slot = match metric {
            Metric::Download => &mut self.download,
            Metric::Upload => &mut self.upload,
            Metric::Latency => &mut self.latency,
            Metric::Jitter => &mut self.jitter,
            Metric::Loss => &mut self.loss,
        };
        *slot = Some(value);
        self
    }

    /// Value of `metric`, `None` when missing, NaN or negative.
    pub fn value(&self, metric: Metric) -> Option<f64> {
        let raw = match metric {
            Metric::Download => self.download,
            Metric::Upload => self.upload,
            Metric::Latency => self.latency,
            Metric::Jitter => self.jitter,
            Metric::Loss => self.loss,
        };
        raw.filter(|v| v.is_finite() && *v >= 0.0)
    }

    pub fn group_key(&self) -> GroupKey {
        GroupKey::new(self.location.key(), self.group.clone())
    }
}

/// Five-number summary plus Tukey outliers for one metric of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantileSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub outliers: Vec<f64>,
    pub count: u64,
}

impl QuantileSummary {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    pub fn is_finite(&self) -> bool {
        [self.min, self.q1, self.median, self.q3, self.max]
            .iter()
            .all(|v| v.is_finite())
    }
}

pub type MetricSummaries = BTreeMap<Metric, QuantileSummary>;

/// One persisted record: a group with the summaries of every metric that
/// had data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub key: String,
    pub location: LocationKey,
    pub group: GroupIdentity,
    pub stats: MetricSummaries,
}

impl SummaryRow {
    pub fn group_key(&self) -> GroupKey {
        GroupKey::new(self.key.clone(), self.group.clone())
    }

    pub fn summary(&self, metric: Metric) -> Option<&QuantileSummary> {
        self.stats.get(&metric)
    }

    /// Measurements behind the row: the largest count of any metric, since
    /// a test may leave some metrics empty.
    pub fn measurements(&self) -> u64 {
        self.stats.values().map(|s| s.count).max().unwrap_or(0)
    }
}

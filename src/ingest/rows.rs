use serde::Deserialize;
use crate::{GroupIdentity, LocationKey, Observation, STARLINK_ASN, STARLINK_NAME};

/// Column layout of the NDT export. `serverCity` is the PoP and `latency`
/// is the minimum RTT in milliseconds.
#[derive(Debug, Deserialize)]
pub struct MLabRow {
    #[serde(rename = "clientCity", default)]
    pub client_city: String,
    #[serde(rename = "clientCountry", default)]
    pub client_country: String,
    #[serde(rename = "clientRegion", default)]
    pub client_region: Option<String>,
    #[serde(rename = "serverCity", default)]
    pub server_city: String,
    #[serde(rename = "clientASN", default)]
    pub client_asn: Option<f64>,
    #[serde(rename = "clientASName", default)]
    pub client_as_name: String,
    #[serde(default)]
    pub download: Option<f64>,
    #[serde(default)]
    pub upload: Option<f64>,
    #[serde(default)]
    pub latency: Option<f64>,
    #[serde(default)]
    pub loss: Option<f64>,
}

impl From<MLabRow> for Observation {
    fn from(row: MLabRow) -> Self {
        let location = LocationKey::new(row.client_city, row.client_country, row.server_city)
            .with_region(non_empty(row.client_region));

        Observation {
            location,
            group: GroupIdentity::new(asn_or_zero(row.client_asn), row.client_as_name),
            download: row.download,
            upload: row.upload,
            latency: row.latency,
            jitter: None,
            loss: row.loss,
        }
    }
}

/// Column layout of the Cloudflare speedtest export.
#[derive(Debug, Deserialize)]
pub struct CloudflareRow {
    #[serde(rename = "clientCity", default)]
    pub client_city: String,
    #[serde(rename = "clientCountry", default)]
    pub client_country: String,
    #[serde(rename = "clientRegion", default)]
    pub client_region: Option<String>,
    #[serde(rename = "serverPoP", default)]
    pub server_pop: String,
    #[serde(rename = "clientASN", default)]
    pub client_asn: Option<f64>,
    #[serde(rename = "clientASName", default)]
    pub client_as_name: String,
    #[serde(default)]
    pub download: Option<f64>,
    #[serde(default)]
    pub upload: Option<f64>,
    #[serde(rename = "latencyMs", default)]
    pub latency_ms: Option<f64>,
    #[serde(default)]
    pub jitter: Option<f64>,
    #[serde(default)]
    pub loss: Option<f64>,
}

impl From<CloudflareRow> for Observation {
    fn from(row: CloudflareRow) -> Self {
        let location = LocationKey::new(row.client_city, row.client_country, row.server_pop)
            .with_region(non_empty(row.client_region));

        Observation {
            location,
            group: GroupIdentity::new(asn_or_zero(row.client_asn), row.client_as_name),
            download: row.download,
            upload: row.upload,
            latency: row.latency_ms,
            jitter: row.jitter,
            loss: row.loss,
        }
    }
}

/// One month of Starlink's published per-state metrics. Only the medians
/// are read; the other percentile columns are ignored.
#[derive(Debug, Deserialize)]
pub struct StarlinkStateRow {
    #[serde(default)]
    pub state_name: String,
    #[serde(default)]
    pub country_iso2: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub download_p50: Option<f64>,
    #[serde(default)]
    pub upload_p50: Option<f64>,
    #[serde(default)]
    pub latency_p50: Option<f64>,
}

impl From<StarlinkStateRow> for Observation {
    fn from(row: StarlinkStateRow) -> Self {
        let location = LocationKey::new("", row.country_iso2, "")
            .with_region(non_empty(Some(row.state_name)));

        Observation {
            location,
            group: GroupIdentity::new(STARLINK_ASN, STARLINK_NAME),
            download: row.download_p50,
            upload: row.upload_p50,
            latency: row.latency_p50,
            jitter: None,
            loss: None,
        }
    }
}

// ASNs arrive as floats when the export had gaps
fn asn_or_zero(asn: Option<f64>) -> u32 {
    asn.filter(|v| v.is_finite() && *v >= 0.0 && *v <= u32::MAX as f64)
        .map(|v| v as u32)
        .unwrap_or(0)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use crate::{GroupIdentity, Metric, QuantileSummary, SummaryRow};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationSummary {
    pub location: String,
    pub summary: QuantileSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDetail {
    pub total_measurements: u64,
    pub locations: Vec<LocationSummary>,
}

/// Everything stored about one operator, across all of its locations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupDetails {
    pub group: GroupIdentity,
    pub label: String,
    pub location_count: usize,
    pub metrics: BTreeMap<Metric, MetricDetail>,
}

pub fn group_details<'a, I>(rows: I, group: &GroupIdentity) -> Option<GroupDetails>
where
    I: IntoIterator<Item = &'a SummaryRow>,
{
    let mut locations = BTreeSet::new();
    let mut metrics: BTreeMap<Metric, MetricDetail> = BTreeMap::new();

    for row in rows.into_iter().filter(|row| &row.group == group) {
        locations.insert(row.key.clone());

        for (metric, summary) in &row.stats {
            let detail = metrics.entry(*metric).or_insert_with(|| MetricDetail {
                total_measurements: 0,
                locations: Vec::new(),
            });
            detail.total_measurements = detail.total_measurements.saturating_add(summary.count);
            detail.locations.push(LocationSummary {
                location: row.key.clone(),
                summary: summary.clone(),
            });
        }
    }

    if locations.is_empty() {
        return None;
    }

    for detail in metrics.values_mut() {
        detail.locations.sort_by(|a, b| a.location.cmp(&b.location));
    }

    Some(GroupDetails {
        group: group.clone(),
        label: group.label(),
        location_count: locations.len(),
        metrics,
    })
}

use itertools::Itertools;
use std::collections::HashMap;
use tracing::{debug, info};
use crate::{
    build_summary, AggregationPolicy, GroupKey, Metric, MetricSummaries, Observation, SummaryRow,
};

/// Partitions observations by (location, operator) and summarizes every
/// partition that is large enough.
#[derive(Debug, Clone, Default)]
pub struct GroupAggregator {
    policy: AggregationPolicy,
}

impl GroupAggregator {
    pub fn new(policy: AggregationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AggregationPolicy {
        &self.policy
    }

    /// Drops every observation whose location has too few measurements.
    pub fn filter_locations<'a>(&self, observations: &'a [Observation]) -> Vec<&'a Observation> {
        let location_counts = observations
            .iter()
            .counts_by(|obs| obs.location.key());

        let kept: Vec<&Observation> = observations
            .iter()
            .filter(|obs| {
                location_counts
                    .get(&obs.location.key())
                    .is_some_and(|count| *count >= self.policy.min_location_observations)
            })
            .collect();

        debug!(
            "Location filter kept {}/{} observations across {} locations",
            kept.len(),
            observations.len(),
            location_counts
                .values()
                .filter(|count| **count >= self.policy.min_location_observations)
                .count()
        );

        kept
    }

    /// Summary rows keyed by group. Groups below the size threshold and
    /// groups without a single summarizable metric are skipped.
    pub fn aggregate(
        &self,
        observations: &[Observation],
        metrics: &[Metric],
    ) -> HashMap<GroupKey, SummaryRow> {
        let groups = self
            .filter_locations(observations)
            .into_iter()
            .into_group_map_by(|obs| obs.group_key());

        let total_groups = groups.len();
        let rows: HashMap<GroupKey, SummaryRow> = groups
            .into_iter()
            .filter(|(_, members)| members.len() >= self.policy.min_group_observations)
            .filter_map(|(key, members)| {
                self.summarize_group(&key, &members, metrics)
                    .map(|row| (key, row))
            })
            .collect();

        info!(
            "Aggregated {} observations into {} of {} groups (min group size {})",
            observations.len(),
            rows.len(),
            total_groups,
            self.policy.min_group_observations
        );

        rows
    }

    /// Summarizes one partition. Location metadata comes from its first
    /// member.
    pub fn summarize_group(
        &self,
        key: &GroupKey,
        members: &[&Observation],
        metrics: &[Metric],
    ) -> Option<SummaryRow> {
        let first = members.first()?;

        let stats: MetricSummaries = metrics
            .iter()
            .filter_map(|&metric| {
                build_summary(members.iter().map(|obs| obs.value(metric)))
                    .map(|summary| (metric, summary))
            })
            .collect();

        if stats.is_empty() {
            debug!("No metric data for {} / {}", key.location, key.group);
            return None;
        }

        Some(SummaryRow {
            key: key.location.clone(),
            location: first.location.clone(),
            group: key.group.clone(),
            stats,
        })
    }
}

/// Rows in a stable order: location key, then ASN, then name.
pub fn sorted_rows(rows: HashMap<GroupKey, SummaryRow>) -> Vec<SummaryRow> {
    rows.into_iter()
        .sorted_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, row)| row)
        .collect()
}

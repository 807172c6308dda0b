use serde::{Serialize, Deserialize};
use std::collections::HashSet;
use crate::{
    MIN_GROUP_OBSERVATIONS, MIN_LOCATION_OBSERVATIONS,
    SAMPLE_CAP, MEDIAN_SHARE, Q1_SHARE, SPREAD_DIVISOR, OUTLIER_CEILING, SPREAD_EPSILON,
    MAX_LOCATION_GROUPS, STARLINK_ASNS,
};

/// Thresholds the aggregator applies before summarizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregationPolicy {
    /// Groups with fewer observations are left out.
    pub min_group_observations: usize,
    /// Locations with fewer observations are dropped before grouping.
    pub min_location_observations: usize,
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self {
            min_group_observations: MIN_GROUP_OBSERVATIONS,
            min_location_observations: MIN_LOCATION_OBSERVATIONS,
        }
    }
}

/// Tuning of the synthetic sample generator.
///
/// `outlier_ceiling` and the use of `q3` as its base are empirically tuned
/// and kept configurable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionPolicy {
    pub sample_cap: usize,
    pub median_share: f64,
    pub q1_share: f64,
    pub spread_divisor: f64,
    pub outlier_ceiling: f64,
    pub spread_epsilon: f64,
}

impl Default for ReconstructionPolicy {
    fn default() -> Self {
        Self {
            sample_cap: SAMPLE_CAP,
            median_share: MEDIAN_SHARE,
            q1_share: Q1_SHARE,
            spread_divisor: SPREAD_DIVISOR,
            outlier_ceiling: OUTLIER_CEILING,
            spread_epsilon: SPREAD_EPSILON,
        }
    }
}

/// Which operators are shown ahead of everyone else, and how many series a
/// single location view keeps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderingPolicy {
    pub distinguished: HashSet<u32>,
    /// Distinguished groups always count against this cap but are never cut.
    pub max_location_groups: usize,
}

impl OrderingPolicy {
    pub fn new(distinguished: impl IntoIterator<Item = u32>) -> Self {
        Self {
            distinguished: distinguished.into_iter().collect(),
            max_location_groups: MAX_LOCATION_GROUPS,
        }
    }

    pub fn with_max_location_groups(mut self, max_location_groups: usize) -> Self {
        self.max_location_groups = max_location_groups;
        self
    }
}

impl Default for OrderingPolicy {
    fn default() -> Self {
        Self::new(STARLINK_ASNS.iter().copied())
    }
}

use ordered_float::OrderedFloat;
use tracing::debug;
use crate::{QuantileSummary, FENCE_MULTIPLIER};

/// Quantile of already sorted values using linear interpolation between
/// the two closest ranks (`h = (n - 1) * p`), the estimator pandas and numpy
/// use by default.
pub fn quantile(sorted_values: &[f64], p: f64) -> Option<f64> {
    if sorted_values.is_empty() {
        return None;
    }

    if sorted_values.len() == 1 {
        return Some(sorted_values[0]);
    }

    let p = p.clamp(0.0, 1.0);
    let rank = (sorted_values.len() - 1) as f64 * p;
    let k = rank.floor() as usize;
    let d = rank - k as f64;

    if k + 1 >= sorted_values.len() {
        Some(sorted_values[sorted_values.len() - 1])
    } else {
        let lower = sorted_values[k];
        let upper = sorted_values[k + 1];
        Some(lower + d * (upper - lower))
    }
}

/// Builds the box-plot summary of one metric column.
///
/// Missing entries (`None`, NaN, infinities) are dropped first. Returns
/// `None` when nothing is left.
pub fn build_summary<I>(values: I) -> Option<QuantileSummary>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let data: Vec<f64> = values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect();

    if data.is_empty() {
        return None;
    }

    let mut sorted = data.clone();
    sorted.sort_unstable_by_key(|v| OrderedFloat(*v));

    let q1 = quantile(&sorted, 0.25)?;
    let median = quantile(&sorted, 0.50)?;
    let q3 = quantile(&sorted, 0.75)?;

    let iqr = q3 - q1;
    let lower_bound = q1 - FENCE_MULTIPLIER * iqr;
    let upper_bound = q3 + FENCE_MULTIPLIER * iqr;

    // Outliers keep their input order.
    let (inliers, outliers): (Vec<f64>, Vec<f64>) = data
        .iter()
        .copied()
        .partition(|v| *v >= lower_bound && *v <= upper_bound);

    let raw_min = sorted[0];
    let raw_max = sorted[sorted.len() - 1];

    let whisker_min = inliers
        .iter()
        .copied()
        .map(OrderedFloat)
        .min()
        .map_or(raw_min, |v| v.0);
    let whisker_max = inliers
        .iter()
        .copied()
        .map(OrderedFloat)
        .max()
        .map_or(raw_max, |v| v.0);

    debug!(
        "Summarized {} values: Q1={:.3}, median={:.3}, Q3={:.3}, {} outliers",
        data.len(), q1, median, q3, outliers.len()
    );

    // Interpolated quartiles can fall outside the inlier extrema on tiny
    // inputs; the whiskers never end inside the box.
    Some(QuantileSummary {
        min: whisker_min.min(q1),
        q1,
        median,
        q3,
        max: whisker_max.max(q3),
        outliers,
        count: data.len() as u64,
    })
}

/// Convenience over a plain slice; NaN counts as missing.
pub fn summarize(values: &[f64]) -> Option<QuantileSummary> {
    build_summary(values.iter().map(|v| Some(*v)))
}

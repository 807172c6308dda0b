use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::{debug, warn};
use crate::{QuantileSummary, ReconstructionPolicy, SummaryRow, Metric};

/// One Gaussian blob of synthetic points, clipped to `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cluster {
    pub center: f64,
    pub spread: f64,
    pub lower: f64,
    pub upper: f64,
    pub size: usize,
}

impl Cluster {
    /// Appends `size` clipped draws to `out`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, out: &mut Vec<f64>) {
        if self.size == 0 {
            return;
        }

        let normal = match Normal::new(self.center, self.spread) {
            Ok(normal) => normal,
            Err(e) => {
                warn!(
                    "Skipping cluster at {} with spread {}: {}",
                    self.center, self.spread, e
                );
                return;
            }
        };

        out.extend(
            normal
                .sample_iter(&mut *rng)
                .take(self.size)
                .map(|x| clip(x, self.lower, self.upper)),
        );
    }
}

/// Order-insensitive clamp; never panics on inverted bounds.
fn clip(x: f64, a: f64, b: f64) -> f64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    x.max(lo).min(hi)
}

/// Rebuilds a plausible sample set from a stored [`QuantileSummary`].
///
/// Half of the points gather around the median and a quarter around each
/// quartile. Every call draws fresh randomness from the caller's RNG, so
/// results are only reproducible under a seeded generator.
#[derive(Debug, Clone, Default)]
pub struct Reconstructor {
    policy: ReconstructionPolicy,
}

impl Reconstructor {
    pub fn new(policy: ReconstructionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ReconstructionPolicy {
        &self.policy
    }

    /// Number of clustered points drawn for `summary` under `cap`.
    pub fn target_size(&self, summary: &QuantileSummary, cap: usize) -> usize {
        usize::try_from(summary.count).unwrap_or(usize::MAX).min(cap)
    }

    fn spread(&self, gap: f64) -> f64 {
        let spread = gap / self.policy.spread_divisor;
        if spread.is_finite() && spread > 0.0 {
            spread
        } else {
            self.policy.spread_epsilon
        }
    }

    /// Splits `n` points into the median, Q1 and Q3 clusters.
    pub fn plan(&self, summary: &QuantileSummary, n: usize) -> [Cluster; 3] {
        let median_n = (n as f64 * self.policy.median_share).floor() as usize;
        let q1_n = ((n as f64 * self.policy.q1_share).floor() as usize).min(n - median_n.min(n));
        let q3_n = n.saturating_sub(median_n + q1_n);

        let QuantileSummary { min, q1, median, q3, .. } = *summary;

        [
            Cluster {
                center: median,
                spread: self.spread(q3 - q1),
                lower: min,
                upper: q3,
                size: median_n,
            },
            Cluster {
                center: q1,
                spread: self.spread((median - q1).max(q1 - min)),
                lower: min,
                upper: median,
                size: q1_n,
            },
            Cluster {
                center: q3,
                spread: self.spread(q3 - median),
                lower: median,
                upper: q3,
                size: q3_n,
            },
        ]
    }

    /// Stored outliers no larger than `outlier_ceiling * q3`, in stored order.
    pub fn admitted_outliers<'a>(&self, summary: &'a QuantileSummary) -> impl Iterator<Item = f64> + 'a {
        let ceiling = self.policy.outlier_ceiling * summary.q3;
        summary
            .outliers
            .iter()
            .copied()
            .filter(move |o| o.is_finite() && *o <= ceiling)
    }

    /// Synthesizes `min(count, cap)` clustered points plus the admitted
    /// outliers. Empty summaries and non-finite statistics yield nothing.
    pub fn reconstruct<R: Rng + ?Sized>(
        &self,
        summary: &QuantileSummary,
        cap: usize,
        rng: &mut R,
    ) -> Vec<f64> {
        if summary.count == 0 || !summary.is_finite() {
            debug!("Nothing to reconstruct (count={})", summary.count);
            return Vec::new();
        }

        let n = self.target_size(summary, cap);
        let mut points = Vec::with_capacity(n + summary.outliers.len());

        for cluster in self.plan(summary, n) {
            cluster.sample(&mut *rng, &mut points);
        }

        points.extend(self.admitted_outliers(summary));
        points
    }

    /// [`Self::reconstruct`] with the policy's own cap.
    pub fn reconstruct_capped<R: Rng + ?Sized>(&self, summary: &QuantileSummary, rng: &mut R) -> Vec<f64> {
        self.reconstruct(summary, self.policy.sample_cap, rng)
    }

    /// Points for one metric of a persisted row; a row without that metric
    /// contributes nothing.
    pub fn reconstruct_row<R: Rng + ?Sized>(&self, row: &SummaryRow, metric: Metric, rng: &mut R) -> Vec<f64> {
        row.summary(metric)
            .map(|summary| self.reconstruct_capped(summary, &mut *rng))
            .unwrap_or_default()
    }

    /// Concatenates the reconstructions of several summaries into one series.
    pub fn reconstruct_many<'a, I, R>(&self, summaries: I, rng: &mut R) -> Vec<f64>
    where
        I: IntoIterator<Item = &'a QuantileSummary>,
        R: Rng + ?Sized,
    {
        summaries
            .into_iter()
            .flat_map(|summary| self.reconstruct_capped(summary, &mut *rng))
            .collect()
    }
}

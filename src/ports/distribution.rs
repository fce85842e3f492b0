//! Probability-distribution ports. The core treats distributions as an
//! external collaborator but ships the handful of shapes needed to run the
//! documented end-to-end scenarios.

use serde::{Deserialize, Serialize};

use super::rng::RandomNumberGenerator;

/// A delay (in days) sampled for airborne-spread exposures, vaccine
/// immunity onset, or natural-history state durations.
pub trait DelayDistribution: Send {
    fn sample(&self, rng: &mut dyn RandomNumberGenerator) -> i32;
}

/// Degenerate distribution always returning the same value.
#[derive(Debug, Clone, Copy)]
pub struct PointMass(pub i32);

impl DelayDistribution for PointMass {
    fn sample(&self, _rng: &mut dyn RandomNumberGenerator) -> i32 {
        self.0
    }
}

/// Geometric-ish distribution over non-negative integers with mean `mean`,
/// truncated at zero. A reasonable stand-in for a relationship-chart
/// library's richer distributions.
#[derive(Debug, Clone, Copy)]
pub struct Geometric {
    pub mean: f64,
}

impl DelayDistribution for Geometric {
    fn sample(&self, rng: &mut dyn RandomNumberGenerator) -> i32 {
        if self.mean <= 0.0 {
            return 0;
        }
        let p = 1.0 / (self.mean + 1.0);
        let u = rng.u01().max(f64::MIN_POSITIVE);
        ((u.ln() / (1.0 - p).ln()).floor().max(0.0)) as i32
    }
}

/// Scenario-file-friendly description of a [`DelayDistribution`], since
/// trait objects are not themselves deserializable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DistributionSpec {
    PointMass { days: i32 },
    Geometric { mean: f64 },
}

impl DistributionSpec {
    pub fn build(&self) -> Box<dyn DelayDistribution> {
        match self {
            DistributionSpec::PointMass { days } => Box::new(PointMass(*days)),
            DistributionSpec::Geometric { mean } => Box::new(Geometric { mean: *mean }),
        }
    }
}

/// The empirical CDF of all herd sizes, used to precompute
/// `herd_size_factor[i] = 2 * CDF_sizes(size(i))` in the airborne model.
pub trait SizeDistribution: Send {
    /// `P(size <= x)`, in `[0, 1]`.
    fn cdf(&self, size: u32) -> f64;
}

/// Builds the empirical CDF from a fixed sample of herd sizes, the simplest
/// faithful implementation of an empirical CDF over all herd sizes.
#[derive(Debug, Clone)]
pub struct EmpiricalSizeDistribution {
    sorted_sizes: Vec<u32>,
}

impl EmpiricalSizeDistribution {
    pub fn from_sizes(mut sizes: Vec<u32>) -> Self {
        sizes.sort_unstable();
        Self {
            sorted_sizes: sizes,
        }
    }
}

impl SizeDistribution for EmpiricalSizeDistribution {
    fn cdf(&self, size: u32) -> f64 {
        if self.sorted_sizes.is_empty() {
            return 0.0;
        }
        let count_leq = self.sorted_sizes.partition_point(|&s| s <= size);
        count_leq as f64 / self.sorted_sizes.len() as f64
    }
}

//! Clustering types and configuration.

use std::f64::consts::PI;
use std::fmt;

use crate::error::ConfigError;
use crate::fourvec::FourVector;
use crate::hit::CalorimeterHit;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A cluster of hits grown around a seed within a cone.
///
/// Members are indices into the hit slice the cluster was built from. The
/// caller owns the hits; the cluster only records which of them it holds.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cluster {
    /// Indices of member hits.
    pub members: Vec<usize>,
    /// Cone radius (radians) used to grow this cluster.
    pub cone_radius: f64,
    /// Four-vector of the current membership.
    pub vector: FourVector,
}

impl Cluster {
    /// Creates a cluster from its members and recomputes its four-vector.
    pub fn new<H: CalorimeterHit>(hits: &[H], members: Vec<usize>, cone_radius: f64) -> Self {
        let vector = FourVector::from_members(hits, &members);
        Self {
            members,
            cone_radius,
            vector,
        }
    }

    /// Recomputes the four-vector from the current membership.
    pub fn recalculate<H: CalorimeterHit>(&mut self, hits: &[H]) {
        self.vector = FourVector::from_members(hits, &self.members);
    }

    /// Total energy of the cluster.
    #[inline]
    #[must_use]
    pub fn energy(&self) -> f64 {
        self.vector.energy
    }

    /// Returns the number of hits in the cluster.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true if the cluster has no hits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns true if the cluster holds the hit at `index`.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.members.contains(&index)
    }

    /// Iterates over the member hits of `hits`.
    pub fn hits<'a, H>(&'a self, hits: &'a [H]) -> impl Iterator<Item = &'a H> + 'a {
        self.members.iter().map(move |&i| &hits[i])
    }
}

/// How the angular distance between a hit and a cone axis is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum DistanceMetric {
    /// Cosine of the opening angle compared with `cos(R)`.
    #[default]
    DotProduct,
    /// `R^2 = dphi^2 + d(cos theta)^2`, a cheaper approximation of the dot product.
    #[cfg_attr(feature = "serde", serde(rename = "dphi-dcos-theta"))]
    DPhiDCosTheta,
    /// `R^2 = dphi^2 + dtheta^2`.
    #[cfg_attr(feature = "serde", serde(rename = "dphi-dtheta"))]
    DPhiDTheta,
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DotProduct => "DOTPRODUCT",
            Self::DPhiDCosTheta => "DPHIDCOSTHETA",
            Self::DPhiDTheta => "DPHIDTHETA",
        };
        f.write_str(name)
    }
}

/// Cone size and cluster energy cut, either fixed or predicted from the
/// seed energy.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "mode", rename_all = "snake_case"))]
pub enum ConePolicy {
    /// Same radius and minimum energy for every cluster.
    Fixed {
        /// Cone radius (radians).
        radius: f64,
        /// Minimum cluster energy (GeV).
        min_energy: f64,
    },
    /// Radius `cone[0] * ln(E) + cone[1]` and cut `cut[0] * E + cut[1] * E^2`,
    /// with `E` the seed energy.
    Predicted {
        /// Cone-size coefficients.
        cone: [f64; 2],
        /// Energy-cut coefficients.
        cut: [f64; 2],
    },
}

impl ConePolicy {
    /// Default cone-size coefficients.
    pub const DEFAULT_CONE_FUNCTION: [f64; 2] = [0.011_347, 0.043_117];
    /// Default energy-cut coefficients.
    pub const DEFAULT_CUT_FUNCTION: [f64; 2] = [3.2, 2.0];

    /// Predicted policy with the default coefficients.
    #[must_use]
    pub fn predicted_default() -> Self {
        Self::Predicted {
            cone: Self::DEFAULT_CONE_FUNCTION,
            cut: Self::DEFAULT_CUT_FUNCTION,
        }
    }

    /// Cone radius to use for a seed of the given energy.
    ///
    /// A predicted radius may come out negative, zero or NaN; callers treat
    /// any non-positive value as the end of the seed scan.
    #[inline]
    #[must_use]
    pub fn radius(&self, seed_energy: f64) -> f64 {
        match *self {
            Self::Fixed { radius, .. } => radius,
            Self::Predicted { cone: [a, b], .. } => a * seed_energy.ln() + b,
        }
    }

    /// Minimum energy a cluster grown from this seed must exceed.
    #[inline]
    #[must_use]
    pub fn energy_cut(&self, seed_energy: f64) -> f64 {
        match *self {
            Self::Fixed { min_energy, .. } => min_energy,
            Self::Predicted { cut: [a, b], .. } => a * seed_energy + b * seed_energy * seed_energy,
        }
    }

    /// Returns true for the seed-energy dependent policy.
    #[must_use]
    pub fn is_predicted(&self) -> bool {
        matches!(self, Self::Predicted { .. })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Fixed { radius, min_energy } => {
                if !(radius > 0.0 && radius < PI) {
                    return Err(ConfigError::InvalidConeRadius(radius));
                }
                finite("min_energy", min_energy)
            }
            Self::Predicted { cone, cut } => {
                finite("cone function A", cone[0])?;
                finite("cone function B", cone[1])?;
                finite("cut function A", cut[0])?;
                finite("cut function B", cut[1])
            }
        }
    }
}

impl Default for ConePolicy {
    fn default() -> Self {
        Self::Fixed {
            radius: 0.1,
            min_energy: 0.5,
        }
    }
}

fn finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { name, value })
    }
}

/// Configuration for the fixed-cone clusterer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FixedConeConfig {
    /// Minimum energy (GeV) a hit needs to seed a cluster.
    pub seed_energy: f64,
    /// Cone size and energy cut.
    pub policy: ConePolicy,
    /// Distance metric used while growing clusters.
    pub metric: DistanceMetric,
}

impl Default for FixedConeConfig {
    fn default() -> Self {
        Self {
            seed_energy: 0.1,
            policy: ConePolicy::default(),
            metric: DistanceMetric::default(),
        }
    }
}

impl FixedConeConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed cone radius and minimum cluster energy.
    #[must_use]
    pub fn fixed(radius: f64, seed_energy: f64, min_energy: f64) -> Self {
        Self {
            seed_energy,
            policy: ConePolicy::Fixed { radius, min_energy },
            metric: DistanceMetric::default(),
        }
    }

    /// Seed-energy dependent cone radius and energy cut.
    #[must_use]
    pub fn predicted(seed_energy: f64, cone: [f64; 2], cut: [f64; 2]) -> Self {
        Self {
            seed_energy,
            policy: ConePolicy::Predicted { cone, cut },
            metric: DistanceMetric::default(),
        }
    }

    /// Sets the seed energy threshold.
    #[must_use]
    pub fn with_seed_energy(mut self, seed_energy: f64) -> Self {
        self.seed_energy = seed_energy;
        self
    }

    /// Sets the cone policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ConePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the distance metric.
    #[must_use]
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Checks that all thresholds and constants are usable.
    ///
    /// # Errors
    /// Returns [`ConfigError`] for a non-finite value or a fixed cone radius
    /// outside `(0, pi)`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        finite("seed_energy", self.seed_energy)?;
        self.policy.validate()
    }
}

/// Counters collected during one clustering call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusteringStatistics {
    /// Number of hits passed in.
    pub hits_processed: usize,
    /// Seeds a cone was grown around.
    pub seeds_tried: usize,
    /// Candidates discarded by the energy cut.
    pub below_energy_cut: usize,
    /// Clusters emitted by the builder.
    pub clusters_built: usize,
    /// Cluster pairs whose cones overlapped.
    pub overlapping_pairs: usize,
    /// Hits moved between clusters during resolution.
    pub hits_transferred: usize,
    /// Clusters left without hits after resolution.
    pub clusters_emptied: usize,
    /// Scan stopped on a non-positive predicted cone radius.
    pub aborted_on_radius: bool,
}

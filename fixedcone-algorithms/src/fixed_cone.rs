//! Fixed-cone clustering: cone building followed by overlap resolution.

use std::collections::HashMap;
use std::fmt;

use fixedcone_core::clustering::{
    Cluster, ClusteringStatistics, ConePolicy, DistanceMetric, FixedConeConfig,
};
use fixedcone_core::error::ConfigError;
use fixedcone_core::hit::CalorimeterHit;
use log::debug;

use crate::builder::{build_clusters, FixedConeState};
use crate::metric::{DPhiDCosTheta, DPhiDTheta, DotProduct};
use crate::resolve::resolve_overlaps;

/// Cone clustering in `(theta, phi)`.
///
/// Hits within a radius `R` of a cluster axis join that cluster. The axis
/// starts at a seed hit and follows the energy-weighted direction as hits
/// are added. Clusters whose cones overlap afterwards are split by assigning
/// each shared-region hit to the nearer axis.
///
/// The clusterer holds configuration only; per-call bookkeeping lives in a
/// [`FixedConeState`], so one clusterer can serve many threads.
#[derive(Debug, Clone)]
pub struct FixedConeClusterer {
    config: FixedConeConfig,
    /// Minimum energy restored by [`Self::set_radius`] after a predicted policy.
    min_energy: f64,
}

impl FixedConeClusterer {
    /// Creates a clusterer after validating `config`.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if a threshold is not finite or the fixed
    /// cone radius is outside `(0, pi)`.
    pub fn new(config: FixedConeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            min_energy: fixed_min_energy(config.policy),
            config,
        })
    }

    /// Fixed radius with the default dot-product metric.
    ///
    /// # Errors
    /// See [`Self::new`].
    pub fn with_radius(radius: f64, seed_energy: f64, min_energy: f64) -> Result<Self, ConfigError> {
        Self::new(FixedConeConfig::fixed(radius, seed_energy, min_energy))
    }

    /// Predicted radius and cut with the default coefficients.
    ///
    /// # Errors
    /// See [`Self::new`].
    pub fn with_prediction(seed_energy: f64, metric: DistanceMetric) -> Result<Self, ConfigError> {
        Self::new(
            FixedConeConfig::new()
                .with_seed_energy(seed_energy)
                .with_policy(ConePolicy::predicted_default())
                .with_metric(metric),
        )
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &FixedConeConfig {
        &self.config
    }

    fn replace_config(&mut self, config: FixedConeConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Switches to a fixed cone radius, keeping the last minimum energy.
    ///
    /// # Errors
    /// See [`Self::new`].
    pub fn set_radius(&mut self, radius: f64) -> Result<(), ConfigError> {
        let policy = ConePolicy::Fixed {
            radius,
            min_energy: self.min_energy,
        };
        self.replace_config(self.config.with_policy(policy))
    }

    /// Switches to seed-energy dependent cone size and energy cut.
    ///
    /// # Errors
    /// See [`Self::new`].
    pub fn set_predict_functions(&mut self, cone: [f64; 2], cut: [f64; 2]) -> Result<(), ConfigError> {
        self.replace_config(self.config.with_policy(ConePolicy::Predicted { cone, cut }))
    }

    /// Sets the seed energy threshold.
    ///
    /// # Errors
    /// See [`Self::new`].
    pub fn set_seed_energy(&mut self, seed_energy: f64) -> Result<(), ConfigError> {
        self.replace_config(self.config.with_seed_energy(seed_energy))
    }

    /// Sets the minimum cluster energy used by the fixed policy.
    ///
    /// # Errors
    /// See [`Self::new`].
    pub fn set_min_energy(&mut self, min_energy: f64) -> Result<(), ConfigError> {
        let mut config = self.config;
        if let ConePolicy::Fixed {
            min_energy: ref mut current,
            ..
        } = config.policy
        {
            *current = min_energy;
        }
        self.replace_config(config)?;
        self.min_energy = min_energy;
        Ok(())
    }

    /// Sets the distance metric used while growing cones.
    pub fn set_metric(&mut self, metric: DistanceMetric) {
        self.config.metric = metric;
    }

    /// Creates reusable per-call state.
    #[must_use]
    pub fn create_state(&self) -> FixedConeState {
        FixedConeState::default()
    }

    /// Runs the cone builder only, without overlap resolution.
    ///
    /// The returned clusters have pairwise disjoint membership.
    pub fn build<H: CalorimeterHit>(&self, hits: &[H], state: &mut FixedConeState) -> Vec<Cluster> {
        let FixedConeConfig {
            seed_energy,
            ref policy,
            metric,
        } = self.config;
        match metric {
            DistanceMetric::DotProduct => {
                build_clusters::<H, DotProduct>(hits, seed_energy, policy, state)
            }
            DistanceMetric::DPhiDCosTheta => {
                build_clusters::<H, DPhiDCosTheta>(hits, seed_energy, policy, state)
            }
            DistanceMetric::DPhiDTheta => {
                build_clusters::<H, DPhiDTheta>(hits, seed_energy, policy, state)
            }
        }
    }

    /// Clusters `hits`: builds cones, then resolves overlapping pairs.
    ///
    /// Cluster members index into `hits`. The result is sorted by energy
    /// before resolution, so the most energetic cluster comes first unless
    /// reassignment changed the ranking.
    pub fn cluster<H: CalorimeterHit>(&self, hits: &[H], state: &mut FixedConeState) -> Vec<Cluster> {
        let mut clusters = self.build(hits, state);
        resolve_overlaps(hits, &mut clusters, &mut state.statistics);
        debug!(
            "{} hits -> {} clusters ({} seeds, {} below cut)",
            hits.len(),
            clusters.len(),
            state.statistics.seeds_tried,
            state.statistics.below_energy_cut
        );
        clusters
    }

    /// Clusters `hits` with a fresh state.
    pub fn cluster_hits<H: CalorimeterHit>(&self, hits: &[H]) -> Vec<Cluster> {
        let mut state = self.create_state();
        self.cluster(hits, &mut state)
    }

    /// Clusters the values of a map keyed by cell id.
    ///
    /// Hits are taken in ascending key order, so the result does not depend
    /// on the map's iteration order. Returns that key order alongside the
    /// clusters, whose members index into it.
    pub fn cluster_map<H: CalorimeterHit>(&self, hits: &HashMap<u64, H>) -> (Vec<u64>, Vec<Cluster>) {
        let mut entries: Vec<(u64, &H)> = hits.iter().map(|(&k, h)| (k, h)).collect();
        entries.sort_unstable_by_key(|&(k, _)| k);
        let (keys, ordered): (Vec<u64>, Vec<&H>) = entries.into_iter().unzip();
        let clusters = self.cluster_hits(&ordered);
        (keys, clusters)
    }

    /// Counters from the last call made with `state`.
    #[must_use]
    pub fn statistics(&self, state: &FixedConeState) -> ClusteringStatistics {
        state.statistics
    }
}

/// Minimum energy carried by a fixed policy, zero for a predicted one.
fn fixed_min_energy(policy: ConePolicy) -> f64 {
    match policy {
        ConePolicy::Fixed { min_energy, .. } => min_energy,
        ConePolicy::Predicted { .. } => 0.0,
    }
}

impl Default for FixedConeClusterer {
    fn default() -> Self {
        let config = FixedConeConfig::default();
        Self {
            min_energy: fixed_min_energy(config.policy),
            config,
        }
    }
}

impl fmt::Display for FixedConeClusterer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedConeClusterer with ")?;
        match self.config.policy {
            ConePolicy::Fixed { radius, min_energy } => write!(
                f,
                "radius {radius} seed energy {} minimum energy {min_energy}",
                self.config.seed_energy
            )?,
            ConePolicy::Predicted {
                cone: [ca, cb],
                cut: [ka, kb],
            } => write!(
                f,
                "radius {ca}*ln(E)+{cb} seed energy {} energy cut {ka}*E+{kb}*E^2",
                self.config.seed_energy
            )?,
        }
        write!(f, " distance metric {}", self.config.metric)
    }
}

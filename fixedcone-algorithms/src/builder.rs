//! Seed-and-grow cone building.

use fixedcone_core::clustering::{Cluster, ClusteringStatistics, ConePolicy};
use fixedcone_core::hit::CalorimeterHit;
use fixedcone_core::FourVector;
use log::{trace, warn};

use crate::metric::{Cone, ConeMetric, Direction};

/// Per-call bookkeeping, reusable across calls to avoid reallocating.
#[derive(Debug, Default)]
pub struct FixedConeState {
    /// Hit indices in descending energy order.
    order: Vec<usize>,
    /// Whether a hit is held by a cluster under construction.
    used: Vec<bool>,
    /// Cached hit directions.
    directions: Vec<Direction>,
    /// Scratch member list of the cone being grown.
    members: Vec<usize>,
    pub(crate) statistics: ClusteringStatistics,
}

impl FixedConeState {
    /// Resets the state for a new set of hits.
    pub(crate) fn prepare<H: CalorimeterHit>(&mut self, hits: &[H]) {
        let n = hits.len();
        self.order.clear();
        self.order.extend(0..n);
        // Ties keep input order so identical input always seeds identically.
        self.order.sort_by(|&a, &b| {
            hits[b]
                .corrected_energy()
                .total_cmp(&hits[a].corrected_energy())
                .then(a.cmp(&b))
        });

        self.used.clear();
        self.used.resize(n, false);

        self.directions.clear();
        self.directions.extend(hits.iter().map(Direction::of_hit));

        self.members.clear();
        self.statistics = ClusteringStatistics {
            hits_processed: n,
            ..ClusteringStatistics::default()
        };
    }

    /// Hit indices in the order they were scanned by the last call.
    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }
}

/// Grows cones around seeds in descending energy order.
///
/// Every later unused hit is tested against the running axis, which is
/// re-centred after each accepted hit. Candidates whose energy does not
/// exceed the cut are dropped and their hits released.
pub(crate) fn build_clusters<H, M>(
    hits: &[H],
    seed_energy: f64,
    policy: &ConePolicy,
    state: &mut FixedConeState,
) -> Vec<Cluster>
where
    H: CalorimeterHit,
    M: ConeMetric,
{
    state.prepare(hits);
    let FixedConeState {
        order,
        used,
        directions,
        members,
        statistics,
    } = state;

    let mut clusters = Vec::new();

    for (position, &seed) in order.iter().enumerate() {
        if used[seed] {
            continue;
        }
        let e_seed = hits[seed].corrected_energy();
        if e_seed.is_nan() || e_seed <= seed_energy {
            continue;
        }

        let radius = policy.radius(e_seed);
        if radius.is_nan() || radius <= 0.0 {
            // Seeds are sorted, so with a monotonic prediction no later seed
            // could get a positive radius either.
            warn!("cone radius {radius} predicted for seed energy {e_seed}, stopping seed scan");
            statistics.aborted_on_radius = true;
            break;
        }
        statistics.seeds_tried += 1;
        let cone = Cone::new(radius);

        used[seed] = true;
        members.clear();
        members.push(seed);
        let mut sum = FourVector::from_hit(&hits[seed]);
        let mut axis = Direction::of_vector(&sum);

        for &candidate in &order[position + 1..] {
            if used[candidate] {
                continue;
            }
            if M::within(&directions[candidate], &axis, &cone) {
                used[candidate] = true;
                members.push(candidate);
                sum = sum + FourVector::from_hit(&hits[candidate]);
                axis = Direction::of_vector(&sum);
            }
        }

        let cut = policy.energy_cut(e_seed);
        if sum.energy > cut {
            trace!(
                "seed {seed} (E={e_seed}): {} hits, E={}, R={radius}",
                members.len(),
                sum.energy
            );
            clusters.push(Cluster {
                members: members.clone(),
                cone_radius: radius,
                vector: sum,
            });
        } else {
            statistics.below_energy_cut += 1;
            for &m in members.iter() {
                used[m] = false;
            }
        }
    }

    statistics.clusters_built = clusters.len();
    clusters
}

//! Event-level helpers: cluster many independent hit collections.

use rayon::prelude::*;

use fixedcone_core::clustering::{Cluster, ClusteringStatistics};
use fixedcone_core::hit::CalorimeterHit;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::FixedConeClusterer;

/// Clusters found in one event together with the call's counters.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusteredEvent {
    /// Clusters; members index into the event's hits.
    pub clusters: Vec<Cluster>,
    /// Counters for this event.
    pub statistics: ClusteringStatistics,
}

/// Clusters one event.
pub fn cluster_event<H: CalorimeterHit>(clusterer: &FixedConeClusterer, hits: &[H]) -> ClusteredEvent {
    let mut state = clusterer.create_state();
    let clusters = clusterer.cluster(hits, &mut state);
    ClusteredEvent {
        clusters,
        statistics: clusterer.statistics(&state),
    }
}

/// Clusters every event in parallel. Each worker owns its own state; the
/// output keeps the input event order.
pub fn cluster_events<H, E>(clusterer: &FixedConeClusterer, events: &[E]) -> Vec<ClusteredEvent>
where
    H: CalorimeterHit,
    E: AsRef<[H]> + Sync,
{
    events
        .par_iter()
        .map_init(
            || clusterer.create_state(),
            |state, event| {
                let clusters = clusterer.cluster(event.as_ref(), state);
                ClusteredEvent {
                    clusters,
                    statistics: clusterer.statistics(state),
                }
            },
        )
        .collect()
}

/// Clusters a stream of events sequentially, reusing one state.
pub fn cluster_event_stream<H, I>(clusterer: &FixedConeClusterer, events: I) -> Vec<ClusteredEvent>
where
    H: CalorimeterHit,
    I: IntoIterator,
    I::Item: AsRef<[H]>,
{
    let mut state = clusterer.create_state();
    events
        .into_iter()
        .map(|event| {
            let clusters = clusterer.cluster(event.as_ref(), &mut state);
            ClusteredEvent {
                clusters,
                statistics: clusterer.statistics(&state),
            }
        })
        .collect()
}

/// Sums the counters of several events.
#[must_use]
pub fn total_statistics(events: &[ClusteredEvent]) -> ClusteringStatistics {
    events
        .iter()
        .fold(ClusteringStatistics::default(), |mut total, event| {
            let s = &event.statistics;
            total.hits_processed += s.hits_processed;
            total.seeds_tried += s.seeds_tried;
            total.below_energy_cut += s.below_energy_cut;
            total.clusters_built += s.clusters_built;
            total.overlapping_pairs += s.overlapping_pairs;
            total.hits_transferred += s.hits_transferred;
            total.clusters_emptied += s.clusters_emptied;
            total.aborted_on_radius |= s.aborted_on_radius;
            total
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixedcone_core::HitData;

    fn events() -> Vec<Vec<HitData>> {
        (0..16)
            .map(|k| {
                let phi = -3.0 + 0.35 * f64::from(k);
                vec![
                    HitData::from_spherical(1000.0, 1.2, phi, 5.0),
                    HitData::from_spherical(1000.0, 1.2, phi + 0.02, 1.0),
                    HitData::from_spherical(1000.0, 2.4, -phi, 2.0),
                ]
            })
            .collect()
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let clusterer = FixedConeClusterer::with_radius(0.1, 0.5, 0.2).unwrap();
        let events = events();
        let parallel = cluster_events::<HitData, _>(&clusterer, &events);
        let sequential = cluster_event_stream::<HitData, _>(&clusterer, &events);
        assert_eq!(parallel, sequential);
        assert_eq!(parallel.len(), 16);
        for event in &parallel {
            assert_eq!(event.clusters.len(), 2);
        }
    }

    #[test]
    fn test_total_statistics() {
        let clusterer = FixedConeClusterer::with_radius(0.1, 0.5, 0.2).unwrap();
        let events = events();
        let results: Vec<ClusteredEvent> = events
            .iter()
            .map(|hits| cluster_event(&clusterer, hits))
            .collect();
        let total = total_statistics(&results);
        assert_eq!(total.hits_processed, 48);
        assert_eq!(total.clusters_built, 32);
        assert!(!total.aborted_on_radius);
    }
}

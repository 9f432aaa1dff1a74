//! Splitting of overlapping clusters.
//!
//! Two clusters overlap when their axes are closer than the sum of their cone
//! radii. Hits are then reassigned to whichever axis is nearer in
//! `dphi^2 + dtheta^2`, with each distance scaled by that cluster's cone size.
//! The axes are not iterated: one reassignment pass per overlapping pair.

use fixedcone_core::clustering::{Cluster, ClusteringStatistics};
use fixedcone_core::hit::CalorimeterHit;
use log::debug;

use crate::metric::Direction;

/// Opening angle between the axes of two clusters.
///
/// NaN if either cluster has no momentum, which never counts as overlap.
#[must_use]
pub fn angular_separation(c1: &Cluster, c2: &Cluster) -> f64 {
    c1.vector.angle_to(&c2.vector)
}

/// Returns true if the cones of `c1` and `c2` overlap.
#[must_use]
pub fn overlaps(c1: &Cluster, c2: &Cluster) -> bool {
    angular_separation(c1, c2) < c1.cone_radius + c2.cone_radius
}

/// Reassigns hits between two overlapping clusters and recomputes both
/// four-vectors. Returns the number of hits moved.
///
/// Both axes are taken before anything moves, and only the hits each cluster
/// held on entry are considered, so a hit moves at most once per call. A hit
/// whose scaled distances are exactly equal stays where it is.
pub fn resolve<H: CalorimeterHit>(hits: &[H], c1: &mut Cluster, c2: &mut Cluster) -> usize {
    let axis1 = Direction::of_vector(&c1.vector);
    let axis2 = Direction::of_vector(&c2.vector);
    let (r1, r2) = (c1.cone_radius, c2.cone_radius);

    let distances = |index: usize| {
        let d = Direction::of_hit(&hits[index]);
        (d.dphi_dtheta_sq(&axis1), d.dphi_dtheta_sq(&axis2))
    };

    let (to_second, keep_first): (Vec<usize>, Vec<usize>) =
        c1.members.iter().copied().partition(|&i| {
            let (d1, d2) = distances(i);
            d2 / d1 < r2 / r1
        });
    let (to_first, keep_second): (Vec<usize>, Vec<usize>) =
        c2.members.iter().copied().partition(|&i| {
            let (d1, d2) = distances(i);
            d1 / d2 < r1 / r2
        });

    if to_second.is_empty() && to_first.is_empty() {
        return 0;
    }
    let moved = to_first.len() + to_second.len();

    c1.members = keep_first;
    c1.members.extend(to_first);
    c2.members = keep_second;
    c2.members.extend(to_second);

    c1.recalculate(hits);
    c2.recalculate(hits);

    moved
}

/// Sorts clusters by descending energy and resolves every overlapping pair
/// in that order. Later pairs see the effect of earlier reassignments.
///
/// Clusters left without hits are removed. All four-vectors are recomputed
/// from the final membership.
pub fn resolve_overlaps<H: CalorimeterHit>(
    hits: &[H],
    clusters: &mut Vec<Cluster>,
    statistics: &mut ClusteringStatistics,
) {
    if clusters.len() < 2 {
        return;
    }

    clusters.sort_by(|a, b| b.energy().total_cmp(&a.energy()));

    let n = clusters.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let (head, tail) = clusters.split_at_mut(j);
            let (c1, c2) = (&mut head[i], &mut tail[0]);
            if overlaps(c1, c2) {
                statistics.overlapping_pairs += 1;
                statistics.hits_transferred += resolve(hits, c1, c2);
            }
        }
    }

    let before = clusters.len();
    clusters.retain(|c| !c.is_empty());
    statistics.clusters_emptied = before - clusters.len();
    for cluster in clusters.iter_mut() {
        cluster.recalculate(hits);
    }

    debug!(
        "resolved {} overlapping pairs, {} hits moved, {} clusters emptied",
        statistics.overlapping_pairs, statistics.hits_transferred, statistics.clusters_emptied
    );
}

//! Derived cluster properties: energy profile, shape and principal axis.
#![allow(clippy::cast_precision_loss)]

use std::collections::BTreeMap;

use nalgebra::{Matrix3, SymmetricEigen, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::clustering::Cluster;
use crate::error::{Error, Result};
use crate::hit::{delta_phi, CalorimeterHit};

/// Properties of a finalized cluster.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterProperties {
    /// Sum of member energies.
    pub energy: f64,
    /// Number of member hits.
    pub size: usize,
    /// Cone radius the cluster was grown with.
    pub cone_radius: f64,
    /// Polar angle of the cluster axis.
    pub theta: f64,
    /// Azimuthal angle of the cluster axis.
    pub phi: f64,
    /// Index of the most energetic member.
    pub hottest_hit: usize,
    /// Energy of the most energetic member.
    pub highest_hit_energy: f64,
    /// Energy-weighted mean position.
    pub energy_weighted_position: [f64; 3],
    /// Energy-weighted second moment of `dtheta^2 + dphi^2` about the axis.
    pub width: f64,
    /// Energy deposited per layer.
    pub layer_energy: BTreeMap<u16, f64>,
    /// Width contribution per layer, normalized by the total energy.
    pub layer_width: BTreeMap<u16, f64>,
    /// Unweighted centroid of the member positions.
    pub centroid: [f64; 3],
    /// Direction cosines of the principal axis, pointing away from the origin.
    pub direction_cosines: [f64; 3],
    /// Polar angle of the principal axis.
    pub itheta: f64,
    /// Azimuthal angle of the principal axis.
    pub iphi: f64,
}

impl ClusterProperties {
    /// Computes the properties of `cluster` from the hits it was built on.
    ///
    /// # Errors
    /// [`Error::EmptyCluster`] if the cluster has no members and
    /// [`Error::MemberOutOfRange`] if a member index does not fit `hits`.
    pub fn calculate<H: CalorimeterHit>(cluster: &Cluster, hits: &[H]) -> Result<Self> {
        if cluster.is_empty() {
            return Err(Error::EmptyCluster);
        }
        if let Some(&index) = cluster.members.iter().find(|&&i| i >= hits.len()) {
            return Err(Error::MemberOutOfRange {
                index,
                len: hits.len(),
            });
        }

        let axis_theta = cluster.vector.theta();
        let axis_phi = cluster.vector.phi();

        let mut energy = 0.0;
        let mut hottest_hit = cluster.members[0];
        let mut highest_hit_energy = f64::NEG_INFINITY;
        let mut weighted_position = Vector3::zeros();
        let mut width = 0.0;
        let mut layer_energy = BTreeMap::new();
        let mut layer_width: BTreeMap<u16, f64> = BTreeMap::new();

        for &index in &cluster.members {
            let hit = &hits[index];
            let e = hit.corrected_energy();
            if e > highest_hit_energy {
                highest_hit_energy = e;
                hottest_hit = index;
            }
            let dtheta = hit.theta() - axis_theta;
            let dphi = delta_phi(hit.phi(), axis_phi);
            let weighted = (dtheta * dtheta + dphi * dphi) * e;

            energy += e;
            width += weighted;
            weighted_position += Vector3::from(hit.position()) * e;
            *layer_energy.entry(hit.layer()).or_insert(0.0) += e;
            *layer_width.entry(hit.layer()).or_insert(0.0) += weighted;
        }

        // Energy-less clusters keep raw sums rather than NaN.
        if energy > 0.0 {
            width /= energy;
            weighted_position /= energy;
            for w in layer_width.values_mut() {
                *w /= energy;
            }
        }

        let (centroid, direction) = principal_axis(cluster, hits);
        let direction = direction.unwrap_or_else(|| {
            cluster
                .vector
                .vec3()
                .try_normalize(0.0)
                .unwrap_or_else(Vector3::zeros)
        });

        Ok(Self {
            energy,
            size: cluster.len(),
            cone_radius: cluster.cone_radius,
            theta: axis_theta,
            phi: axis_phi,
            hottest_hit,
            highest_hit_energy,
            energy_weighted_position: [
                weighted_position.x,
                weighted_position.y,
                weighted_position.z,
            ],
            width,
            layer_energy,
            layer_width,
            centroid: [centroid.x, centroid.y, centroid.z],
            direction_cosines: [direction.x, direction.y, direction.z],
            itheta: direction.z.clamp(-1.0, 1.0).acos(),
            iphi: direction.y.atan2(direction.x),
        })
    }
}

/// Straight-line fit through the member positions.
///
/// Returns the centroid and, for two or more distinct points, the unit
/// eigenvector of the largest covariance eigenvalue oriented away from the
/// origin.
fn principal_axis<H: CalorimeterHit>(
    cluster: &Cluster,
    hits: &[H],
) -> (Vector3<f64>, Option<Vector3<f64>>) {
    let points: Vec<Vector3<f64>> = cluster
        .hits(hits)
        .map(|h| Vector3::from(h.position()))
        .collect();
    let n = points.len() as f64;
    let centroid = points.iter().sum::<Vector3<f64>>() / n;
    if points.len() < 2 {
        return (centroid, None);
    }

    let mut covariance = Matrix3::zeros();
    for p in &points {
        let d = p - centroid;
        covariance += d * d.transpose();
    }
    covariance /= n;

    let eigen = SymmetricEigen::new(covariance);
    let (largest, &value) = eigen
        .eigenvalues
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .unwrap_or((0, &0.0));
    if value <= 0.0 {
        return (centroid, None);
    }

    let mut direction: Vector3<f64> = eigen.eigenvectors.column(largest).into_owned();
    if (centroid + direction).norm() < centroid.norm() {
        direction = -direction;
    }
    (centroid, direction.try_normalize(0.0))
}

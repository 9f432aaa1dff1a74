//! Angular distance metrics for cone membership.
//!
//! Each metric is a zero-sized strategy type; the clusterer picks one per
//! call and the membership test is monomorphized into the growth loop.

use fixedcone_core::hit::{delta_phi, CalorimeterHit};
use fixedcone_core::{DistanceMetric, FourVector};

/// A direction in `(theta, phi)` with its sines and cosines cached.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Direction {
    /// Polar angle.
    pub theta: f64,
    /// Azimuthal angle.
    pub phi: f64,
    sin_theta: f64,
    cos_theta: f64,
    sin_phi: f64,
    cos_phi: f64,
}

impl Direction {
    /// Builds a direction from its angles.
    #[must_use]
    pub fn new(theta: f64, phi: f64) -> Self {
        let (sin_theta, cos_theta) = theta.sin_cos();
        let (sin_phi, cos_phi) = phi.sin_cos();
        Self {
            theta,
            phi,
            sin_theta,
            cos_theta,
            sin_phi,
            cos_phi,
        }
    }

    /// Direction of a hit position.
    pub fn of_hit<H: CalorimeterHit>(hit: &H) -> Self {
        Self::new(hit.theta(), hit.phi())
    }

    /// Direction of a four-vector's 3-momentum.
    #[must_use]
    pub fn of_vector(vector: &FourVector) -> Self {
        Self::new(vector.theta(), vector.phi())
    }

    /// Cosine of the opening angle to `other`.
    #[inline]
    #[must_use]
    pub fn cos_angle(&self, other: &Self) -> f64 {
        self.sin_theta
            * other.sin_theta
            * (self.sin_phi * other.sin_phi + self.cos_phi * other.cos_phi)
            + self.cos_theta * other.cos_theta
    }

    /// `dphi^2 + dtheta^2` to `axis`, with `dphi` wrapped into `[-pi, pi]`.
    #[inline]
    #[must_use]
    pub fn dphi_dtheta_sq(&self, axis: &Self) -> f64 {
        let dphi = delta_phi(self.phi, axis.phi);
        let dtheta = self.theta - axis.theta;
        dphi * dphi + dtheta * dtheta
    }
}

/// Cone radius with the derived thresholds the metrics compare against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cone {
    /// Radius in radians.
    pub radius: f64,
    cos_radius: f64,
    radius_sq: f64,
}

impl Cone {
    /// Creates a cone of the given radius.
    #[must_use]
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            cos_radius: radius.cos(),
            radius_sq: radius * radius,
        }
    }
}

/// Membership test of a hit direction against a cone axis.
pub trait ConeMetric {
    /// Returns true if `hit` lies inside `cone` around `axis`.
    fn within(hit: &Direction, axis: &Direction, cone: &Cone) -> bool;
}

/// Dot product of the unit directions compared with `cos(R)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotProduct;

impl ConeMetric for DotProduct {
    #[inline]
    fn within(hit: &Direction, axis: &Direction, cone: &Cone) -> bool {
        hit.cos_angle(axis) > cone.cos_radius
    }
}

/// `dphi^2 + (cos theta_hit - cos theta_axis)^2 < R^2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DPhiDCosTheta;

impl ConeMetric for DPhiDCosTheta {
    #[inline]
    fn within(hit: &Direction, axis: &Direction, cone: &Cone) -> bool {
        let dphi = delta_phi(hit.phi, axis.phi);
        let dcos = hit.cos_theta - axis.cos_theta;
        dphi * dphi + dcos * dcos < cone.radius_sq
    }
}

/// `dphi^2 + dtheta^2 < R^2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DPhiDTheta;

impl ConeMetric for DPhiDTheta {
    #[inline]
    fn within(hit: &Direction, axis: &Direction, cone: &Cone) -> bool {
        hit.dphi_dtheta_sq(axis) < cone.radius_sq
    }
}

/// Runtime-selected membership test, for callers outside the growth loop.
#[must_use]
pub fn within(metric: DistanceMetric, hit: &Direction, axis: &Direction, radius: f64) -> bool {
    let cone = Cone::new(radius);
    match metric {
        DistanceMetric::DotProduct => DotProduct::within(hit, axis, &cone),
        DistanceMetric::DPhiDCosTheta => DPhiDCosTheta::within(hit, axis, &cone),
        DistanceMetric::DPhiDTheta => DPhiDTheta::within(hit, axis, &cone),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    const METRICS: [DistanceMetric; 3] = [
        DistanceMetric::DotProduct,
        DistanceMetric::DPhiDCosTheta,
        DistanceMetric::DPhiDTheta,
    ];

    #[test]
    fn test_same_direction_is_inside() {
        let d = Direction::new(1.2, -2.5);
        for metric in METRICS {
            assert!(within(metric, &d, &d, 0.01), "{metric} rejected zero distance");
        }
    }

    #[test]
    fn test_outside_cone() {
        let axis = Direction::new(1.0, 0.0);
        let hit = Direction::new(1.0, 0.2);
        for metric in METRICS {
            assert!(!within(metric, &hit, &axis, 0.1), "{metric} accepted 0.2 rad");
        }
    }

    #[test]
    fn test_phi_wraparound() {
        let axis = Direction::new(PI / 2.0, PI - 0.01);
        let hit = Direction::new(PI / 2.0, -PI + 0.01);
        for metric in METRICS {
            assert!(within(metric, &hit, &axis, 0.05), "{metric} missed the wrap");
        }
        assert_relative_eq!(hit.dphi_dtheta_sq(&axis), 0.0004, epsilon = 1e-12);
    }

    #[test]
    fn test_metrics_differ_away_from_equator() {
        // Near the pole a large dphi is a small opening angle.
        let axis = Direction::new(0.05, 0.0);
        let hit = Direction::new(0.05, 1.0);
        assert!(within(DistanceMetric::DotProduct, &hit, &axis, 0.1));
        assert!(!within(DistanceMetric::DPhiDTheta, &hit, &axis, 0.1));
        assert!(!within(DistanceMetric::DPhiDCosTheta, &hit, &axis, 0.1));
    }

    #[test]
    fn test_cos_angle_matches_vectors() {
        let a = Direction::new(0.8, 0.3);
        let b = Direction::new(1.1, -0.4);
        let va = FourVector::new(
            a.theta.sin() * a.phi.cos(),
            a.theta.sin() * a.phi.sin(),
            a.theta.cos(),
            1.0,
        );
        let vb = FourVector::new(
            b.theta.sin() * b.phi.cos(),
            b.theta.sin() * b.phi.sin(),
            b.theta.cos(),
            1.0,
        );
        assert_relative_eq!(a.cos_angle(&b), va.angle_to(&vb).cos(), epsilon = 1e-12);
    }
}

//! Energy four-vectors for cluster axes.
//!
//! Each hit contributes its energy and a 3-momentum of the same magnitude
//! pointing along its position. Cluster axes are sums of these contributions
//! and are always rebuilt from the member hits rather than patched in place.

use std::iter::Sum;
use std::ops::Add;

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::hit::CalorimeterHit;

/// Massless energy four-vector `(px, py, pz, E)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FourVector {
    /// 3-momentum.
    pub momentum: [f64; 3],
    /// Energy.
    pub energy: f64,
}

impl FourVector {
    /// Creates a four-vector from its components.
    #[inline]
    #[must_use]
    pub fn new(px: f64, py: f64, pz: f64, energy: f64) -> Self {
        Self {
            momentum: [px, py, pz],
            energy,
        }
    }

    /// Contribution of a single hit: `E` and `E * unit(position)`.
    ///
    /// A hit at the origin has no direction and contributes energy only.
    #[must_use]
    pub fn from_hit<H: CalorimeterHit + ?Sized>(hit: &H) -> Self {
        let energy = hit.corrected_energy();
        let position = Vector3::from(hit.position());
        let p = match position.try_normalize(0.0) {
            Some(unit) => unit * energy,
            None => Vector3::zeros(),
        };
        Self {
            momentum: [p.x, p.y, p.z],
            energy,
        }
    }

    /// Sums the contributions of the hits selected by `members`.
    pub fn from_members<H: CalorimeterHit>(hits: &[H], members: &[usize]) -> Self {
        members.iter().map(|&i| Self::from_hit(&hits[i])).sum()
    }

    /// 3-momentum as a vector.
    #[inline]
    #[must_use]
    pub fn vec3(&self) -> Vector3<f64> {
        Vector3::from(self.momentum)
    }

    /// Magnitude of the 3-momentum.
    #[inline]
    #[must_use]
    pub fn p(&self) -> f64 {
        self.vec3().norm()
    }

    /// Azimuthal angle of the 3-momentum.
    #[inline]
    #[must_use]
    pub fn phi(&self) -> f64 {
        self.momentum[1].atan2(self.momentum[0])
    }

    /// Polar angle of the 3-momentum.
    #[inline]
    #[must_use]
    pub fn theta(&self) -> f64 {
        let [px, py, pz] = self.momentum;
        px.hypot(py).atan2(pz)
    }

    /// Dot product of the 3-momenta.
    #[inline]
    #[must_use]
    pub fn vec3_dot(&self, other: &Self) -> f64 {
        self.vec3().dot(&other.vec3())
    }

    /// Opening angle between the two 3-momenta, in `[0, pi]`.
    ///
    /// Returns NaN if either vector has zero momentum.
    #[must_use]
    pub fn angle_to(&self, other: &Self) -> f64 {
        let cos = self.vec3_dot(other) / (self.p() * other.p());
        cos.clamp(-1.0, 1.0).acos()
    }
}

impl Add for FourVector {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        let [ax, ay, az] = self.momentum;
        let [bx, by, bz] = rhs.momentum;
        Self::new(ax + bx, ay + by, az + bz, self.energy + rhs.energy)
    }
}

impl Sum for FourVector {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::HitData;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_from_hit_scales_direction() {
        let hit = HitData::new([3.0, 0.0, 4.0], 10.0);
        let v = FourVector::from_hit(&hit);
        assert_relative_eq!(v.energy, 10.0);
        assert_relative_eq!(v.momentum[0], 6.0, epsilon = 1e-12);
        assert_relative_eq!(v.momentum[2], 8.0, epsilon = 1e-12);
        assert_relative_eq!(v.p(), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_origin_hit_has_no_direction() {
        let v = FourVector::from_hit(&HitData::new([0.0, 0.0, 0.0], 2.0));
        assert_relative_eq!(v.energy, 2.0);
        assert_relative_eq!(v.p(), 0.0);
    }

    #[test]
    fn test_sum_and_axis() {
        let hits = [
            HitData::from_spherical(1000.0, FRAC_PI_2, 0.1, 1.0),
            HitData::from_spherical(2000.0, FRAC_PI_2, -0.1, 1.0),
        ];
        let v = FourVector::from_members(&hits, &[0, 1]);
        assert_relative_eq!(v.energy, 2.0);
        assert_relative_eq!(v.phi(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.theta(), FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_angle_between() {
        let a = FourVector::new(1.0, 0.0, 0.0, 1.0);
        let b = FourVector::new(0.0, 2.0, 0.0, 2.0);
        assert_relative_eq!(a.angle_to(&b), FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(a.angle_to(&a), 0.0);
        assert!(a.angle_to(&FourVector::default()).is_nan());
    }
}

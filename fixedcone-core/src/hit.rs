//! Hit traits and types for calorimeter data.

use std::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const TWO_PI: f64 = 2.0 * PI;

/// Wraps an azimuthal difference into `[-pi, pi]`.
#[inline]
#[must_use]
pub fn delta_phi(phi: f64, reference: f64) -> f64 {
    let mut dphi = phi - reference;
    if dphi < -PI {
        dphi += TWO_PI;
    }
    if dphi > PI {
        dphi -= TWO_PI;
    }
    dphi
}

/// Core data structure for a single calorimeter hit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HitData {
    /// Cartesian position in the detector frame.
    pub position: [f64; 3],
    /// Energy after sampling-fraction correction (GeV).
    pub energy: f64,
    /// Readout channel identifier.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cell_id: u64,
    /// Readout layer.
    #[cfg_attr(feature = "serde", serde(default))]
    pub layer: u16,
}

impl HitData {
    /// Creates a hit at a Cartesian position.
    #[inline]
    #[must_use]
    pub fn new(position: [f64; 3], energy: f64) -> Self {
        Self {
            position,
            energy,
            cell_id: 0,
            layer: 0,
        }
    }

    /// Creates a hit at distance `r` along the direction `(theta, phi)`.
    #[must_use]
    pub fn from_spherical(r: f64, theta: f64, phi: f64, energy: f64) -> Self {
        let (st, ct) = theta.sin_cos();
        let (sp, cp) = phi.sin_cos();
        Self::new([r * st * cp, r * st * sp, r * ct], energy)
    }

    /// Sets the channel identifier.
    #[must_use]
    pub fn with_cell_id(mut self, cell_id: u64) -> Self {
        self.cell_id = cell_id;
        self
    }

    /// Sets the readout layer.
    #[must_use]
    pub fn with_layer(mut self, layer: u16) -> Self {
        self.layer = layer;
        self
    }
}

/// Trait for calorimeter hits.
///
/// The clustering only needs a position and a corrected energy; the
/// identifiers are carried through for cluster properties and output.
pub trait CalorimeterHit: Send + Sync {
    /// Returns the Cartesian position of the hit.
    fn position(&self) -> [f64; 3];

    /// Returns the sampling-fraction corrected energy.
    fn corrected_energy(&self) -> f64;

    /// Returns the readout channel identifier.
    #[inline]
    fn cell_id(&self) -> u64 {
        0
    }

    /// Returns the readout layer.
    #[inline]
    fn layer(&self) -> u16 {
        0
    }

    /// Azimuthal angle in `[-pi, pi]`.
    #[inline]
    fn phi(&self) -> f64 {
        let [x, y, _] = self.position();
        y.atan2(x)
    }

    /// Polar angle in `[0, pi]`.
    #[inline]
    fn theta(&self) -> f64 {
        let [x, y, z] = self.position();
        x.hypot(y).atan2(z)
    }
}

impl CalorimeterHit for HitData {
    #[inline]
    fn position(&self) -> [f64; 3] {
        self.position
    }

    #[inline]
    fn corrected_energy(&self) -> f64 {
        self.energy
    }

    #[inline]
    fn cell_id(&self) -> u64 {
        self.cell_id
    }

    #[inline]
    fn layer(&self) -> u16 {
        self.layer
    }
}

impl<H: CalorimeterHit> CalorimeterHit for &H {
    #[inline]
    fn position(&self) -> [f64; 3] {
        (**self).position()
    }

    #[inline]
    fn corrected_energy(&self) -> f64 {
        (**self).corrected_energy()
    }

    #[inline]
    fn cell_id(&self) -> u64 {
        (**self).cell_id()
    }

    #[inline]
    fn layer(&self) -> u16 {
        (**self).layer()
    }
}

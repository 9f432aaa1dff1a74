//! fixedcone-core: Core traits and types for fixed-cone calorimeter clustering.
//!
//! This crate provides the foundational abstractions shared by the
//! clustering algorithms: calorimeter hits, energy four-vectors, clusters,
//! configuration and derived cluster properties.
//!

pub mod clustering;
pub mod error;
pub mod fourvec;
pub mod hit;
pub mod properties;

pub use clustering::{Cluster, ClusteringStatistics, ConePolicy, DistanceMetric, FixedConeConfig};
pub use error::{ConfigError, Error, Result};
pub use fourvec::FourVector;
pub use hit::{delta_phi, CalorimeterHit, HitData};
pub use properties::ClusterProperties;

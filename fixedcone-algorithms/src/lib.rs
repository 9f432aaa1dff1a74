//! fixedcone-algorithms: Fixed-cone clustering of calorimeter hits.
//!
//! This crate provides the two stages of the cone algorithm:
//! - **Cone building** - seeds in descending energy, axis re-centred after each hit
//! - **Overlap resolution** - hits in overlapping cones go to the nearer axis
//!
//! plus the distance metrics they share and event-level helpers.
//!
#![warn(missing_docs)]

mod builder;
mod fixed_cone;
pub mod metric;
mod processing;
mod resolve;

pub use builder::FixedConeState;
pub use fixed_cone::FixedConeClusterer;
pub use metric::{ConeMetric, Direction};
pub use processing::{
    cluster_event, cluster_event_stream, cluster_events, total_statistics, ClusteredEvent,
};
pub use resolve::{angular_separation, overlaps, resolve, resolve_overlaps};

// Re-export core clustering types
pub use fixedcone_core::clustering::{
    Cluster, ClusteringStatistics, ConePolicy, DistanceMetric, FixedConeConfig,
};

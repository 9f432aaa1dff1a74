//! Error types for fixedcone-core.

use thiserror::Error;

/// Result type alias for fixedcone operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for fixedcone operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid clustering configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Cluster has no member hits.
    #[error("cannot compute properties of empty cluster")]
    EmptyCluster,

    /// Cluster refers to a hit outside the supplied slice.
    #[error("cluster member index {index} out of range for {len} hits")]
    MemberOutOfRange { index: usize, len: usize },
}

/// Configuration errors, reported before any clustering happens.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Fixed cone radius outside `(0, pi)`.
    #[error("cone radius must be in (0, pi) radians, got {0}")]
    InvalidConeRadius(f64),

    /// A threshold or calibration constant is NaN or infinite.
    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },
}

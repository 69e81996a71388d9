//! Error types for cluster index construction, queries and mutations.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClusterError>;

/// Errors returned by [`ClusterIndex`](crate::ClusterIndex) and its builder.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClusterError {
    /// The builder was finished without an identity accessor.
    #[error("The id access function (get_id) must be provided")]
    MissingIdAccessor,

    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The value cannot be decoded into a cluster origin.
    #[error("Invalid cluster id: {0}")]
    InvalidClusterId(i64),

    /// No cluster exists for the given id.
    #[error("No cluster with the specified id: {cluster_id}")]
    NotFound { cluster_id: i64 },

    /// No point carries the given external identity.
    #[error("No point with the specified id: {0}")]
    PointNotFound(i64),

    /// Malformed caller input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationErrorWithContext(String),
}

impl From<serde_json::Error> for ClusterError {
    fn from(err: serde_json::Error) -> Self {
        ClusterError::SerializationErrorWithContext(err.to_string())
    }
}

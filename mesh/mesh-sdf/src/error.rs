//! Error types for SDF operations.

use mesh_types::Dimension;
use thiserror::Error;

/// Result type for SDF operations.
pub type SdfResult<T> = Result<T, SdfError>;

/// Errors that can occur during SDF computation.
///
/// Only construction-time contract violations and out-of-range lookups are
/// errors. Geometric degeneracies and search exhaustion are absorbed and
/// logged.
#[derive(Debug, Error)]
pub enum SdfError {
    /// The surface has no usable primitives.
    #[error("surface has no usable primitives")]
    EmptySurface,

    /// Configuration values are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Surface and query mesh have different dimensions.
    #[error("dimension mismatch: surface is {surface}, query mesh is {mesh}")]
    DimensionMismatch {
        /// Dimension of the surface.
        surface: Dimension,
        /// Dimension of the query mesh.
        mesh: Dimension,
    },

    /// An index does not refer to an existing entry.
    #[error("{what} index {index} is out of range (len {len})")]
    IndexOutOfRange {
        /// What kind of entry was looked up.
        what: &'static str,
        /// The offending index.
        index: usize,
        /// Number of entries available.
        len: usize,
    },

    /// Writing diagnostic output failed.
    #[error("export failed: {0}")]
    Io(#[from] std::io::Error),
}

impl SdfError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(details: impl Into<String>) -> Self {
        Self::InvalidConfig(details.into())
    }

    /// Create an index out of range error.
    #[must_use]
    pub const fn out_of_range(what: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { what, index, len }
    }
}

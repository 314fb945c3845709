//! Configuration for signed distance computation.
//!
//! [`SdfConfig`] controls the candidate search, numerical tolerance, axis
//! voting and flood-fill limits.
//!
//! # Presets
//!
//! - [`SdfConfig::default()`] - One search ring, tolerance 0.01
//! - [`SdfConfig::precise()`] - Tight tolerance and deeper search
//! - [`SdfConfig::coarse()`] - Loose tolerance for noisy or large-scale input
//!
//! # Example
//!
//! ```
//! use mesh_sdf::SdfConfig;
//!
//! let config = SdfConfig::default()
//!     .with_candidate_search_depth(3)
//!     .with_candidate_search_epsilon(1e-3)
//!     .with_verbose(true);
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{SdfError, SdfResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the raycast / sweep / flood-fill pipeline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SdfConfig {
    /// Number of expansion rings the sweep tries before accepting a
    /// best-effort distance. Must be at least 1.
    pub candidate_search_depth: u32,

    /// Tolerance for ray-edge degeneracy detection, for "on the surface"
    /// detection along a ray, and slack for sweep termination.
    pub candidate_search_epsilon: f64,

    /// Emit one diagnostic record per query point.
    pub verbose: bool,

    /// Number of confident axes that must agree before a point is labeled
    /// inside or outside. Clamped to the number of axes.
    pub min_agreeing_axes: usize,

    /// Settle an axis whose ray grazes an edge or vertex with the half-open
    /// edge-ownership rule instead of letting it abstain. When off, such
    /// axes vote unsure and the flood fill decides.
    pub resolve_grazing_rays: bool,

    /// Round cap for the flood fill of one connected component.
    pub max_flood_fill_iterations: usize,

    /// Value written for points on the surface. `None` writes zero.
    pub surface_value: Option<f64>,

    /// Whether to use parallel processing (via rayon).
    pub parallel: bool,
}

impl Default for SdfConfig {
    fn default() -> Self {
        Self {
            candidate_search_depth: 1,
            candidate_search_epsilon: 0.01,
            verbose: false,
            min_agreeing_axes: 2,
            resolve_grazing_rays: true,
            max_flood_fill_iterations: 1000,
            surface_value: None,
            parallel: true,
        }
    }
}

impl SdfConfig {
    /// Tight tolerance and a deeper search.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_sdf::SdfConfig;
    ///
    /// let config = SdfConfig::precise();
    /// assert!(config.candidate_search_epsilon < SdfConfig::default().candidate_search_epsilon);
    /// ```
    #[must_use]
    pub fn precise() -> Self {
        Self {
            candidate_search_depth: 4,
            candidate_search_epsilon: 1e-6,
            ..Self::default()
        }
    }

    /// Loose tolerance for noisy or large-scale input.
    #[must_use]
    pub fn coarse() -> Self {
        Self {
            candidate_search_depth: 1,
            candidate_search_epsilon: 0.1,
            ..Self::default()
        }
    }

    /// Set the candidate search depth (clamped to at least 1).
    #[must_use]
    pub fn with_candidate_search_depth(mut self, depth: u32) -> Self {
        self.candidate_search_depth = depth.max(1);
        self
    }

    /// Set the candidate search epsilon.
    #[must_use]
    pub fn with_candidate_search_epsilon(mut self, epsilon: f64) -> Self {
        self.candidate_search_epsilon = epsilon.abs();
        self
    }

    /// Enable or disable per-point diagnostic records.
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set how many confident axes must agree.
    #[must_use]
    pub fn with_min_agreeing_axes(mut self, axes: usize) -> Self {
        self.min_agreeing_axes = axes.max(1);
        self
    }

    /// Enable or disable edge-ownership resolution of grazing rays.
    #[must_use]
    pub const fn with_resolve_grazing_rays(mut self, resolve: bool) -> Self {
        self.resolve_grazing_rays = resolve;
        self
    }

    /// Set the flood-fill round cap.
    #[must_use]
    pub const fn with_max_flood_fill_iterations(mut self, iterations: usize) -> Self {
        self.max_flood_fill_iterations = iterations;
        self
    }

    /// Write `value` instead of zero for points on the surface.
    ///
    /// A small signed value avoids exact zero crossings downstream.
    #[must_use]
    pub const fn with_surface_value(mut self, value: Option<f64>) -> Self {
        self.surface_value = value;
        self
    }

    /// Enable or disable parallel processing.
    ///
    /// Results are identical either way.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check that all values are usable.
    ///
    /// # Errors
    ///
    /// Returns [`SdfError::InvalidConfig`] if the search depth is zero, the
    /// epsilon is not a positive finite number, the agreeing-axes threshold
    /// is zero, or the surface value is not finite.
    pub fn validate(&self) -> SdfResult<()> {
        if self.candidate_search_depth == 0 {
            return Err(SdfError::invalid_config(
                "candidate_search_depth must be at least 1",
            ));
        }
        if !(self.candidate_search_epsilon.is_finite() && self.candidate_search_epsilon > 0.0) {
            return Err(SdfError::invalid_config(format!(
                "candidate_search_epsilon must be positive and finite, got {}",
                self.candidate_search_epsilon
            )));
        }
        if self.min_agreeing_axes == 0 {
            return Err(SdfError::invalid_config(
                "min_agreeing_axes must be at least 1",
            ));
        }
        if let Some(v) = self.surface_value {
            if !v.is_finite() {
                return Err(SdfError::invalid_config(format!(
                    "surface_value must be finite, got {v}"
                )));
            }
        }
        Ok(())
    }
}

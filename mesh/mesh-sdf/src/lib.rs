//! Raycast inside/outside classification and signed distance fields.
//!
//! Given an explicit surface (triangles in 3D, closed segment loops in 2D)
//! and a set of query nodes, this crate labels every node inside, outside or
//! on the surface and computes its distance to the nearest primitive.
//!
//! # Pipeline
//!
//! 1. **Bounding data and index**: per-primitive boxes and a binned
//!    candidate index, built once by [`SdfCore::new`]
//! 2. **Raycast**: axis-aligned rays per node, crossing parity per axis
//!    (rays through shared edges settled by edge ownership), axes combined
//!    into a label or "unsure"
//! 3. **Sweep**: ring search for the true nearest primitive
//! 4. **Flood fill**: unsure nodes take the majority label of their mesh
//!    neighbors; leftovers become outside
//!
//! Each phase returns its own output struct ([`RaycastPhase`],
//! [`SweepPhase`], [`FloodFillReport`]) and can be run on its own.
//!
//! # Example
//!
//! ```
//! use mesh_sdf::{PointClass, SdfCore};
//! use mesh_types::{BackgroundMesh, Point3, unit_cube};
//!
//! let core = SdfCore::with_defaults(&unit_cube()).unwrap();
//! let grid = BackgroundMesh::grid_3d(
//!     Point3::new(-0.25, -0.25, -0.25),
//!     Point3::new(1.25, 1.25, 1.25),
//!     [6, 6, 6],
//! );
//!
//! let field = core.calculate_raycast_and_sdf(&grid).unwrap();
//! assert_eq!(field.len(), 343);
//!
//! // Node 171 sits at the cube centroid.
//! assert_eq!(field.class(171).unwrap(), PointClass::Inside);
//! assert!((field.value(171).unwrap() + 0.5).abs() < 1e-9);
//!
//! // Grid corners are outside.
//! assert_eq!(field.class(0).unwrap(), PointClass::Outside);
//! ```
//!
//! # Sign convention
//!
//! Negative inside, positive outside, zero (or
//! [`SdfConfig::surface_value`]) on the surface. A node the engine cannot
//! decide is reported outside.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod config;
mod core;
mod data;
mod error;
mod export;
mod flood_fill;
mod geometry_field;
mod index;
mod query;
mod raycast;
mod result;
mod sweep;

pub use crate::core::SdfCore;
pub use config::SdfConfig;
pub use data::BoundingData;
pub use error::{SdfError, SdfResult};
pub use export::{write_debug_dump, write_unsure_vtk, write_vtk};
pub use flood_fill::FloodFillReport;
pub use geometry_field::GeometryField;
pub use index::CandidateIndex;
pub use query::{
    AxisHit, axis_ray_hit, axis_ray_owned_hit, closest_point_on_triangle,
    point_segment_distance_squared, primitive_distance_squared,
};
pub use raycast::{
    AxisRay, AxisVote, PointClass, PointRaycast, RaycastPhase, cast_axis, combine_votes,
    resolve_grazing,
};
pub use result::{RaycastResult, SignedField};
pub use sweep::{PointSweep, SweepPhase, SweepStatus, sweep_point};

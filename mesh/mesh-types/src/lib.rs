//! Surface and query-mesh types for signed distance computation.
//!
//! This crate provides the collaborator types that the `mesh-sdf` engine
//! reads from:
//!
//! - [`IndexedMesh`] - A closed triangle surface in 3D
//! - [`Polyline`] - A closed segment loop surface in 2D
//! - [`Primitive`] - A single triangle or segment with resolved positions
//! - [`Aabb`] - Axis-aligned bounding box
//! - [`BackgroundMesh`] - The query points (nodes) and their element connectivity
//!
//! The engine only talks to these through the [`PrimitiveStore`] and
//! [`NodeMesh`] traits, so other representations can be plugged in.
//!
//! # Units
//!
//! This library is **unit-agnostic**. All coordinates are `f64`.
//! 2D data lives in the `z = 0` plane of a 3D point.
//!
//! # Winding
//!
//! Triangle faces are **counter-clockwise (CCW) when viewed from outside**.
//! The inside/outside classification does not depend on winding; it is only
//! used when normals are requested.
//!
//! # Example
//!
//! ```
//! use mesh_types::{unit_cube, BackgroundMesh, NodeMesh, Point3, PrimitiveStore};
//!
//! let cube = unit_cube();
//! assert_eq!(cube.primitive_count(), 12);
//!
//! let grid = BackgroundMesh::grid_3d(
//!     Point3::new(-0.5, -0.5, -0.5),
//!     Point3::new(1.5, 1.5, 1.5),
//!     [4, 4, 4],
//! );
//! assert_eq!(grid.node_count(), 125);
//! assert_eq!(grid.element_count(), 64);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod background;
mod bounds;
mod mesh;
mod polyline;
mod primitive;
mod traits;
mod triangle;
mod vertex;

pub use background::BackgroundMesh;
pub use bounds::Aabb;
pub use mesh::{unit_cube, IndexedMesh};
pub use polyline::{unit_square, Polyline};
pub use primitive::{Dimension, Primitive, Segment};
pub use traits::{NodeMesh, PrimitiveStore};
pub use triangle::Triangle;
pub use vertex::{Node, Vertex};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector3};

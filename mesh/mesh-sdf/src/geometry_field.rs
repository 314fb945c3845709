//! Level-set fields over query nodes.
//!
//! A [`GeometryField`] gives a scalar value per node that is negative on
//! one side of a geometry and positive on the other. Analytic planes and
//! fields sampled from a surface share one evaluation entry point.
//!
//! # Example
//!
//! ```
//! use mesh_sdf::GeometryField;
//! use mesh_types::Point3;
//! use nalgebra::Vector3;
//!
//! let plane = GeometryField::plane(Point3::new(0.0, 0.0, 1.0), Vector3::new(0.0, 0.0, 2.0)).unwrap();
//! let value = plane.evaluate(0, &Point3::new(5.0, -3.0, 4.0)).unwrap();
//! assert!((value - 3.0).abs() < 1e-12);
//! ```

use mesh_types::{Dimension, Point2, Point3};
use nalgebra::{Vector2, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{SdfError, SdfResult};
use crate::result::SignedField;

/// Scalar field evaluated at query nodes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GeometryField {
    /// Half-space boundary: value `n · (x - c)` with unit normal `n`.
    Plane {
        /// A point on the plane.
        center: Point3<f64>,
        /// Unit normal; the positive side is the one it points to.
        normal: Vector3<f64>,
        /// In 2D the plane is a line in the `z = 0` plane.
        dimension: Dimension,
    },
    /// Signed distances computed for a specific query mesh, looked up by
    /// node index.
    Sampled(SignedField),
}

impl GeometryField {
    /// Plane through `center` with normal direction `normal`.
    ///
    /// The normal is normalized so the value is a true signed distance.
    ///
    /// # Errors
    ///
    /// Returns [`SdfError::InvalidConfig`] if `normal` is (near) zero or not
    /// finite.
    pub fn plane(center: Point3<f64>, normal: Vector3<f64>) -> SdfResult<Self> {
        let normal = unit(normal)?;
        Ok(Self::Plane {
            center,
            normal,
            dimension: Dimension::Three,
        })
    }

    /// Line through `center` with normal direction `normal`, in the plane.
    ///
    /// # Errors
    ///
    /// Returns [`SdfError::InvalidConfig`] if `normal` is (near) zero or not
    /// finite.
    pub fn line(center: Point2<f64>, normal: Vector2<f64>) -> SdfResult<Self> {
        let normal = unit(Vector3::new(normal.x, normal.y, 0.0))?;
        Ok(Self::Plane {
            center: Point3::new(center.x, center.y, 0.0),
            normal,
            dimension: Dimension::Two,
        })
    }

    /// Dimension the field is defined in, if it has one of its own.
    #[must_use]
    pub fn dimension(&self) -> Option<Dimension> {
        match self {
            Self::Plane { dimension, .. } => Some(*dimension),
            Self::Sampled(_) => None,
        }
    }

    /// Field value at a node.
    ///
    /// Planes use `coordinates`; sampled fields use `node`.
    ///
    /// # Errors
    ///
    /// Returns [`SdfError::IndexOutOfRange`] if a sampled field has no entry
    /// for `node`.
    pub fn evaluate(&self, node: usize, coordinates: &Point3<f64>) -> SdfResult<f64> {
        match self {
            Self::Plane {
                center,
                normal,
                dimension,
            } => {
                let x = match dimension {
                    Dimension::Two => Point3::new(coordinates.x, coordinates.y, 0.0),
                    Dimension::Three => *coordinates,
                };
                Ok(normal.dot(&(x - center)))
            }
            Self::Sampled(field) => field.value(node),
        }
    }

    /// Derivative of the value with respect to the node coordinates.
    ///
    /// For a plane this is its normal. Sampled fields carry no gradient and
    /// return `None`.
    #[must_use]
    pub fn coordinate_gradient(&self) -> Option<Vector3<f64>> {
        match self {
            Self::Plane { normal, .. } => Some(*normal),
            Self::Sampled(_) => None,
        }
    }
}

impl From<SignedField> for GeometryField {
    fn from(field: SignedField) -> Self {
        Self::Sampled(field)
    }
}

fn unit(v: Vector3<f64>) -> SdfResult<Vector3<f64>> {
    let len = v.norm();
    if !len.is_finite() || len <= f64::EPSILON {
        return Err(SdfError::invalid_config(format!(
            "plane normal must be non-zero and finite, got [{}, {}, {}]",
            v.x, v.y, v.z
        )));
    }
    Ok(v / len)
}

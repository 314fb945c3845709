//! Background (query) mesh: nodes plus element connectivity.

use crate::{Dimension, Node, NodeMesh};
use nalgebra::{Point2, Point3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The mesh whose nodes are classified against a surface.
///
/// Elements are lists of node indices; any two nodes of an element are
/// neighbors for sign propagation. Element shapes are not interpreted.
///
/// # Example
///
/// ```
/// use mesh_types::{BackgroundMesh, Dimension, Node, NodeMesh, Point3};
///
/// let mesh = BackgroundMesh::from_parts(
///     Dimension::Three,
///     vec![
///         Node::new(1, Point3::new(0.0, 0.0, 0.0)),
///         Node::new(2, Point3::new(1.0, 0.0, 0.0)),
///     ],
///     vec![vec![0, 1]],
/// );
/// assert_eq!(mesh.node_count(), 2);
/// assert_eq!(mesh.element(0), Some(&[0, 1][..]));
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BackgroundMesh {
    /// Dimension of the node coordinates.
    pub dimension: Dimension,
    /// Query points.
    pub nodes: Vec<Node>,
    /// Elements as lists of node indices.
    pub elements: Vec<Vec<u32>>,
}

impl BackgroundMesh {
    /// Create a mesh from its parts.
    #[must_use]
    pub const fn from_parts(dimension: Dimension, nodes: Vec<Node>, elements: Vec<Vec<u32>>) -> Self {
        Self {
            dimension,
            nodes,
            elements,
        }
    }

    /// Create a mesh of isolated points (no elements).
    ///
    /// Node ids are assigned as `index + 1`.
    #[must_use]
    pub fn from_points(dimension: Dimension, points: &[Point3<f64>]) -> Self {
        let nodes = points
            .iter()
            .zip(1_u64..)
            .map(|(p, id)| Node::new(id, *p))
            .collect();
        Self::from_parts(dimension, nodes, Vec::new())
    }

    /// Structured hexahedral grid spanning `min..=max` with `cells` cells per axis.
    ///
    /// Nodes are numbered x-fastest; ids are `index + 1`. Each element lists
    /// its eight corners in the usual hex ordering (bottom face CCW, then top).
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{BackgroundMesh, NodeMesh, Point3};
    ///
    /// let grid = BackgroundMesh::grid_3d(Point3::origin(), Point3::new(1.0, 1.0, 1.0), [2, 2, 2]);
    /// assert_eq!(grid.node_count(), 27);
    /// assert_eq!(grid.element_count(), 8);
    /// assert!((grid.nodes[13].position.x - 0.5).abs() < 1e-12);
    /// ```
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn grid_3d(min: Point3<f64>, max: Point3<f64>, cells: [usize; 3]) -> Self {
        let [nx, ny, nz] = cells.map(|c| c.max(1));
        let step = (max - min).component_div(&nalgebra::Vector3::new(nx as f64, ny as f64, nz as f64));

        let mut nodes = Vec::with_capacity((nx + 1) * (ny + 1) * (nz + 1));
        for k in 0..=nz {
            for j in 0..=ny {
                for i in 0..=nx {
                    let p = Point3::new(
                        (i as f64).mul_add(step.x, min.x),
                        (j as f64).mul_add(step.y, min.y),
                        (k as f64).mul_add(step.z, min.z),
                    );
                    nodes.push(Node::new(nodes.len() as u64 + 1, p));
                }
            }
        }

        let at = |i: usize, j: usize, k: usize| (i + (nx + 1) * (j + (ny + 1) * k)) as u32;
        let mut elements = Vec::with_capacity(nx * ny * nz);
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    elements.push(vec![
                        at(i, j, k),
                        at(i + 1, j, k),
                        at(i + 1, j + 1, k),
                        at(i, j + 1, k),
                        at(i, j, k + 1),
                        at(i + 1, j, k + 1),
                        at(i + 1, j + 1, k + 1),
                        at(i, j + 1, k + 1),
                    ]);
                }
            }
        }

        Self::from_parts(Dimension::Three, nodes, elements)
    }

    /// Structured quadrilateral grid in the `z = 0` plane.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{BackgroundMesh, NodeMesh, Point2};
    ///
    /// let grid = BackgroundMesh::grid_2d(Point2::new(0.0, 0.0), Point2::new(2.0, 1.0), [4, 2]);
    /// assert_eq!(grid.node_count(), 15);
    /// assert_eq!(grid.element_count(), 8);
    /// ```
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn grid_2d(min: Point2<f64>, max: Point2<f64>, cells: [usize; 2]) -> Self {
        let [nx, ny] = cells.map(|c| c.max(1));
        let dx = (max.x - min.x) / nx as f64;
        let dy = (max.y - min.y) / ny as f64;

        let mut nodes = Vec::with_capacity((nx + 1) * (ny + 1));
        for j in 0..=ny {
            for i in 0..=nx {
                let p = Point3::new((i as f64).mul_add(dx, min.x), (j as f64).mul_add(dy, min.y), 0.0);
                nodes.push(Node::new(nodes.len() as u64 + 1, p));
            }
        }

        let at = |i: usize, j: usize| (i + (nx + 1) * j) as u32;
        let mut elements = Vec::with_capacity(nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                elements.push(vec![at(i, j), at(i + 1, j), at(i + 1, j + 1), at(i, j + 1)]);
            }
        }

        Self::from_parts(Dimension::Two, nodes, elements)
    }
}

impl NodeMesh for BackgroundMesh {
    fn dimension(&self) -> Dimension {
        self.dimension
    }

    #[inline]
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    #[inline]
    fn element_count(&self) -> usize {
        self.elements.len()
    }

    fn element(&self, index: usize) -> Option<&[u32]> {
        self.elements.get(index).map(Vec::as_slice)
    }

    fn elements(&self) -> impl Iterator<Item = &[u32]> {
        self.elements.iter().map(Vec::as_slice)
    }
}

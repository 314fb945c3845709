//! Output of a classification pass.

use mesh_types::NodeMesh;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{SdfError, SdfResult};
use crate::raycast::PointClass;
use crate::sweep::SweepStatus;

/// Final inside/outside labels and element lists.
///
/// Produced by [`SdfCore::calculate_raycast`](crate::SdfCore::calculate_raycast)
/// and embedded in every [`SignedField`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RaycastResult {
    classes: Vec<PointClass>,
    unsure_before_fill: Vec<u32>,
    elements_at_surface: Vec<u32>,
    elements_in_volume: Vec<u32>,
}

impl RaycastResult {
    /// Assemble labels and derive the element lists from `mesh`.
    ///
    /// `classes` must hold one label per node; every element index must be
    /// in range (checked by the caller).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_classes<M: NodeMesh>(mesh: &M, classes: Vec<PointClass>, unsure_before_fill: Vec<u32>) -> Self {
        let mut elements_at_surface = Vec::new();
        let mut elements_in_volume = Vec::new();

        for (e, element) in mesh.elements().enumerate() {
            let mut inside = false;
            let mut outside = false;
            let mut surface = false;
            for &n in element {
                match classes.get(n as usize) {
                    Some(PointClass::Inside) => inside = true,
                    Some(PointClass::Surface) => surface = true,
                    _ => outside = true,
                }
            }
            if surface || (inside && outside) {
                elements_at_surface.push(e as u32);
            } else if inside {
                elements_in_volume.push(e as u32);
            }
        }

        Self {
            classes,
            unsure_before_fill,
            elements_at_surface,
            elements_in_volume,
        }
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether there are no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Label per node.
    #[must_use]
    pub fn classes(&self) -> &[PointClass] {
        &self.classes
    }

    /// Label of one node.
    ///
    /// # Errors
    ///
    /// Returns [`SdfError::IndexOutOfRange`] if `node` does not exist.
    pub fn class(&self, node: usize) -> SdfResult<PointClass> {
        self.classes
            .get(node)
            .copied()
            .ok_or_else(|| SdfError::out_of_range("node", node, self.classes.len()))
    }

    /// Nodes the raycast left unsure (resolved afterwards by flood fill).
    #[must_use]
    pub fn unsure_before_fill(&self) -> &[u32] {
        &self.unsure_before_fill
    }

    /// Elements cut by the surface: they hold a surface node, or both an
    /// inside and an outside node.
    #[must_use]
    pub fn elements_at_surface(&self) -> &[u32] {
        &self.elements_at_surface
    }

    /// Elements whose nodes are all inside.
    #[must_use]
    pub fn elements_in_volume(&self) -> &[u32] {
        &self.elements_in_volume
    }

    /// Nodes labeled inside.
    #[must_use]
    pub fn nodes_inside(&self) -> Vec<u32> {
        self.nodes_with(PointClass::Inside)
    }

    /// Nodes labeled as on the surface.
    #[must_use]
    pub fn nodes_on_surface(&self) -> Vec<u32> {
        self.nodes_with(PointClass::Surface)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn nodes_with(&self, class: PointClass) -> Vec<u32> {
        self.classes
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == class)
            .map(|(i, _)| i as u32)
            .collect()
    }

    /// Number of nodes carrying `class`.
    #[must_use]
    pub fn count(&self, class: PointClass) -> usize {
        self.classes.iter().filter(|c| **c == class).count()
    }
}

/// Signed distance per node, with the labels and distances behind it.
///
/// Values are negative inside and positive outside. Surface nodes carry the
/// configured surface value (zero by default).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SignedField {
    raycast: RaycastResult,
    values: Vec<f64>,
    distances: Vec<f64>,
    closest: Vec<Option<usize>>,
    statuses: Vec<SweepStatus>,
}

impl SignedField {
    /// Combine labels and unsigned distances into signed values.
    #[must_use]
    pub fn assemble(
        raycast: RaycastResult,
        distances: Vec<f64>,
        closest: Vec<Option<usize>>,
        statuses: Vec<SweepStatus>,
        surface_value: Option<f64>,
    ) -> Self {
        let values = raycast
            .classes()
            .iter()
            .zip(&distances)
            .map(|(class, d)| match class {
                PointClass::Surface => surface_value.unwrap_or(0.0),
                c => c.sign_value() * d,
            })
            .collect();

        Self {
            raycast,
            values,
            distances,
            closest,
            statuses,
        }
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Signed value per node.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Signed value of one node.
    ///
    /// # Errors
    ///
    /// Returns [`SdfError::IndexOutOfRange`] if `node` does not exist.
    pub fn value(&self, node: usize) -> SdfResult<f64> {
        self.values
            .get(node)
            .copied()
            .ok_or_else(|| SdfError::out_of_range("node", node, self.values.len()))
    }

    /// Unsigned distance per node.
    #[must_use]
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// Unsigned distance of one node.
    ///
    /// # Errors
    ///
    /// Returns [`SdfError::IndexOutOfRange`] if `node` does not exist.
    pub fn distance(&self, node: usize) -> SdfResult<f64> {
        self.distances
            .get(node)
            .copied()
            .ok_or_else(|| SdfError::out_of_range("node", node, self.distances.len()))
    }

    /// Label of one node.
    ///
    /// # Errors
    ///
    /// Returns [`SdfError::IndexOutOfRange`] if `node` does not exist.
    pub fn class(&self, node: usize) -> SdfResult<PointClass> {
        self.raycast.class(node)
    }

    /// Label per node.
    #[must_use]
    pub fn classes(&self) -> &[PointClass] {
        self.raycast.classes()
    }

    /// Index (in the primitive store) of the primitive closest to `node`.
    ///
    /// # Errors
    ///
    /// Returns [`SdfError::IndexOutOfRange`] if `node` does not exist.
    pub fn closest_primitive(&self, node: usize) -> SdfResult<Option<usize>> {
        self.closest
            .get(node)
            .copied()
            .ok_or_else(|| SdfError::out_of_range("node", node, self.closest.len()))
    }

    /// Sweep status per node.
    #[must_use]
    pub fn statuses(&self) -> &[SweepStatus] {
        &self.statuses
    }

    /// Number of nodes whose distance is only an upper bound.
    #[must_use]
    pub fn best_effort_count(&self) -> usize {
        self.statuses
            .iter()
            .filter(|s| **s == SweepStatus::BestEffort)
            .count()
    }

    /// Labels and element lists.
    #[must_use]
    pub const fn raycast(&self) -> &RaycastResult {
        &self.raycast
    }

    /// Split into the raycast result and the signed values.
    #[must_use]
    pub fn into_parts(self) -> (RaycastResult, Vec<f64>) {
        (self.raycast, self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::{BackgroundMesh, Dimension, Node, Point3};

    use PointClass::{Inside, Outside, Surface};

    fn strip() -> BackgroundMesh {
        let nodes = (0..6_u32)
            .map(|i| Node::new(u64::from(i) + 1, Point3::new(f64::from(i), 0.0, 0.0)))
            .collect();
        let elements = vec![vec![0, 1], vec![1, 2], vec![2, 3], vec![3, 4], vec![4, 5]];
        BackgroundMesh::from_parts(Dimension::Three, nodes, elements)
    }

    #[test]
    fn element_lists() {
        let classes = vec![Inside, Inside, Surface, Outside, Inside, Outside];
        let result = RaycastResult::from_classes(&strip(), classes, Vec::new());
        assert_eq!(result.elements_in_volume(), &[0]);
        assert_eq!(result.elements_at_surface(), &[1, 2, 3, 4]);
        assert_eq!(result.nodes_inside(), vec![0, 1, 4]);
        assert_eq!(result.nodes_on_surface(), vec![2]);
    }

    #[test]
    fn assembled_values() {
        let classes = vec![Inside, Inside, Surface, Outside, Inside, Outside];
        let result = RaycastResult::from_classes(&strip(), classes, vec![2]);
        let field = SignedField::assemble(
            result,
            vec![0.5, 0.25, 0.001, 0.3, 0.1, 2.0],
            vec![Some(0); 6],
            vec![SweepStatus::Exact; 6],
            Some(-1e-6),
        );

        assert_relative_eq!(field.value(0).expect("node 0"), -0.5);
        assert_relative_eq!(field.value(2).expect("node 2"), -1e-6);
        assert_relative_eq!(field.value(5).expect("node 5"), 2.0);
        assert_eq!(field.raycast().unsure_before_fill(), &[2]);
        assert_eq!(field.best_effort_count(), 0);
    }

    #[test]
    fn out_of_range_lookups() {
        let field = SignedField::default();
        assert!(field.is_empty());
        match field.value(3) {
            Err(SdfError::IndexOutOfRange { what, index, len }) => {
                assert_eq!((what, index, len), ("node", 3, 0));
            }
            other => panic!("expected out of range, got {other:?}"),
        }
        assert!(field.closest_primitive(0).is_err());
        assert!(field.class(0).is_err());
    }
}

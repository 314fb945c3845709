//! Diagnostic export of classification results.
//!
//! Writers take any [`std::io::Write`]; wrap files in a `BufWriter`.
//!
//! - [`write_vtk`] - Legacy ASCII VTK point cloud with signed value, unsigned
//!   distance and class per node
//! - [`write_unsure_vtk`] - The nodes the raycast could not decide
//! - [`write_debug_dump`] - One whitespace-separated line per node
//!
//! # Example
//!
//! ```
//! use mesh_sdf::{SdfCore, write_debug_dump};
//! use mesh_types::{BackgroundMesh, Point3, unit_cube};
//!
//! let core = SdfCore::with_defaults(&unit_cube()).unwrap();
//! let grid = BackgroundMesh::grid_3d(
//!     Point3::new(-0.25, -0.25, -0.25),
//!     Point3::new(1.25, 1.25, 1.25),
//!     [6, 6, 6],
//! );
//! let field = core.calculate_raycast_and_sdf(&grid).unwrap();
//!
//! let mut out = Vec::new();
//! write_debug_dump(&field, &grid, &mut out).unwrap();
//! assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1 + 343);
//! ```

use std::io::Write;

use mesh_types::{Node, NodeMesh};

use crate::error::{SdfError, SdfResult};
use crate::result::SignedField;

/// Check that `field` was computed for `mesh`.
fn check_sizes<M: NodeMesh>(field: &SignedField, mesh: &M) -> SdfResult<()> {
    let nodes = mesh.node_count();
    if nodes != field.len() {
        // First index present on one side only.
        return Err(SdfError::out_of_range(
            "node",
            nodes.max(field.len()) - 1,
            nodes.min(field.len()),
        ));
    }
    Ok(())
}

fn write_header<W: Write>(writer: &mut W, title: &str, nodes: &[&Node]) -> SdfResult<()> {
    writeln!(writer, "# vtk DataFile Version 3.0")?;
    writeln!(writer, "{title}")?;
    writeln!(writer, "ASCII")?;
    writeln!(writer, "DATASET UNSTRUCTURED_GRID")?;
    writeln!(writer, "POINTS {} double", nodes.len())?;
    for node in nodes {
        let p = node.position;
        writeln!(writer, "{:.12e} {:.12e} {:.12e}", p.x, p.y, p.z)?;
    }

    // One vertex cell per point so viewers render them.
    writeln!(writer, "CELLS {} {}", nodes.len(), 2 * nodes.len())?;
    for i in 0..nodes.len() {
        writeln!(writer, "1 {i}")?;
    }
    writeln!(writer, "CELL_TYPES {}", nodes.len())?;
    for _ in nodes {
        writeln!(writer, "1")?;
    }
    writeln!(writer, "POINT_DATA {}", nodes.len())?;
    Ok(())
}

fn write_scalars<W: Write, T: std::fmt::Display>(
    writer: &mut W,
    name: &str,
    kind: &str,
    values: impl Iterator<Item = T>,
) -> SdfResult<()> {
    writeln!(writer, "SCALARS {name} {kind} 1")?;
    writeln!(writer, "LOOKUP_TABLE default")?;
    for v in values {
        writeln!(writer, "{v}")?;
    }
    Ok(())
}

/// Write the whole field as a legacy ASCII VTK point cloud.
///
/// Point data: `sdf` (signed value), `distance` (unsigned distance),
/// `class` (-1 inside, 1 outside, 0 surface) and `id` (global node id).
///
/// # Errors
///
/// - [`SdfError::IndexOutOfRange`] if `field` does not have one entry per
///   node of `mesh`.
/// - [`SdfError::Io`] if writing fails.
pub fn write_vtk<M: NodeMesh, W: Write>(field: &SignedField, mesh: &M, mut writer: W) -> SdfResult<()> {
    check_sizes(field, mesh)?;
    let nodes: Vec<&Node> = mesh.nodes().collect();

    write_header(&mut writer, "signed distance field", &nodes)?;
    write_scalars(&mut writer, "sdf", "double", field.values().iter().map(|v| format!("{v:.12e}")))?;
    write_scalars(&mut writer, "distance", "double", field.distances().iter().map(|v| format!("{v:.12e}")))?;
    write_scalars(&mut writer, "class", "int", field.classes().iter().map(|c| c.code()))?;
    write_scalars(&mut writer, "id", "long", nodes.iter().map(|n| n.id))?;
    writer.flush()?;
    Ok(())
}

/// Write the nodes that were unsure before the flood fill, with the label
/// the fill gave them.
///
/// # Errors
///
/// Same as [`write_vtk`].
pub fn write_unsure_vtk<M: NodeMesh, W: Write>(field: &SignedField, mesh: &M, mut writer: W) -> SdfResult<()> {
    check_sizes(field, mesh)?;
    let unsure = field.raycast().unsure_before_fill();
    let nodes: Vec<&Node> = unsure
        .iter()
        .filter_map(|&i| mesh.node(i as usize))
        .collect();

    write_header(&mut writer, "points unsure before flood fill", &nodes)?;
    write_scalars(
        &mut writer,
        "resolved_class",
        "int",
        unsure.iter().map(|&i| field.class(i as usize).map_or(2, |c| c.code())),
    )?;
    write_scalars(&mut writer, "id", "long", nodes.iter().map(|n| n.id))?;
    writer.flush()?;
    Ok(())
}

/// Write one line per node: index, id, coordinates, class, unsigned distance
/// and signed value.
///
/// # Errors
///
/// Same as [`write_vtk`].
pub fn write_debug_dump<M: NodeMesh, W: Write>(field: &SignedField, mesh: &M, mut writer: W) -> SdfResult<()> {
    check_sizes(field, mesh)?;

    writeln!(writer, "# index id x y z class distance value")?;
    for (i, node) in mesh.nodes().enumerate() {
        let p = node.position;
        writeln!(
            writer,
            "{i} {} {:.9} {:.9} {:.9} {} {:.9} {:.9}",
            node.id,
            p.x,
            p.y,
            p.z,
            field.class(i)?,
            field.distance(i)?,
            field.value(i)?,
        )?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SdfConfig, SdfCore};
    use mesh_types::{BackgroundMesh, Point3, unit_cube};

    fn field_and_grid() -> (SignedField, BackgroundMesh) {
        let config = SdfConfig::default().with_resolve_grazing_rays(false);
        let core = SdfCore::new(&unit_cube(), config).expect("cube builds");
        let grid = BackgroundMesh::grid_3d(
            Point3::new(-0.25, -0.25, -0.25),
            Point3::new(1.25, 1.25, 1.25),
            [6, 6, 6],
        );
        let field = core.calculate_raycast_and_sdf(&grid).expect("field");
        (field, grid)
    }

    #[test]
    fn vtk_layout() {
        let (field, grid) = field_and_grid();
        let mut out = Vec::new();
        write_vtk(&field, &grid, &mut out).expect("write");
        let text = String::from_utf8(out).expect("utf8");

        assert!(text.starts_with("# vtk DataFile Version 3.0\n"));
        assert!(text.contains("POINTS 343 double"));
        assert!(text.contains("CELLS 343 686"));
        assert!(text.contains("SCALARS sdf double 1"));
        assert!(text.contains("SCALARS class int 1"));
        assert_eq!(text.matches("LOOKUP_TABLE default").count(), 4);
    }

    #[test]
    fn unsure_vtk_lists_pre_fill_points() {
        let (field, grid) = field_and_grid();
        let unsure = field.raycast().unsure_before_fill().len();
        assert!(unsure > 0);

        let mut out = Vec::new();
        write_unsure_vtk(&field, &grid, &mut out).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains(&format!("POINTS {unsure} double")));
        assert!(text.contains("SCALARS resolved_class int 1"));
    }

    #[test]
    fn debug_dump_lines() {
        let (field, grid) = field_and_grid();
        let mut out = Vec::new();
        write_debug_dump(&field, &grid, &mut out).expect("write");
        let text = String::from_utf8(out).expect("utf8");

        let centroid = text.lines().nth(1 + 171).expect("centroid line");
        let columns: Vec<&str> = centroid.split_whitespace().collect();
        assert_eq!(columns[0], "171");
        assert_eq!(columns[1], "172");
        assert_eq!(columns[5], "inside");
    }

    #[test]
    fn mismatched_mesh_rejected() {
        let (field, _) = field_and_grid();
        let other = BackgroundMesh::grid_3d(Point3::origin(), Point3::new(1.0, 1.0, 1.0), [1, 1, 1]);
        let result = write_vtk(&field, &other, Vec::<u8>::new());
        assert!(matches!(result, Err(SdfError::IndexOutOfRange { .. })));
    }
}

//! Legacy VTK (DataFile 2.0) unstructured-grid writer. Cell type 12 is the
//! linear hexahedron; connectivity is 0-based in this format.

use std::io::Write;

use crate::error::MeshError;

use super::ExportMesh;

const HEADER: &str = "\
# vtk DataFile Version 2.0
meshfile created by hexmesh
ASCII
DATASET UNSTRUCTURED_GRID
FIELD FieldData 2
TIME 1 1 float
0
CYCLE 1 1 int
0
";

/// Serialize `mesh` as a legacy VTK stream. Point-data boundary tags are
/// emitted only when the mesh carries patches; cell-data materials always.
pub fn write_vtk<W: Write>(w: &mut W, mesh: &ExportMesh) -> Result<(), MeshError> {
    write!(w, "{HEADER}")?;

    writeln!(w, "POINTS {} float", mesh.nodes.len())?;
    for node in mesh.nodes {
        for x in node {
            write!(w, " {x}")?;
        }
        writeln!(w)?;
    }
    writeln!(w)?;

    let ncells = mesh.cells.len();
    writeln!(w, "CELLS  {} {}", ncells, ncells + 8 * ncells)?;
    for cell in mesh.cells {
        write!(w, "8 ")?;
        for &node in cell {
            write!(w, " {node}")?;
        }
        writeln!(w)?;
    }
    writeln!(w)?;

    writeln!(w, "CELL_TYPES  {ncells}")?;
    for _ in 0..ncells {
        writeln!(w, "12")?;
    }
    writeln!(w)?;

    if !mesh.boundaries.is_empty() {
        let tags = mesh.node_boundary_tags();
        writeln!(w, "POINT_DATA  {}", mesh.nodes.len())?;
        writeln!(w, "SCALARS bdr float")?;
        writeln!(w, "LOOKUP_TABLE default")?;
        for tag in tags {
            writeln!(w, "{tag}")?;
        }
        writeln!(w)?;
    }

    writeln!(w, "CELL_DATA  {ncells}")?;
    writeln!(w, "SCALARS materials float")?;
    writeln!(w, "LOOKUP_TABLE default")?;
    for c in 0..ncells {
        writeln!(w, "{}", mesh.material(c))?;
    }
    writeln!(w)?;
    Ok(())
}

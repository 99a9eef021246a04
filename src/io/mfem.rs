//! MFEM mesh v1.0 writer. Hexahedra only (geometry type 5, CUBE);
//! boundary quads are written with geometry type 3 (SQUARE).

use std::io::Write;

use crate::error::MeshError;

use super::ExportMesh;

const HEADER: &str = "\
# automatically generated by hexmesh
MFEM mesh v1.0

#
# MFEM Geometry Types (see mesh/geom.hpp):
#
# POINT       = 0
# SEGMENT     = 1
# TRIANGLE    = 2
# SQUARE      = 3
# TETRAHEDRON = 4
# CUBE        = 5
#
";

/// Serialize `mesh` as an MFEM v1.0 stream. Node ids are 1-based on disk;
/// the boundary section is present only when the mesh carries patches, with
/// attributes numbered by patch order starting at 1.
pub fn write_mfem<W: Write>(w: &mut W, mesh: &ExportMesh) -> Result<(), MeshError> {
    write!(w, "{HEADER}")?;
    writeln!(w, "dimension\n3\n")?;

    writeln!(w, "elements\n{}", mesh.cells.len())?;
    for (c, cell) in mesh.cells.iter().enumerate() {
        write!(w, "{} {}", mesh.material(c), 5)?;
        for &node in cell {
            write!(w, " {}", node + 1)?;
        }
        writeln!(w)?;
    }
    writeln!(w)?;

    if !mesh.boundaries.is_empty() {
        let total: usize = mesh.boundaries.iter().map(|b| b.faces.len()).sum();
        writeln!(w, "boundary\n{total}")?;
        for (ordinal, patch) in mesh.boundaries.iter().enumerate() {
            for face in &patch.faces {
                write!(w, "{} {}", ordinal + 1, 3)?;
                for &node in face {
                    write!(w, " {}", node + 1)?;
                }
                writeln!(w)?;
            }
        }
        writeln!(w)?;
    }

    writeln!(w, "vertices\n{}\n{}", mesh.nodes.len(), 3)?;
    for node in mesh.nodes {
        for x in node {
            write!(w, " {x}")?;
        }
        writeln!(w)?;
    }
    writeln!(w)?;
    Ok(())
}

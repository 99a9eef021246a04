//! Mesh serialization.
//!
//! Four on-disk formats share one export view: I-DEAS universal files
//! ([`unv`]), MFEM meshes ([`mfem`]), the two-file datablock format
//! ([`datablock`]), and legacy VTK ([`vtk`]). Text layout in each writer is
//! fixed to the byte; downstream solvers diff these files.

pub mod datablock;
pub mod mfem;
pub mod regions;
pub mod unv;
pub mod vtk;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::MeshError;
use crate::geometry::Point3;
use crate::sink::{GroupKind, MeshSink};

/// A named set of boundary faces carried into the serializers.
#[derive(Clone, Debug)]
pub struct BoundaryPatch {
    pub name: String,
    pub faces: Vec<[usize; 4]>,
}

/// Borrowed view of a mesh ready for serialization. Node and cell indices
/// are 0-based; writers apply each format's id base themselves.
#[derive(Clone, Copy, Debug)]
pub struct ExportMesh<'a> {
    pub nodes: &'a [Point3],
    pub cells: &'a [[usize; 8]],
    pub boundaries: &'a [BoundaryPatch],
    /// Per-cell material ids; `None` means all cells are material 1.
    pub materials: Option<&'a [i64]>,
}

impl<'a> ExportMesh<'a> {
    pub fn new(nodes: &'a [Point3], cells: &'a [[usize; 8]]) -> Self {
        Self {
            nodes,
            cells,
            boundaries: &[],
            materials: None,
        }
    }

    pub(crate) fn material(&self, cell: usize) -> i64 {
        self.materials.map_or(1, |m| m[cell])
    }

    /// Per-node boundary tag: 1-based patch ordinal, 0 for interior nodes.
    /// A node on several patches takes the tag of the last one.
    pub(crate) fn node_boundary_tags(&self) -> Vec<i64> {
        let mut tags = vec![0i64; self.nodes.len()];
        for (ordinal, patch) in self.boundaries.iter().enumerate() {
            for face in &patch.faces {
                for &node in face {
                    tags[node] = ordinal as i64 + 1;
                }
            }
        }
        tags
    }
}

/// Owned copy of a sink's contents, for serialization after the sink has
/// been handed elsewhere.
#[derive(Clone, Debug)]
pub struct MeshSnapshot {
    pub nodes: Vec<Point3>,
    pub cells: Vec<[usize; 8]>,
    pub boundaries: Vec<BoundaryPatch>,
    pub materials: Option<Vec<i64>>,
}

impl MeshSnapshot {
    /// Copy nodes, cells, and face groups out of a sink. Groups come over in
    /// creation order; volume groups are not boundary patches and are
    /// skipped.
    pub fn from_sink<S: MeshSink>(sink: &S) -> Self {
        let nodes: Vec<Point3> = (0..sink.node_count()).map(|n| sink.node_xyz(n)).collect();
        let cells: Vec<[usize; 8]> = (0..sink.volume_count())
            .map(|v| sink.volume_nodes(v))
            .collect();
        let boundaries = sink
            .groups()
            .iter()
            .filter(|g| g.kind == GroupKind::Face)
            .map(|g| BoundaryPatch {
                name: g.name.clone(),
                faces: g.ids.iter().map(|&f| sink.face_nodes(f)).collect(),
            })
            .collect();
        Self {
            nodes,
            cells,
            boundaries,
            materials: None,
        }
    }

    pub fn view(&self) -> ExportMesh<'_> {
        ExportMesh {
            nodes: &self.nodes,
            cells: &self.cells,
            boundaries: &self.boundaries,
            materials: self.materials.as_deref(),
        }
    }
}

/// Supported output formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Unv,
    Mfem,
    Datablock,
    Vtk,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Unv => "unv",
            OutputFormat::Mfem => "mesh",
            OutputFormat::Datablock => "coords",
            OutputFormat::Vtk => "vtk",
        }
    }
}

/// Write `mesh` at `path` in the chosen format.
///
/// For [`OutputFormat::Datablock`] the path is treated as a base name and
/// both `.coords` and `.lnods` files are produced next to each other; the
/// other formats write a single file at `path` as given.
pub fn write_mesh(format: OutputFormat, path: &Path, mesh: &ExportMesh) -> Result<(), MeshError> {
    match format {
        OutputFormat::Unv => {
            let mut w = BufWriter::new(File::create(path)?);
            unv::write_unv(&mut w, mesh)
        }
        OutputFormat::Mfem => {
            let mut w = BufWriter::new(File::create(path)?);
            mfem::write_mfem(&mut w, mesh)
        }
        OutputFormat::Datablock => {
            let mut coords = BufWriter::new(File::create(path.with_extension("coords"))?);
            datablock::write_coords(&mut coords, mesh)?;
            let mut lnods = BufWriter::new(File::create(path.with_extension("lnods"))?);
            datablock::write_lnods(&mut lnods, mesh)
        }
        OutputFormat::Vtk => {
            let mut w = BufWriter::new(File::create(path)?);
            vtk::write_vtk(&mut w, mesh)
        }
    }
}

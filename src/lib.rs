//! # hexmesh
//!
//! hexmesh is a structured hexahedral mesh generation and geometry-processing
//! library for groundwater and reservoir grids. It builds Cartesian grids
//! from axis coordinate vectors, classifies boundary faces into cardinal
//! sides and user-defined zones, conforms grids to interpolated horizon
//! surfaces, imports corner-point flow models, and serializes meshes to UNV,
//! MFEM, datablock, and legacy VTK formats with bit-stable text layout.
//!
//! ## Layout
//! - [`geometry`]: coordinate math (hexahedron volumes, containment, pillars)
//! - [`grid`]: Cartesian grid construction and the node-ordering contract
//! - [`sink`]: the [`sink::MeshSink`] trait and in-memory mesh
//! - [`boundary`]: envelope extraction, side and zone classification
//! - [`horizon`]: horizon conformance, mesh extension, scaling, clipping
//! - [`interp`]: radial basis surface interpolation
//! - [`flow`]: corner-point flow-model import
//! - [`io`]: the four serialization formats plus region/surface readers
//!
//! ## Determinism
//!
//! All randomized decisions (zone display colors) use `SmallRng` seeds drawn
//! from caller options so runs are reproducible.

pub mod boundary;
pub mod error;
pub mod flow;
pub mod geometry;
pub mod grid;
pub mod horizon;
pub mod interp;
pub mod io;
pub mod sink;

/// Common imports for building, classifying, and serializing grids.
pub mod prelude {
    pub use crate::boundary::{
        classify_regions, classify_sides, extract_boundary_faces, RegionOptions, Side,
        BOUNDARY_GROUP,
    };
    pub use crate::error::{MeshError, ParseError};
    pub use crate::flow::{import_flow_mesh, load_flow_mesh, FlowImportOptions};
    pub use crate::geometry::{Point3, COLUMN_TOL};
    pub use crate::grid::{cartesian_grid_2d, cartesian_grid_3d, linspace};
    pub use crate::horizon::{
        clip_grid_to_region, conform_to_horizons, extend_mesh, scale_along_axes,
    };
    pub use crate::interp::{FnSurface, RbfSurface, SurfaceInterpolator};
    pub use crate::io::{write_mesh, ExportMesh, MeshSnapshot, OutputFormat};
    pub use crate::sink::{populate_mesh, MemoryMesh, MeshSink, PreviewSession};
}

pub use boundary::{classify_regions, classify_sides, RegionOptions, Side};
pub use error::{MeshError, ParseError};
pub use geometry::Point3;
pub use grid::{cartesian_grid_2d, cartesian_grid_3d, linspace};
pub use horizon::{conform_to_horizons, extend_mesh};
pub use interp::{FnSurface, RbfSurface, SurfaceInterpolator};
pub use io::{ExportMesh, MeshSnapshot, OutputFormat};
pub use sink::{MemoryMesh, MeshSink};

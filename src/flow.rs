//! Flow-model import: turns a corner-point reservoir grid (datablock
//! `.coords`/`.lnods` pair) into a clean structured grid.
//!
//! The pipeline de-rotates the model onto the Cartesian axes, measures its
//! cell stacks and pillar surfaces, rebuilds a regular grid at the measured
//! resolution, drapes the top and base through smoothed radial basis
//! surfaces, and removes pinched-out pillars by enforcing a minimum
//! thickness.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::MeshError;
use crate::geometry::{self, Point3, COLUMN_TOL};
use crate::grid::{cartesian_grid_3d, linspace};
use crate::interp::{RbfSurface, SurfaceInterpolator, DEFAULT_SMOOTHING};
use crate::io::{datablock, unv, ExportMesh};

/// Options controlling the import pipeline.
#[derive(Clone, Debug)]
pub struct FlowImportOptions {
    /// Minimum layer thickness enforced on pinched-out pillars. Values below
    /// 1e-9 mean "use the model's mean layer thickness".
    pub min_thickness: f64,
    /// When set, intermediate and final meshes are saved next to this base
    /// path (`_original.unv`, `_output.unv`, `_smoothed.{unv,coords,lnods}`).
    pub auto_save: Option<PathBuf>,
}

impl Default for FlowImportOptions {
    fn default() -> Self {
        Self {
            min_thickness: 5.0,
            auto_save: None,
        }
    }
}

fn suffixed(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn save_unv(path: &Path, nodes: &[Point3], cells: &[[usize; 8]]) -> Result<(), MeshError> {
    let mut w = BufWriter::new(File::create(path)?);
    unv::write_unv(&mut w, &ExportMesh::new(nodes, cells))
}

fn argmin_by_axis(nodes: &[Point3], axis: usize) -> usize {
    let mut best = 0;
    for (i, node) in nodes.iter().enumerate() {
        if node[axis] < nodes[best][axis] {
            best = i;
        }
    }
    best
}

/// Translate the model to the origin and rotate it back onto the Cartesian
/// axes, using the vector between the minimum-x and minimum-y corner nodes
/// as the azimuth reference.
fn derotate(nodes: &[Point3]) -> Result<(Vec<Point3>, f64), MeshError> {
    let minx = argmin_by_axis(nodes, 0);
    let miny = argmin_by_axis(nodes, 1);
    let origin = nodes[minx];
    let vbase = [nodes[miny][0] - origin[0], nodes[miny][1] - origin[1]];
    let norm = (vbase[0] * vbase[0] + vbase[1] * vbase[1]).sqrt();
    if norm < 1e-12 {
        return Err(MeshError::InvalidDomain(
            "cannot derive a base vector: minimum-x and minimum-y nodes coincide".into(),
        ));
    }
    let theta = (vbase[0] / norm).clamp(-1.0, 1.0).acos();
    let (sin_t, cos_t) = theta.sin_cos();
    let rotated = nodes
        .iter()
        .map(|n| {
            let x = n[0] - origin[0];
            let y = n[1] - origin[1];
            [x * cos_t - y * sin_t, x * sin_t + y * cos_t, n[2]]
        })
        .collect();
    Ok((rotated, theta))
}

/// Redistribute pillar nodes so no layer is thinner than `min_thickness`.
///
/// `marks` holds +1 for top-surface nodes, -1 for base-surface nodes, 0 for
/// interior ones. A pillar thicker than `dz_ref` keeps its horizon nodes and
/// spreads the interior evenly between them; a pinched pillar is rebuilt
/// downward from its top horizon at the minimum thickness.
fn remove_pinchouts(
    vertices: &mut [Point3],
    marks: &[i8],
    dz_ref: f64,
    min_thickness: f64,
) {
    for pillar in geometry::group_by_column(vertices, COLUMN_TOL) {
        let n = pillar.len();
        let marked: Vec<usize> = pillar.iter().copied().filter(|&i| marks[i] != 0).collect();
        if marked.is_empty() {
            continue;
        }
        let zmax = marked
            .iter()
            .map(|&i| vertices[i][2])
            .fold(f64::NEG_INFINITY, f64::max);
        let zmin = marked
            .iter()
            .map(|&i| vertices[i][2])
            .fold(f64::INFINITY, f64::min);

        if (zmax - zmin).abs() > dz_ref {
            let zs = linspace(zmin, zmax, n);
            let interior: Vec<usize> =
                pillar.iter().copied().filter(|&i| marks[i] == 0).collect();
            for (&idx, &z) in interior.iter().zip(zs[1..n - 1].iter()) {
                vertices[idx][2] = z;
            }
        } else {
            let top = pillar
                .iter()
                .copied()
                .filter(|&i| marks[i] > 0)
                .map(|i| vertices[i][2])
                .fold(f64::NEG_INFINITY, f64::max);
            let top = if top.is_finite() { top } else { zmax };
            let zs = linspace(top - n as f64 * min_thickness, top, n);
            for (&idx, &z) in pillar.iter().zip(&zs) {
                vertices[idx][2] = z;
            }
        }
    }
}

/// Import a corner-point flow model and return a regular structured grid
/// with smoothed horizons and no pinch-outs.
///
/// `cells` connectivity is 0-based. The returned grid starts at the origin
/// with the model's footprint and its measured cell counts per axis.
pub fn import_flow_mesh(
    nodes: &[Point3],
    cells: &[[usize; 8]],
    options: &FlowImportOptions,
) -> Result<(Vec<Point3>, Vec<[usize; 8]>), MeshError> {
    if nodes.is_empty() || cells.is_empty() {
        return Err(MeshError::InvalidDomain(
            "flow model has no nodes or no cells".into(),
        ));
    }
    for (cell_idx, cell) in cells.iter().enumerate() {
        for &node in cell {
            if node >= nodes.len() {
                return Err(MeshError::NodeIndexOutOfRange {
                    cell: cell_idx,
                    node,
                    nodes: nodes.len(),
                });
            }
        }
    }

    if let Some(base) = &options.auto_save {
        save_unv(&suffixed(base, "_original.unv"), nodes, cells)?;
    }

    // align the model to the Cartesian axes
    let (rotated, theta) = derotate(nodes)?;
    if let Some(base) = &options.auto_save {
        save_unv(&suffixed(base, "_output.unv"), &rotated, cells)?;
    }

    // cell centroids and volumes
    let mut centroids = Vec::with_capacity(cells.len());
    let mut volumes = Vec::with_capacity(cells.len());
    for cell in cells {
        let corners: [Point3; 8] = std::array::from_fn(|i| rotated[cell[i]]);
        centroids.push(geometry::centroid(&corners));
        volumes.push(geometry::hexahedron_volume(&corners));
    }

    let bbox = geometry::bounding_box(&rotated);
    let len_x = bbox.max_x - bbox.min_x;
    let len_y = bbox.max_y - bbox.min_y;

    // lateral resolution from the first sound cell
    let reference = cells
        .iter()
        .zip(&volumes)
        .find(|&(_, &v)| v > 0.0)
        .map(|(c, _)| c)
        .ok_or_else(|| {
            MeshError::InvalidDomain("flow model has no cell with positive volume".into())
        })?;
    let dx = (rotated[reference[0]][0] - rotated[reference[1]][0]).abs();
    let dy = (rotated[reference[0]][1] - rotated[reference[3]][1]).abs();
    if dx < 1e-12 || dy < 1e-12 {
        return Err(MeshError::InvalidDomain(
            "reference cell has zero lateral extent".into(),
        ));
    }
    let n_x = (len_x / dx).floor() as usize;
    let n_y = (len_y / dy).floor() as usize;
    if n_x == 0 || n_y == 0 {
        return Err(MeshError::InvalidDomain(format!(
            "degenerate lateral resolution: {n_x} x {n_y} cells"
        )));
    }
    info!(
        "imported {} nodes, {} cells, azimuth {:.2} deg, {n_x} x {n_y} lateral cells",
        nodes.len(),
        cells.len(),
        theta.to_degrees() + 90.0
    );

    // node pillars and their horizon samples
    let pillars = geometry::group_by_column(&rotated, COLUMN_TOL);
    if pillars.len() < 2 {
        return Err(MeshError::InvalidDomain(
            "flow model has fewer than two pillars".into(),
        ));
    }
    let mut top_samples = Vec::with_capacity(pillars.len());
    let mut base_samples = Vec::with_capacity(pillars.len());
    for (p, pillar) in pillars.iter().enumerate() {
        if pillar.len() == 1 {
            warn!("pillar #{p} has a single node");
            top_samples.push(rotated[pillar[0]]);
            base_samples.push(rotated[pillar[0]]);
            continue;
        }
        let top = pillar
            .iter()
            .copied()
            .max_by(|&a, &b| rotated[a][2].total_cmp(&rotated[b][2]));
        let base = pillar
            .iter()
            .copied()
            .min_by(|&a, &b| rotated[a][2].total_cmp(&rotated[b][2]));
        if let (Some(t), Some(b)) = (top, base) {
            top_samples.push(rotated[t]);
            base_samples.push(rotated[b]);
        }
    }

    // vertical resolution from the cell stacks
    let stacks = geometry::group_by_column(&centroids, COLUMN_TOL);
    let mut stack_of = vec![0usize; cells.len()];
    let mut thicknesses = Vec::with_capacity(stacks.len());
    for stack in &stacks {
        for &c in stack {
            stack_of[c] = stack.len();
        }
        let anchor = cells[stack[0]];
        let dz = (rotated[anchor[0]][2] - rotated[anchor[4]][2]).abs();
        if dz > 0.0 {
            thicknesses.push(dz);
        }
    }
    let mean_stack = stack_of.iter().sum::<usize>() as f64 / cells.len() as f64;
    let n_z = mean_stack.floor() as i64 - 1;
    if n_z < 1 {
        return Err(MeshError::InvalidDomain(format!(
            "cell stacks too short for a grid: mean stack size {mean_stack:.2}"
        )));
    }
    let n_z = n_z as usize;
    if thicknesses.is_empty() {
        return Err(MeshError::InvalidDomain(
            "no cell stack with measurable thickness".into(),
        ));
    }
    let dz_ref = thicknesses.iter().sum::<f64>() / thicknesses.len() as f64;
    debug!("mean stack {mean_stack:.2}, {n_z} grid layers, dz_ref {dz_ref:.3}");

    // rebuild a regular grid over the measured footprint
    let x = linspace(0.0, len_x, n_x + 1);
    let y = linspace(0.0, len_y, n_y + 1);
    let z = linspace(0.0, n_z as f64, n_z + 1);
    let (mut vertices, new_cells) = cartesian_grid_3d(&x, &y, &z)?;

    let mut marks = vec![0i8; vertices.len()];
    for (idx, v) in vertices.iter().enumerate() {
        if v[2] == n_z as f64 {
            marks[idx] = 1;
        } else if v[2] == 0.0 {
            marks[idx] = -1;
        }
    }

    // drape the horizons
    let top_surface = RbfSurface::fit(&top_samples, DEFAULT_SMOOTHING)?;
    let base_surface = RbfSurface::fit(&base_samples, DEFAULT_SMOOTHING)?;
    for (idx, v) in vertices.iter_mut().enumerate() {
        if marks[idx] > 0 {
            v[2] = top_surface.eval(v[0], v[1]);
        } else if marks[idx] < 0 {
            v[2] = base_surface.eval(v[0], v[1]);
        }
    }

    let min_thickness = if options.min_thickness < 1e-9 {
        dz_ref
    } else {
        options.min_thickness
    };
    remove_pinchouts(&mut vertices, &marks, dz_ref, min_thickness);

    // final quality check
    let degenerate = new_cells.iter().any(|cell| {
        let corners: [Point3; 8] = std::array::from_fn(|i| vertices[cell[i]]);
        geometry::hexahedron_volume(&corners) < 1e-9
    });
    if degenerate {
        warn!("negative or near-zero cell volume in the imported grid");
    }

    if let Some(base) = &options.auto_save {
        save_unv(&suffixed(base, "_smoothed.unv"), &vertices, &new_cells)?;
        let export = ExportMesh::new(&vertices, &new_cells);
        let mut coords = BufWriter::new(File::create(suffixed(base, "_smoothed.coords"))?);
        datablock::write_coords(&mut coords, &export)?;
        let mut lnods = BufWriter::new(File::create(suffixed(base, "_smoothed.lnods"))?);
        datablock::write_lnods(&mut lnods, &export)?;
    }

    Ok((vertices, new_cells))
}

/// Load a flow model from `<base>.coords` and `<base>.lnods` and run the
/// import pipeline on it.
pub fn load_flow_mesh(
    base: &Path,
    options: &FlowImportOptions,
) -> Result<(Vec<Point3>, Vec<[usize; 8]>), MeshError> {
    debug!("loading flow model {}", base.display());
    let (nodes, _tags) = datablock::read_coords(&suffixed(base, ".coords"))?;
    let (cells, _materials) = datablock::read_lnods(&suffixed(base, ".lnods"))?;
    import_flow_mesh(&nodes, &cells, options)
}

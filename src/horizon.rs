//! Horizon conformance and grid editing.
//!
//! Deforms a regular Cartesian grid so its top and base follow interpolated
//! elevation surfaces, extends an existing mesh outward from one of its side
//! groups, and provides axis scaling and polygon clipping of raw grids.

use itertools::Itertools;
use log::debug;

use crate::boundary::{self, Side};
use crate::error::MeshError;
use crate::geometry::{self, Point3, COLUMN_TOL};
use crate::grid::{self, linspace};
use crate::interp::SurfaceInterpolator;
#[cfg(test)]
use crate::interp::FnSurface;
use crate::sink::{populate_mesh, MeshSink};

/// Conform a grid's vertices to top and base elevation surfaces and commit
/// the result to `sink`.
///
/// Nodes on the grid's maximum-z plane take elevations from `top`, nodes on
/// the minimum-z plane from `base`, and interior nodes of each pillar are
/// redistributed evenly between the two. A pillar whose surfaces coincide
/// within 1e-9 is opened up by 10 length units on each end so that no cell
/// collapses; a pillar whose top lands below its base is flipped back into
/// ascending order. Only the outer envelope group is created on the sink (no
/// side classification).
///
/// Returns the conformed vertex array.
pub fn conform_to_horizons<S: MeshSink>(
    mut vertices: Vec<Point3>,
    cells: &[[usize; 8]],
    top: &dyn SurfaceInterpolator,
    base: &dyn SurfaceInterpolator,
    sink: &mut S,
) -> Result<Vec<Point3>, MeshError> {
    if vertices.is_empty() {
        return Err(MeshError::InvalidDomain("empty vertex array".into()));
    }
    let bbox = geometry::bounding_box(&vertices);

    // Mark and lift the two horizon planes.
    let mut horizon = vec![0i8; vertices.len()];
    for (idx, v) in vertices.iter_mut().enumerate() {
        if v[2] == bbox.max_z {
            v[2] = top.eval(v[0], v[1]);
            horizon[idx] = 1;
        } else if v[2] == bbox.min_z {
            v[2] = base.eval(v[0], v[1]);
            horizon[idx] = -1;
        }
    }

    for pillar in geometry::group_by_column(&vertices, COLUMN_TOL) {
        let n = pillar.len();
        let z_first = vertices[pillar[0]][2];
        let z_last = vertices[pillar[n - 1]][2];
        let mut zs = if (z_first - z_last).abs() > 1e-9 {
            linspace(z_first, z_last, n)
        } else {
            // Coincident horizons: pad both ends so the pillar keeps volume.
            linspace(z_first - 10.0, z_last + 10.0, n)
        };

        let top_pos = argmax_i8(&horizon, &pillar);
        let base_pos = argmin_i8(&horizon, &pillar);
        if zs[top_pos] < zs[base_pos] {
            zs.reverse();
        }
        for (&idx, &z) in pillar.iter().zip(&zs) {
            vertices[idx][2] = z;
        }
    }

    populate_mesh(sink, &vertices, cells)?;
    boundary::extract_boundary_faces(sink);
    Ok(vertices)
}

fn argmax_i8(values: &[i8], subset: &[usize]) -> usize {
    let mut best = 0;
    for (pos, &idx) in subset.iter().enumerate() {
        if values[idx] > values[subset[best]] {
            best = pos;
        }
    }
    best
}

fn argmin_i8(values: &[i8], subset: &[usize]) -> usize {
    let mut best = 0;
    for (pos, &idx) in subset.iter().enumerate() {
        if values[idx] < values[subset[best]] {
            best = pos;
        }
    }
    best
}

fn unique_sorted(values: impl Iterator<Item = f64>) -> Vec<f64> {
    values.sorted_by(f64::total_cmp).dedup().collect()
}

/// Build an extension grid attached to one side of an already classified
/// mesh.
///
/// The side's face group must exist (see [`crate::boundary::classify_sides`]);
/// otherwise [`MeshError::MissingBoundaryGroup`] is returned. The extension
/// spans `length` away from the side, split into `divisions` cells, and its
/// attachment plane copies the side's node elevations so the two grids stitch
/// without gaps. Lateral extensions (west/east/south/north) inherit the
/// side's z levels per cross-axis line; vertical extensions (top/bottom)
/// stretch each pillar from the attachment elevation to a flat reference
/// plane `length` away.
///
/// Returns the extension's nodes and cells; committing them to a sink is the
/// caller's choice.
pub fn extend_mesh<S: MeshSink>(
    sink: &S,
    side: Side,
    length: f64,
    divisions: usize,
) -> Result<(Vec<Point3>, Vec<[usize; 8]>), MeshError> {
    let group_name = side.group_name();
    let group = sink
        .group(&group_name)
        .ok_or_else(|| MeshError::MissingBoundaryGroup(group_name.clone()))?;

    // Unique nodes of the side, in id order.
    let mut node_ids: Vec<usize> = group
        .ids
        .iter()
        .flat_map(|&f| sink.face_nodes(f))
        .collect();
    node_ids.sort_unstable();
    node_ids.dedup();
    let vertices: Vec<Point3> = node_ids.iter().map(|&n| sink.node_xyz(n)).collect();
    if vertices.is_empty() {
        return Err(MeshError::MissingBoundaryGroup(group_name));
    }
    let mean = geometry::centroid(&vertices);
    debug!(
        "extending {} from ({:.3}, {:.3}, {:.3}) by {length} over {divisions} cells",
        side.name(),
        mean[0],
        mean[1],
        mean[2]
    );

    // z levels of one attachment pillar; lateral sides carry the full stack.
    let pillar_z = |verts: &[Point3]| -> Vec<f64> {
        let anchor = verts[0];
        unique_sorted(
            verts
                .iter()
                .filter(|v| {
                    (v[0] - anchor[0]).abs() < COLUMN_TOL && (v[1] - anchor[1]).abs() < COLUMN_TOL
                })
                .map(|v| v[2]),
        )
    };

    match side {
        Side::West | Side::East => {
            let x_offset = if side == Side::West {
                linspace(mean[0] - length, mean[0], divisions + 1)
            } else {
                linspace(mean[0], mean[0] + length, divisions + 1)
            };
            let y_offset = unique_sorted(vertices.iter().map(|v| v[1]));
            let z_offset = pillar_z(&vertices);
            let grid = grid::cartesian_grid_3d(&x_offset, &y_offset, &z_offset)?;
            align_lateral(grid, &vertices, 1, &y_offset, &z_offset)
        }
        Side::South | Side::North => {
            let x_offset = unique_sorted(vertices.iter().map(|v| v[0]));
            let y_offset = if side == Side::South {
                linspace(mean[1] - length, mean[1], divisions + 1)
            } else {
                linspace(mean[1], mean[1] + length, divisions + 1)
            };
            let z_offset = pillar_z(&vertices);
            let grid = grid::cartesian_grid_3d(&x_offset, &y_offset, &z_offset)?;
            align_lateral(grid, &vertices, 0, &x_offset, &z_offset)
        }
        Side::Bottom | Side::Top => {
            let x_offset = unique_sorted(vertices.iter().map(|v| v[0]));
            let y_offset = unique_sorted(vertices.iter().map(|v| v[1]));
            let z_offset = if side == Side::Bottom {
                linspace(mean[2] - length, mean[2], divisions + 1)
            } else {
                linspace(mean[2], mean[2] + length, divisions + 1)
            };
            let z_ref = if side == Side::Top {
                z_offset[z_offset.len() - 1]
            } else {
                z_offset[0]
            };
            let (mut nodes, cells) = grid::cartesian_grid_3d(&x_offset, &y_offset, &z_offset)?;
            align_vertical(&mut nodes, &vertices, &x_offset, &y_offset, side, z_ref)?;
            Ok((nodes, cells))
        }
    }
}

/// Replace the extension's flat z levels by the side's actual elevations,
/// line by line along the cross axis.
fn align_lateral(
    grid: (Vec<Point3>, Vec<[usize; 8]>),
    side_vertices: &[Point3],
    axis: usize,
    cross: &[f64],
    levels: &[f64],
) -> Result<(Vec<Point3>, Vec<[usize; 8]>), MeshError> {
    let (mut nodes, cells) = grid;
    for &p in cross {
        let z_pillar = unique_sorted(
            side_vertices
                .iter()
                .filter(|v| v[axis] == p)
                .map(|v| v[2]),
        );
        if z_pillar.len() < levels.len() {
            return Err(MeshError::InvalidDomain(format!(
                "side line at coordinate {p} carries {} z levels, expected {}",
                z_pillar.len(),
                levels.len()
            )));
        }
        for (k, &level) in levels.iter().enumerate() {
            for node in nodes.iter_mut() {
                if node[axis] == p && node[2] == level {
                    node[2] = z_pillar[k];
                }
            }
        }
    }
    Ok((nodes, cells))
}

/// Stretch each vertical-extension pillar from the side's attachment
/// elevation to the flat reference plane.
fn align_vertical(
    nodes: &mut [Point3],
    side_vertices: &[Point3],
    xs: &[f64],
    ys: &[f64],
    side: Side,
    z_ref: f64,
) -> Result<(), MeshError> {
    for &x in xs {
        for &y in ys {
            let attach = side_vertices
                .iter()
                .find(|v| v[0] == x && v[1] == y)
                .ok_or_else(|| {
                    MeshError::InvalidDomain(format!(
                        "no attachment node at ({x}, {y}) on {} side",
                        side.name()
                    ))
                })?[2];

            let mut pillar: Vec<usize> = nodes
                .iter()
                .enumerate()
                .filter(|(_, v)| v[0] == x && v[1] == y)
                .map(|(i, _)| i)
                .collect();
            pillar.sort_by(|&a, &b| nodes[a][2].total_cmp(&nodes[b][2]));

            let zs = if side == Side::Top {
                linspace(attach, z_ref, pillar.len())
            } else {
                linspace(z_ref, attach, pillar.len())
            };
            for (&idx, &z) in pillar.iter().zip(&zs) {
                nodes[idx][2] = z;
            }
        }
    }
    Ok(())
}

/// Multiply node coordinates by per-axis factors, in place.
pub fn scale_along_axes(nodes: &mut [Point3], factors: [f64; 3]) {
    for node in nodes {
        node[0] *= factors[0];
        node[1] *= factors[1];
        node[2] *= factors[2];
    }
}

/// Keep only the cells whose centroid projects inside the xy polygon, and
/// compact the node array to the surviving references.
pub fn clip_grid_to_region(
    nodes: &[Point3],
    cells: &[[usize; 8]],
    polygon: &[Point3],
) -> (Vec<Point3>, Vec<[usize; 8]>) {
    let mut remap = vec![usize::MAX; nodes.len()];
    let mut kept_nodes = Vec::new();
    let mut kept_cells = Vec::new();
    for cell in cells {
        let corners: [Point3; 8] = std::array::from_fn(|i| nodes[cell[i]]);
        let c = geometry::centroid(&corners);
        if !geometry::point_in_polygon(c[0], c[1], polygon) {
            continue;
        }
        let mut mapped = [0usize; 8];
        for (slot, &old) in mapped.iter_mut().zip(cell.iter()) {
            if remap[old] == usize::MAX {
                remap[old] = kept_nodes.len();
                kept_nodes.push(nodes[old]);
            }
            *slot = remap[old];
        }
        kept_cells.push(mapped);
    }
    (kept_nodes, kept_cells)
}

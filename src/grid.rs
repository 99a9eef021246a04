//! Structured Cartesian grid builder.
//!
//! Generates node and cell arrays from axis coordinate vectors. Node ordering
//! is lexicographic with x fastest-varying, then y, then z (Fortran order);
//! the flat node index of grid position `(i, j, k)` is
//! `i + j*(nx+1) + k*(nx+1)*(ny+1)`. This ordering is an external contract
//! relied upon by every face-extraction and pillar routine in the crate.

use crate::error::MeshError;
use crate::geometry::Point3;

/// Local node index patterns of the six faces of a hexahedron, in the fixed
/// order bottom, south, east, north, west, top. Every face-extraction routine
/// and the mesh-sink populator use these patterns.
pub const HEX_FACES: [[usize; 4]; 6] = [
    [0, 1, 2, 3],
    [1, 0, 4, 5],
    [2, 1, 5, 6],
    [3, 2, 6, 7],
    [0, 3, 7, 4],
    [7, 6, 5, 4],
];

/// `n` evenly spaced samples over `[start, end]`, inclusive of both ends.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![start];
    }
    let step = (end - start) / (n - 1) as f64;
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Flat node index of grid position `(i, j, k)` for `nx x ny x nz` cells.
pub fn node_index(i: usize, j: usize, k: usize, nx: usize, ny: usize) -> usize {
    i + j * (nx + 1) + k * (nx + 1) * (ny + 1)
}

fn check_axis(name: &str, coords: &[f64]) -> Result<(), MeshError> {
    if coords.len() < 2 {
        return Err(MeshError::InvalidDomain(format!(
            "axis `{name}` needs at least 2 coordinates, got {}",
            coords.len()
        )));
    }
    Ok(())
}

/// Build a 2D Cartesian grid: one node per (x,y) pair at z = 0 and one quad
/// cell per (i,j) with counter-clockwise winding.
pub fn cartesian_grid_2d(
    x: &[f64],
    y: &[f64],
) -> Result<(Vec<Point3>, Vec<[usize; 4]>), MeshError> {
    check_axis("x", x)?;
    check_axis("y", y)?;

    let mut nodes = Vec::with_capacity(x.len() * y.len());
    for &yv in y {
        for &xv in x {
            nodes.push([xv, yv, 0.0]);
        }
    }

    let nx = x.len() - 1;
    let ny = y.len() - 1;
    let mut cells = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let v0 = i + j * (nx + 1);
            cells.push([v0, v0 + 1, v0 + nx + 2, v0 + nx + 1]);
        }
    }
    Ok((nodes, cells))
}

/// Build a 3D Cartesian grid: one node per (x,y,z) combination and one
/// hexahedral cell per (i,j,k), using the local ordering where nodes 0-3 form
/// the bottom quad and 4-7 the top quad with edges `i <-> i+4`.
pub fn cartesian_grid_3d(
    x: &[f64],
    y: &[f64],
    z: &[f64],
) -> Result<(Vec<Point3>, Vec<[usize; 8]>), MeshError> {
    check_axis("x", x)?;
    check_axis("y", y)?;
    check_axis("z", z)?;

    let mut nodes = Vec::with_capacity(x.len() * y.len() * z.len());
    for &zv in z {
        for &yv in y {
            for &xv in x {
                nodes.push([xv, yv, zv]);
            }
        }
    }
    let cells = hex_connectivity(x.len() - 1, y.len() - 1, z.len() - 1);
    Ok((nodes, cells))
}

/// Hexahedral cell-to-node connectivity for an `nx x ny x nz` structured grid.
pub fn hex_connectivity(nx: usize, ny: usize, nz: usize) -> Vec<[usize; 8]> {
    let row = nx + 1;
    let slab = (nx + 1) * (ny + 1);
    let mut cells = Vec::with_capacity(nx * ny * nz);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let base = node_index(i, j, k, nx, ny);
                cells.push([
                    base,
                    base + 1,
                    base + 1 + row,
                    base + row,
                    base + slab,
                    base + 1 + slab,
                    base + 1 + row + slab,
                    base + row + slab,
                ]);
            }
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::hexahedron_volume;

    #[test]
    fn linspace_endpoints_and_count() {
        let v = linspace(0.0, 2.0, 5);
        assert_eq!(v.len(), 5);
        assert_eq!(v[0], 0.0);
        assert_eq!(v[4], 2.0);
        assert!((v[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn grid_3d_counts_and_ordering() {
        let (nodes, cells) =
            cartesian_grid_3d(&[0.0, 1.0, 2.0], &[0.0, 1.0], &[0.0, 1.0]).unwrap();
        assert_eq!(nodes.len(), 12);
        assert_eq!(cells.len(), 2);
        // x fastest-varying
        assert_eq!(nodes[0], [0.0, 0.0, 0.0]);
        assert_eq!(nodes[1], [1.0, 0.0, 0.0]);
        assert_eq!(nodes[3], [0.0, 1.0, 0.0]);
        assert_eq!(nodes[6], [0.0, 0.0, 1.0]);
        assert_eq!(cells[0], [0, 1, 4, 3, 6, 7, 10, 9]);
    }

    #[test]
    fn grid_3d_cells_have_uniform_positive_volume() {
        let x = linspace(0.0, 4.0, 5);
        let y = linspace(0.0, 3.0, 4);
        let z = linspace(0.0, 2.0, 3);
        let (nodes, cells) = cartesian_grid_3d(&x, &y, &z).unwrap();
        assert_eq!(nodes.len(), 5 * 4 * 3);
        assert_eq!(cells.len(), 4 * 3 * 2);
        for cell in &cells {
            let corners: [crate::geometry::Point3; 8] =
                std::array::from_fn(|i| nodes[cell[i]]);
            assert!((hexahedron_volume(&corners) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn grid_2d_counts() {
        let (nodes, cells) = cartesian_grid_2d(&[0.0, 1.0, 2.0], &[0.0, 1.0]).unwrap();
        assert_eq!(nodes.len(), 6);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0], [0, 1, 4, 3]);
    }

    #[test]
    fn degenerate_axis_is_rejected() {
        let err = cartesian_grid_3d(&[0.0], &[0.0, 1.0], &[0.0, 1.0]).unwrap_err();
        assert!(matches!(err, MeshError::InvalidDomain(_)));
        assert!(cartesian_grid_2d(&[0.0, 1.0], &[]).is_err());
    }

    #[test]
    fn node_index_contract() {
        // i + j*(nx+1) + k*(nx+1)*(ny+1)
        assert_eq!(node_index(1, 2, 3, 3, 2), 1 + 2 * 4 + 3 * 4 * 3);
    }
}

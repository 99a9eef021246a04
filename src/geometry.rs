//! Geometry kernel: pure coordinate math with no I/O.
//!
//! Provides hexahedron volume via Gauss quadrature, ray-casting containment,
//! bounding boxes, and pillar grouping by (x,y) coincidence. Coordinates are
//! bare `[f64; 3]` arrays manipulated through free-function helpers.

use hashbrown::HashMap;

/// A point in 3-space. External formats treat node ids as 1-based; inside the
/// crate everything is 0-based indices into a `&[Point3]` slice.
pub type Point3 = [f64; 3];

/// Coincidence tolerance for pillar/column membership. Callers must use one
/// fixed tolerance consistently across a single run.
pub const COLUMN_TOL: f64 = 1e-9;

/// Gauss point abscissa for the 2x2x2 rule, `1/sqrt(3)` truncated exactly as
/// the validated reference rule states it.
const GAUSS_ABSCISSA: f64 = 0.577350269189626;

/// Local corner signs of the trilinear reference hexahedron: corners 0-3 are
/// the bottom quad, 4-7 the top quad, edges `i <-> i+4`.
const CORNER_SIGNS: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl BoundingBox {
    /// Minimum coordinate on `axis` (0 = x, 1 = y, 2 = z).
    pub fn min(&self, axis: usize) -> f64 {
        match axis {
            0 => self.min_x,
            1 => self.min_y,
            _ => self.min_z,
        }
    }

    /// Maximum coordinate on `axis`.
    pub fn max(&self, axis: usize) -> f64 {
        match axis {
            0 => self.max_x,
            1 => self.max_y,
            _ => self.max_z,
        }
    }
}

/// Single-pass min/max per axis.
pub fn bounding_box(nodes: &[Point3]) -> BoundingBox {
    let mut bbox = BoundingBox {
        min_x: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        min_y: f64::INFINITY,
        max_y: f64::NEG_INFINITY,
        min_z: f64::INFINITY,
        max_z: f64::NEG_INFINITY,
    };
    for node in nodes {
        bbox.min_x = bbox.min_x.min(node[0]);
        bbox.max_x = bbox.max_x.max(node[0]);
        bbox.min_y = bbox.min_y.min(node[1]);
        bbox.max_y = bbox.max_y.max(node[1]);
        bbox.min_z = bbox.min_z.min(node[2]);
        bbox.max_z = bbox.max_z.max(node[2]);
    }
    bbox
}

/// Arithmetic mean of a non-empty point set.
pub fn centroid(points: &[Point3]) -> Point3 {
    let mut out = [0.0; 3];
    for p in points {
        out[0] += p[0];
        out[1] += p[1];
        out[2] += p[2];
    }
    let n = points.len().max(1) as f64;
    [out[0] / n, out[1] / n, out[2] / n]
}

/// Signed hexahedron volume by the 8-point Gauss quadrature of the trilinear
/// shape-function Jacobian determinant (abscissae `±0.577350269189626`, unit
/// weights).
///
/// The rule is reproduced exactly (not simplified to a tetrahedral
/// decomposition) because validated downstream outputs depend on it. Negative
/// or near-zero results are valid outputs signalling inverted or degenerate
/// elements; policy is the caller's.
pub fn hexahedron_volume(nodes: &[Point3; 8]) -> f64 {
    let mut volume = 0.0;
    for gp in &CORNER_SIGNS {
        let chi = gp[0] * GAUSS_ABSCISSA;
        let eta = gp[1] * GAUSS_ABSCISSA;
        let tet = gp[2] * GAUSS_ABSCISSA;

        // Jacobian rows: d(x,y,z)/dchi, d(x,y,z)/deta, d(x,y,z)/dtet.
        let mut jac = [[0.0f64; 3]; 3];
        for (signs, node) in CORNER_SIGNS.iter().zip(nodes.iter()) {
            let dchi = signs[0] * (1.0 + eta * signs[1]) * (1.0 + tet * signs[2]) / 8.0;
            let deta = signs[1] * (1.0 + chi * signs[0]) * (1.0 + tet * signs[2]) / 8.0;
            let dtet = signs[2] * (1.0 + chi * signs[0]) * (1.0 + eta * signs[1]) / 8.0;
            for axis in 0..3 {
                jac[0][axis] += node[axis] * dchi;
                jac[1][axis] += node[axis] * deta;
                jac[2][axis] += node[axis] * dtet;
            }
        }
        volume += det3(&jac);
    }
    volume
}

fn det3(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Ray-casting containment test in the xy-plane; `polygon` z is ignored and
/// the polygon is treated as closed (last point need not repeat the first).
pub fn point_in_polygon(x: f64, y: f64, polygon: &[Point3]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (xi, yi) = (polygon[i][0], polygon[i][1]);
        let (xj, yj) = (polygon[j][0], polygon[j][1]);
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Partition node indices into pillars: groups sharing (x,y) within `tol`.
///
/// Members of each pillar are returned in ascending index order, and pillars
/// in order of their lowest-index anchor. A spatial hash over quantized (x,y)
/// keys replaces the quadratic pairwise scan; the grouping contract is
/// unchanged.
pub fn group_by_column(nodes: &[Point3], tol: f64) -> Vec<Vec<usize>> {
    let quantize = |v: f64| (v / tol).round() as i64;
    let mut buckets: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (idx, node) in nodes.iter().enumerate() {
        buckets
            .entry((quantize(node[0]), quantize(node[1])))
            .or_default()
            .push(idx);
    }

    let mut seen = vec![false; nodes.len()];
    let mut columns = Vec::new();
    for anchor in 0..nodes.len() {
        if seen[anchor] {
            continue;
        }
        let key = (quantize(nodes[anchor][0]), quantize(nodes[anchor][1]));
        let mut members = Vec::new();
        for dk in -1..=1i64 {
            for dj in -1..=1i64 {
                if let Some(candidates) = buckets.get(&(key.0 + dk, key.1 + dj)) {
                    for &idx in candidates {
                        if (nodes[idx][0] - nodes[anchor][0]).abs() < tol
                            && (nodes[idx][1] - nodes[anchor][1]).abs() < tol
                        {
                            members.push(idx);
                        }
                    }
                }
            }
        }
        members.sort_unstable();
        for &idx in &members {
            seen[idx] = true;
        }
        columns.push(members);
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    const UNIT_CUBE: [Point3; 8] = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
    ];

    #[test]
    fn unit_cube_volume() {
        assert!(approx(hexahedron_volume(&UNIT_CUBE), 1.0));
    }

    #[test]
    fn stretched_box_volume() {
        let mut nodes = UNIT_CUBE;
        for n in &mut nodes {
            n[0] *= 2.0;
            n[1] *= 3.0;
            n[2] *= 0.5;
        }
        assert!(approx(hexahedron_volume(&nodes), 3.0));
    }

    #[test]
    fn zero_height_cell_volume_is_zero() {
        let mut nodes = UNIT_CUBE;
        for n in &mut nodes[4..] {
            n[2] = 0.0;
        }
        assert!(approx(hexahedron_volume(&nodes), 0.0));
    }

    #[test]
    fn inverted_cell_volume_is_negative() {
        let mut nodes = UNIT_CUBE;
        nodes.swap(0, 4);
        nodes.swap(1, 5);
        nodes.swap(2, 6);
        nodes.swap(3, 7);
        assert!(approx(hexahedron_volume(&nodes), -1.0));
    }

    #[test]
    fn polygon_containment() {
        let square = [
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [2.0, 2.0, 0.0],
            [0.0, 2.0, 0.0],
        ];
        assert!(point_in_polygon(1.0, 1.0, &square));
        assert!(!point_in_polygon(3.0, 1.0, &square));
        assert!(!point_in_polygon(-0.5, 1.0, &square));
    }

    #[test]
    fn degenerate_polygon_contains_nothing() {
        let segment = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        assert!(!point_in_polygon(0.5, 0.0, &segment));
    }

    #[test]
    fn bounding_box_extrema() {
        let nodes = [[0.0, -1.0, 2.0], [3.0, 4.0, -5.0], [1.0, 1.0, 1.0]];
        let bbox = bounding_box(&nodes);
        assert_eq!(bbox.min_x, 0.0);
        assert_eq!(bbox.max_x, 3.0);
        assert_eq!(bbox.min_y, -1.0);
        assert_eq!(bbox.max_y, 4.0);
        assert_eq!(bbox.min_z, -5.0);
        assert_eq!(bbox.max_z, 2.0);
    }

    #[test]
    fn columns_group_by_xy() {
        let nodes = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [0.0, 0.0, 2.0],
        ];
        let columns = group_by_column(&nodes, COLUMN_TOL);
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0], vec![0, 2, 4]);
        assert_eq!(columns[1], vec![1, 3]);
    }

    #[test]
    fn columns_respect_tolerance() {
        let nodes = [[0.0, 0.0, 0.0], [5e-10, 0.0, 1.0], [1e-6, 0.0, 2.0]];
        let columns = group_by_column(&nodes, COLUMN_TOL);
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0], vec![0, 1]);
        assert_eq!(columns[1], vec![2]);
    }
}

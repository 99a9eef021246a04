//! Boundary face extraction and classification.
//!
//! Splits a mesh's outer envelope into the six cardinal side groups and
//! assigns user polygons to named face zones. Geometry predicates live in
//! [`crate::geometry`]; this module only walks the sink.

use log::{debug, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::MeshError;
use crate::geometry::{self, Point3};
use crate::grid::HEX_FACES;
use crate::sink::{GroupKind, MeshSink};
use hashbrown::HashMap;

/// Name of the group holding the full outer envelope.
pub const BOUNDARY_GROUP: &str = "Boundary_Faces";

/// The six cardinal sides of an axis-aligned domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    West,
    East,
    South,
    North,
    Bottom,
    Top,
}

impl Side {
    pub const ALL: [Side; 6] = [
        Side::West,
        Side::East,
        Side::South,
        Side::North,
        Side::Bottom,
        Side::Top,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Side::West => "Westside",
            Side::East => "Eastside",
            Side::South => "Southside",
            Side::North => "Northside",
            Side::Bottom => "Bottomside",
            Side::Top => "Topside",
        }
    }

    /// Group name used on the sink, e.g. `Westside_Faces`.
    pub fn group_name(self) -> String {
        format!("{}_Faces", self.name())
    }

    /// Axis this side bounds (0 = x, 1 = y, 2 = z).
    pub fn axis(self) -> usize {
        match self {
            Side::West | Side::East => 0,
            Side::South | Side::North => 1,
            Side::Bottom | Side::Top => 2,
        }
    }

    /// Whether the side sits at the maximum extent of its axis.
    pub fn is_max(self) -> bool {
        matches!(self, Side::East | Side::North | Side::Top)
    }

    /// Stable class tag carried into serialized group records.
    pub fn color_number(self) -> i32 {
        match self {
            Side::West => 1,
            Side::East => 2,
            Side::South => 3,
            Side::North => 4,
            Side::Bottom => 5,
            Side::Top => 6,
        }
    }

    pub fn color(self) -> [f64; 3] {
        match self {
            Side::West => [1.0, 0.0, 0.0],
            Side::East => [1.0, 1.0, 0.0],
            Side::South => [0.0, 1.0, 0.0],
            Side::North => [0.0, 1.0, 1.0],
            Side::Bottom => [1.0, 0.0, 1.0],
            Side::Top => [0.0, 0.0, 1.0],
        }
    }
}

/// Collect the outer envelope into the `Boundary_Faces` group and return the
/// face ids. Re-running reuses the existing group without duplicating ids.
pub fn extract_boundary_faces<S: MeshSink>(sink: &mut S) -> Vec<usize> {
    let envelope = sink.extract_envelope_faces();
    debug!("envelope holds {} faces", envelope.len());
    sink.create_group(GroupKind::Face, BOUNDARY_GROUP);
    sink.add_to_group(BOUNDARY_GROUP, &envelope);
    envelope
}

fn face_centroid<S: MeshSink>(sink: &S, face: usize) -> Point3 {
    let nodes = sink.face_nodes(face);
    let pts: [Point3; 4] = [
        sink.node_xyz(nodes[0]),
        sink.node_xyz(nodes[1]),
        sink.node_xyz(nodes[2]),
        sink.node_xyz(nodes[3]),
    ];
    geometry::centroid(&pts)
}

fn sorted_face_key(nodes: [usize; 4]) -> [usize; 4] {
    let mut key = nodes;
    key.sort_unstable();
    key
}

/// Map from sorted face key to the centroid of the volume owning that face,
/// built only when the exact-extremum pass leaves faces unclassified.
fn owner_centroids<S: MeshSink>(sink: &S) -> HashMap<[usize; 4], Point3> {
    let mut owners = HashMap::new();
    for volume in 0..sink.volume_count() {
        let conn = sink.volume_nodes(volume);
        let corners: [Point3; 8] = std::array::from_fn(|i| sink.node_xyz(conn[i]));
        let center = geometry::centroid(&corners);
        for pattern in &HEX_FACES {
            let key = sorted_face_key([
                conn[pattern[0]],
                conn[pattern[1]],
                conn[pattern[2]],
                conn[pattern[3]],
            ]);
            owners.insert(key, center);
        }
    }
    owners
}

/// Outward unit-direction classification of a single face by its dominant
/// normal component, oriented away from the owning volume's centroid.
fn side_by_normal<S: MeshSink>(
    sink: &S,
    face: usize,
    owners: &HashMap<[usize; 4], Point3>,
) -> Option<Side> {
    let nodes = sink.face_nodes(face);
    let p: [Point3; 4] = std::array::from_fn(|i| sink.node_xyz(nodes[i]));
    // Normal from the two diagonals; robust for planar and mildly warped quads.
    let d1 = [p[2][0] - p[0][0], p[2][1] - p[0][1], p[2][2] - p[0][2]];
    let d2 = [p[3][0] - p[1][0], p[3][1] - p[1][1], p[3][2] - p[1][2]];
    let mut normal = [
        d1[1] * d2[2] - d1[2] * d2[1],
        d1[2] * d2[0] - d1[0] * d2[2],
        d1[0] * d2[1] - d1[1] * d2[0],
    ];

    let owner = owners.get(&sorted_face_key(nodes))?;
    let centroid = geometry::centroid(&p);
    let outward = [
        centroid[0] - owner[0],
        centroid[1] - owner[1],
        centroid[2] - owner[2],
    ];
    if normal[0] * outward[0] + normal[1] * outward[1] + normal[2] * outward[2] < 0.0 {
        normal = [-normal[0], -normal[1], -normal[2]];
    }

    let mut axis = 0;
    for candidate in 1..3 {
        if normal[candidate].abs() > normal[axis].abs() {
            axis = candidate;
        }
    }
    let positive = normal[axis] > 0.0;
    Side::ALL
        .into_iter()
        .find(|s| s.axis() == axis && s.is_max() == positive)
}

/// Classify every envelope face into one of the six side groups.
///
/// A face belongs to a side when its centroid sits exactly on the bounding
/// box extremum of that side's axis. Faces that match no extremum (conformed
/// or extended meshes) fall back to dominant-outward-normal classification.
/// Sides that end up empty are skipped with a warning.
pub fn classify_sides<S: MeshSink>(sink: &mut S) -> Result<(), MeshError> {
    let envelope = extract_boundary_faces(sink);
    let bbox = sink.bounding_box();

    let mut assigned: HashMap<Side, Vec<usize>> = HashMap::new();
    let mut leftover = Vec::new();
    'faces: for &face in &envelope {
        let c = face_centroid(sink, face);
        for side in Side::ALL {
            let extremum = if side.is_max() {
                bbox.max(side.axis())
            } else {
                bbox.min(side.axis())
            };
            // Exact comparison is intentional: planar grid sides carry the
            // extremum coordinate bit-for-bit.
            if c[side.axis()] == extremum {
                assigned.entry(side).or_default().push(face);
                continue 'faces;
            }
        }
        leftover.push(face);
    }

    if !leftover.is_empty() {
        debug!(
            "{} faces off the bounding box, classifying by normal",
            leftover.len()
        );
        let owners = owner_centroids(sink);
        for face in leftover {
            match side_by_normal(sink, face, &owners) {
                Some(side) => assigned.entry(side).or_default().push(face),
                None => warn!("face {face} has no owning volume, left unclassified"),
            }
        }
    }

    for side in Side::ALL {
        let Some(ids) = assigned.get(&side) else {
            warn!("side {} has no faces, group skipped", side.name());
            continue;
        };
        let name = side.group_name();
        sink.create_group(GroupKind::Face, &name);
        sink.add_to_group(&name, ids);
        sink.set_group_color(&name, side.color_number(), side.color());
    }
    Ok(())
}

/// Options for polygon-driven zone classification.
#[derive(Clone, Debug)]
pub struct RegionOptions {
    /// Capture distances (dx, dy) around each region's vertices; a face whose
    /// centroid lies within `max(dx, dy)` of any vertex is captured even when
    /// it falls outside the polygon.
    pub max_distance: (f64, f64),
    /// Prefix of the created group names; groups are numbered from 0.
    pub group_prefix: String,
    /// Keep only the topmost face per (x, y) column of captured centroids.
    pub surface_only: bool,
    /// Seed for the per-group display colors.
    pub color_seed: u64,
}

impl Default for RegionOptions {
    fn default() -> Self {
        Self {
            max_distance: (0.0, 0.0),
            group_prefix: "Zone".to_string(),
            surface_only: false,
            color_seed: 0,
        }
    }
}

/// Assign envelope faces to zone groups defined by xy polygons.
///
/// Returns the number of groups created. The group counter advances only when
/// a region captures at least one face, so numbering stays gap-free.
pub fn classify_regions<S: MeshSink>(
    sink: &mut S,
    regions: &[Vec<Point3>],
    options: &RegionOptions,
) -> Result<usize, MeshError> {
    let envelope = extract_boundary_faces(sink);
    let capture = options.max_distance.0.max(options.max_distance.1);
    let mut rng = SmallRng::seed_from_u64(options.color_seed);
    let mut created = 0usize;

    for region in regions {
        let mut captured = Vec::new();
        let mut centroids = Vec::new();
        for &face in &envelope {
            let c = face_centroid(sink, face);
            let inside = geometry::point_in_polygon(c[0], c[1], region)
                || region.iter().any(|v| {
                    let dx = c[0] - v[0];
                    let dy = c[1] - v[1];
                    (dx * dx + dy * dy).sqrt() < capture
                });
            if inside {
                captured.push(face);
                centroids.push(c);
            }
        }

        if options.surface_only && !captured.is_empty() {
            captured = topmost_per_column(&captured, &centroids);
        }

        if captured.is_empty() {
            warn!("region with {} vertices captured no faces", region.len());
            continue;
        }

        let name = format!("{}{}", options.group_prefix, created);
        sink.create_group(GroupKind::Face, &name);
        sink.add_to_group(&name, &captured);
        let color = [rng.r#gen::<f64>(), rng.r#gen::<f64>(), rng.r#gen::<f64>()];
        sink.set_group_color(&name, (created + 1) as i32, color);
        created += 1;
    }
    Ok(created)
}

/// Keep, for each (x, y) column of centroids, only the face with the highest
/// centroid z.
fn topmost_per_column(faces: &[usize], centroids: &[Point3]) -> Vec<usize> {
    let columns = geometry::group_by_column(centroids, geometry::COLUMN_TOL);
    let mut kept = Vec::with_capacity(columns.len());
    for column in columns {
        let top = column
            .into_iter()
            .max_by(|&a, &b| centroids[a][2].total_cmp(&centroids[b][2]));
        if let Some(idx) = top {
            kept.push(faces[idx]);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{cartesian_grid_3d, linspace};
    use crate::sink::{populate_mesh, MemoryMesh};

    fn cube(n: usize) -> MemoryMesh {
        let axis = linspace(0.0, 1.0, n + 1);
        let (nodes, cells) = cartesian_grid_3d(&axis, &axis, &axis).unwrap();
        let mut mesh = MemoryMesh::new();
        populate_mesh(&mut mesh, &nodes, &cells).unwrap();
        mesh
    }

    #[test]
    fn six_sides_on_a_cube() {
        let mut mesh = cube(2);
        classify_sides(&mut mesh).unwrap();
        for side in Side::ALL {
            let group = mesh.group(&side.group_name()).unwrap();
            assert_eq!(group.ids.len(), 4, "{}", side.name());
            assert_eq!(group.color_number, Some(side.color_number()));
        }
        assert_eq!(mesh.group(BOUNDARY_GROUP).unwrap().ids.len(), 24);
    }

    #[test]
    fn west_faces_sit_at_min_x() {
        let mut mesh = cube(2);
        classify_sides(&mut mesh).unwrap();
        let west = mesh.group(&Side::West.group_name()).unwrap().ids.clone();
        for face in west {
            let c = face_centroid(&mesh, face);
            assert_eq!(c[0], 0.0);
        }
        let east = mesh.group(&Side::East.group_name()).unwrap().ids.clone();
        for face in east {
            let c = face_centroid(&mesh, face);
            assert_eq!(c[0], 1.0);
        }
    }

    #[test]
    fn normal_fallback_handles_shifted_sides() {
        // Slant the top surface so top/bottom centroids leave the bbox planes.
        let axis = linspace(0.0, 2.0, 3);
        let (mut nodes, cells) = cartesian_grid_3d(&axis, &axis, &axis).unwrap();
        for node in &mut nodes {
            if node[2] == 2.0 {
                node[2] += 0.3 * node[0];
            }
        }
        let mut mesh = MemoryMesh::new();
        populate_mesh(&mut mesh, &nodes, &cells).unwrap();
        classify_sides(&mut mesh).unwrap();
        let top = mesh.group(&Side::Top.group_name()).unwrap();
        assert_eq!(top.ids.len(), 4);
    }

    #[test]
    fn regions_capture_faces_and_number_groups() {
        let mut mesh = cube(2);
        // Covers the whole footprint and captures every top+bottom face and
        // all side faces whose centroid projects inside.
        let everywhere = vec![
            [-1.0, -1.0, 0.0],
            [2.0, -1.0, 0.0],
            [2.0, 2.0, 0.0],
            [-1.0, 2.0, 0.0],
        ];
        // Far away: captures nothing, so does not consume a number.
        let nowhere = vec![
            [10.0, 10.0, 0.0],
            [11.0, 10.0, 0.0],
            [11.0, 11.0, 0.0],
            [10.0, 11.0, 0.0],
        ];
        let options = RegionOptions::default();
        let count =
            classify_regions(&mut mesh, &[nowhere, everywhere.clone()], &options).unwrap();
        assert_eq!(count, 1);
        let zone = mesh.group("Zone0").unwrap();
        // color numbers are 1-based, matching the side groups
        assert_eq!(zone.color_number, Some(1));
        assert!(mesh.group("Zone1").is_none());
    }

    #[test]
    fn surface_only_keeps_topmost_face_per_column() {
        let mut mesh = cube(2);
        let everywhere = vec![
            [-1.0, -1.0, 0.0],
            [2.0, -1.0, 0.0],
            [2.0, 2.0, 0.0],
            [-1.0, 2.0, 0.0],
        ];
        let options = RegionOptions {
            surface_only: true,
            ..RegionOptions::default()
        };
        classify_regions(&mut mesh, &[everywhere], &options).unwrap();
        let zone = mesh.group("Zone0").unwrap();
        // Every captured column reduces to one face; the 4 top-surface
        // columns plus the side-face columns around the rim.
        for &face in &zone.ids {
            let c = face_centroid(&mesh, face);
            // No face below another captured face in the same column.
            for &other in &zone.ids {
                if other == face {
                    continue;
                }
                let oc = face_centroid(&mesh, other);
                if (oc[0] - c[0]).abs() < 1e-9 && (oc[1] - c[1]).abs() < 1e-9 {
                    panic!("two faces share a column");
                }
            }
        }
    }

    #[test]
    fn vertex_distance_captures_nearby_faces() {
        let mut mesh = cube(2);
        // A degenerate far polygon, but with a vertex near the west face.
        let region = vec![
            [-0.1, 0.25, 0.0],
            [-5.0, -5.0, 0.0],
            [-6.0, -5.0, 0.0],
        ];
        let miss = RegionOptions::default();
        assert_eq!(classify_regions(&mut mesh, &[region.clone()], &miss).unwrap(), 0);
        let near = RegionOptions {
            max_distance: (0.5, 0.5),
            ..RegionOptions::default()
        };
        assert_eq!(classify_regions(&mut mesh, &[region], &near).unwrap(), 1);
    }
}

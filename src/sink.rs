//! Mesh sink: the narrow contract through which grids are committed to a
//! host mesh kernel, plus an in-memory implementation.
//!
//! Generators never hold a live reference to a host kernel's internals; they
//! populate a [`MeshSink`] through opaque ids only. [`MemoryMesh`] is the
//! crate's own sink used by the importers, serializers, and tests.

use hashbrown::HashMap;
use log::debug;

use crate::error::MeshError;
use crate::geometry::{self, BoundingBox, Point3};
use crate::grid::HEX_FACES;

/// Kind of element group held by a sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupKind {
    Face,
    Volume,
}

/// A named group of element ids with optional display color and class tag.
///
/// Ids are unique within a group; one element may belong to several groups.
#[derive(Clone, Debug)]
pub struct FaceGroup {
    pub name: String,
    pub kind: GroupKind,
    pub ids: Vec<usize>,
    pub color: Option<[f64; 3]>,
    pub color_number: Option<i32>,
}

impl FaceGroup {
    fn new(kind: GroupKind, name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            ids: Vec::new(),
            color: None,
            color_number: None,
        }
    }
}

/// The mesh-building target populated by grid generators and importers.
///
/// All ids are 0-based and opaque. Faces of a volume MUST be added before the
/// volume itself so that boundary extraction can find them.
pub trait MeshSink {
    fn add_node(&mut self, x: f64, y: f64, z: f64) -> usize;
    fn add_face(&mut self, nodes: [usize; 4]) -> usize;
    fn add_volume(&mut self, nodes: [usize; 8]) -> usize;

    fn node_count(&self) -> usize;
    fn volume_count(&self) -> usize;
    fn node_xyz(&self, node: usize) -> Point3;
    fn face_nodes(&self, face: usize) -> [usize; 4];
    fn volume_nodes(&self, volume: usize) -> [usize; 8];
    fn bounding_box(&self) -> BoundingBox;

    /// Faces lying on the mesh's outer envelope (used by exactly one volume).
    fn extract_envelope_faces(&self) -> Vec<usize>;

    fn create_group(&mut self, kind: GroupKind, name: &str);
    fn add_to_group(&mut self, name: &str, ids: &[usize]);
    fn set_group_color(&mut self, name: &str, number: i32, color: [f64; 3]);
    fn group(&self, name: &str) -> Option<&FaceGroup>;
    /// Groups in creation order. Iteration order matters to serialization
    /// (boundary-tag precedence is "last group wins").
    fn groups(&self) -> &[FaceGroup];
    fn remove_group(&mut self, name: &str);
}

/// In-memory mesh: nodes, quad faces, hexahedral volumes, and named groups.
#[derive(Clone, Debug, Default)]
pub struct MemoryMesh {
    nodes: Vec<Point3>,
    faces: Vec<[usize; 4]>,
    volumes: Vec<[usize; 8]>,
    groups: Vec<FaceGroup>,
    face_index: HashMap<[usize; 4], usize>,
}

impl MemoryMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn group_mut(&mut self, name: &str) -> Option<&mut FaceGroup> {
        self.groups.iter_mut().find(|g| g.name == name)
    }
}

fn face_key(nodes: [usize; 4]) -> [usize; 4] {
    let mut key = nodes;
    key.sort_unstable();
    key
}

impl MeshSink for MemoryMesh {
    fn add_node(&mut self, x: f64, y: f64, z: f64) -> usize {
        self.nodes.push([x, y, z]);
        self.nodes.len() - 1
    }

    fn add_face(&mut self, nodes: [usize; 4]) -> usize {
        // Shared faces of adjacent volumes collapse to one id.
        let key = face_key(nodes);
        if let Some(&id) = self.face_index.get(&key) {
            return id;
        }
        self.faces.push(nodes);
        let id = self.faces.len() - 1;
        self.face_index.insert(key, id);
        id
    }

    fn add_volume(&mut self, nodes: [usize; 8]) -> usize {
        self.volumes.push(nodes);
        self.volumes.len() - 1
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn volume_count(&self) -> usize {
        self.volumes.len()
    }

    fn node_xyz(&self, node: usize) -> Point3 {
        self.nodes[node]
    }

    fn face_nodes(&self, face: usize) -> [usize; 4] {
        self.faces[face]
    }

    fn volume_nodes(&self, volume: usize) -> [usize; 8] {
        self.volumes[volume]
    }

    fn bounding_box(&self) -> BoundingBox {
        geometry::bounding_box(&self.nodes)
    }

    fn extract_envelope_faces(&self) -> Vec<usize> {
        let mut usage: HashMap<[usize; 4], usize> = HashMap::new();
        for volume in &self.volumes {
            for pattern in &HEX_FACES {
                let key = face_key([
                    volume[pattern[0]],
                    volume[pattern[1]],
                    volume[pattern[2]],
                    volume[pattern[3]],
                ]);
                *usage.entry(key).or_insert(0) += 1;
            }
        }
        let mut boundary: Vec<usize> = usage
            .iter()
            .filter(|&(_, &count)| count == 1)
            .filter_map(|(key, _)| self.face_index.get(key).copied())
            .collect();
        boundary.sort_unstable();
        boundary
    }

    fn create_group(&mut self, kind: GroupKind, name: &str) {
        if self.group(name).is_none() {
            self.groups.push(FaceGroup::new(kind, name));
        }
    }

    fn add_to_group(&mut self, name: &str, ids: &[usize]) {
        if let Some(group) = self.group_mut(name) {
            for &id in ids {
                if !group.ids.contains(&id) {
                    group.ids.push(id);
                }
            }
        }
    }

    fn set_group_color(&mut self, name: &str, number: i32, color: [f64; 3]) {
        if let Some(group) = self.group_mut(name) {
            group.color_number = Some(number);
            group.color = Some(color);
        }
    }

    fn group(&self, name: &str) -> Option<&FaceGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    fn groups(&self) -> &[FaceGroup] {
        &self.groups
    }

    fn remove_group(&mut self, name: &str) {
        self.groups.retain(|g| g.name != name);
    }
}

/// Populate a sink from a node array and hexahedral connectivity.
///
/// Adds every node, then for each cell its six faces (fixed local patterns)
/// followed by the volume, preserving the faces-before-volume lifecycle the
/// boundary extractor depends on. Out-of-range connectivity is a fatal input
/// error.
pub fn populate_mesh<S: MeshSink>(
    sink: &mut S,
    nodes: &[Point3],
    cells: &[[usize; 8]],
) -> Result<(), MeshError> {
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

    debug!("adding {} nodes", nodes.len());
    let base = sink.node_count();
    for node in nodes {
        sink.add_node(node[0], node[1], node[2]);
    }

    debug!("adding {} hexahedra", cells.len());
    for cell in cells {
        for pattern in &HEX_FACES {
            sink.add_face([
                base + cell[pattern[0]],
                base + cell[pattern[1]],
                base + cell[pattern[2]],
                base + cell[pattern[3]],
            ]);
        }
        let mut volume = [0usize; 8];
        for (slot, &node) in volume.iter_mut().zip(cell.iter()) {
            *slot = base + node;
        }
        sink.add_volume(volume);
    }
    Ok(())
}

/// Explicit handle for a preview mesh owned by an interactive caller.
///
/// Cleanup of a previously displayed preview goes through this value instead
/// of module-global state: the UI layer keeps the session and passes it back
/// when the preview is replaced or cancelled.
#[derive(Clone, Debug)]
pub struct PreviewSession {
    pub mesh_name: String,
    pub group_prefix: String,
}

impl PreviewSession {
    pub fn new(mesh_name: impl Into<String>, group_prefix: impl Into<String>) -> Self {
        Self {
            mesh_name: mesh_name.into(),
            group_prefix: group_prefix.into(),
        }
    }

    /// Remove every group created under this session's prefix.
    pub fn discard_groups<S: MeshSink>(&self, sink: &mut S) {
        let doomed: Vec<String> = sink
            .groups()
            .iter()
            .filter(|g| g.name.starts_with(&self.group_prefix))
            .map(|g| g.name.clone())
            .collect();
        for name in doomed {
            sink.remove_group(&name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::cartesian_grid_3d;

    fn unit_grid(nx: usize, ny: usize, nz: usize) -> MemoryMesh {
        let x = crate::grid::linspace(0.0, 1.0, nx + 1);
        let y = crate::grid::linspace(0.0, 1.0, ny + 1);
        let z = crate::grid::linspace(0.0, 1.0, nz + 1);
        let (nodes, cells) = cartesian_grid_3d(&x, &y, &z).unwrap();
        let mut mesh = MemoryMesh::new();
        populate_mesh(&mut mesh, &nodes, &cells).unwrap();
        mesh
    }

    #[test]
    fn populate_counts() {
        let mesh = unit_grid(2, 1, 1);
        assert_eq!(mesh.node_count(), 12);
        assert_eq!(mesh.volume_count(), 2);
        // 2 cells x 6 faces with 1 shared interior face
        assert_eq!(mesh.face_count(), 11);
    }

    #[test]
    fn envelope_excludes_interior_faces() {
        let mesh = unit_grid(2, 2, 2);
        let envelope = mesh.extract_envelope_faces();
        // 6 sides x 4 faces on a 2x2x2 grid
        assert_eq!(envelope.len(), 24);
    }

    #[test]
    fn out_of_range_connectivity_is_fatal() {
        let mut mesh = MemoryMesh::new();
        let nodes = vec![[0.0, 0.0, 0.0]; 4];
        let cells = vec![[0, 1, 2, 3, 4, 5, 6, 7]];
        let err = populate_mesh(&mut mesh, &nodes, &cells).unwrap_err();
        assert!(matches!(err, MeshError::NodeIndexOutOfRange { .. }));
    }

    #[test]
    fn group_ids_stay_unique() {
        let mut mesh = unit_grid(1, 1, 1);
        mesh.create_group(GroupKind::Face, "g");
        mesh.add_to_group("g", &[1, 2, 2, 3]);
        mesh.add_to_group("g", &[3, 4]);
        assert_eq!(mesh.group("g").unwrap().ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn preview_session_discards_prefixed_groups() {
        let mut mesh = unit_grid(1, 1, 1);
        mesh.create_group(GroupKind::Face, "Zone0");
        mesh.create_group(GroupKind::Face, "Zone1");
        mesh.create_group(GroupKind::Face, "Boundary_Faces");
        let session = PreviewSession::new("Grid", "Zone");
        session.discard_groups(&mut mesh);
        assert!(mesh.group("Zone0").is_none());
        assert!(mesh.group("Zone1").is_none());
        assert!(mesh.group("Boundary_Faces").is_some());
    }
}

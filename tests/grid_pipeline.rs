//! End-to-end grid construction: build, commit, classify, snapshot.

use hexmesh::boundary::{classify_regions, classify_sides, RegionOptions, Side, BOUNDARY_GROUP};
use hexmesh::grid::{cartesian_grid_3d, linspace};
use hexmesh::io::MeshSnapshot;
use hexmesh::sink::{populate_mesh, GroupKind, MemoryMesh, MeshSink, PreviewSession};

fn classified_box() -> MemoryMesh {
    let x = linspace(0.0, 2.0, 3);
    let y = linspace(0.0, 1.0, 2);
    let z = linspace(0.0, 1.0, 2);
    let (nodes, cells) = cartesian_grid_3d(&x, &y, &z).unwrap();
    let mut mesh = MemoryMesh::new();
    populate_mesh(&mut mesh, &nodes, &cells).unwrap();
    classify_sides(&mut mesh).unwrap();
    mesh
}

#[test]
fn box_grid_builds_and_classifies() {
    let mesh = classified_box();
    assert_eq!(mesh.node_count(), 12);
    assert_eq!(mesh.volume_count(), 2);

    // 2x1x1 box: every face is on the envelope except the shared one
    assert_eq!(mesh.group(BOUNDARY_GROUP).unwrap().ids.len(), 10);
    assert_eq!(mesh.group("Westside_Faces").unwrap().ids.len(), 1);
    assert_eq!(mesh.group("Eastside_Faces").unwrap().ids.len(), 1);
    assert_eq!(mesh.group("Southside_Faces").unwrap().ids.len(), 2);
    assert_eq!(mesh.group("Northside_Faces").unwrap().ids.len(), 2);
    assert_eq!(mesh.group("Bottomside_Faces").unwrap().ids.len(), 2);
    assert_eq!(mesh.group("Topside_Faces").unwrap().ids.len(), 2);

    for side in Side::ALL {
        let group = mesh.group(&side.group_name()).unwrap();
        assert_eq!(group.color_number, Some(side.color_number()));
        assert!(group.color.is_some());
    }
}

#[test]
fn zone_classification_over_half_the_footprint() {
    let mut mesh = classified_box();
    // only the western cell's footprint
    let west_half = vec![
        [-0.5, -0.5, 0.0],
        [1.0, -0.5, 0.0],
        [1.0, 1.5, 0.0],
        [-0.5, 1.5, 0.0],
    ];
    let options = RegionOptions {
        group_prefix: "Recharge".to_string(),
        surface_only: true,
        ..RegionOptions::default()
    };
    let created = classify_regions(&mut mesh, &[west_half], &options).unwrap();
    assert_eq!(created, 1);
    let zone = mesh.group("Recharge0").unwrap();
    assert!(!zone.ids.is_empty());

    // same seed, same colors on a rerun
    let mut rerun = classified_box();
    let west_half = vec![
        [-0.5, -0.5, 0.0],
        [1.0, -0.5, 0.0],
        [1.0, 1.5, 0.0],
        [-0.5, 1.5, 0.0],
    ];
    classify_regions(&mut rerun, &[west_half], &options).unwrap();
    assert_eq!(
        mesh.group("Recharge0").unwrap().color,
        rerun.group("Recharge0").unwrap().color
    );
}

#[test]
fn snapshot_carries_every_face_group() {
    let mesh = classified_box();
    let snapshot = MeshSnapshot::from_sink(&mesh);
    assert_eq!(snapshot.nodes.len(), 12);
    assert_eq!(snapshot.cells.len(), 2);
    let names: Vec<&str> = snapshot.boundaries.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names[0], BOUNDARY_GROUP);
    assert!(names.contains(&"Topside_Faces"));
}

#[test]
fn preview_groups_are_disposable() {
    let mut mesh = classified_box();
    mesh.create_group(GroupKind::Face, "Preview_A");
    mesh.create_group(GroupKind::Face, "Preview_B");
    let session = PreviewSession::new("Grid", "Preview_");
    session.discard_groups(&mut mesh);
    assert!(mesh.group("Preview_A").is_none());
    assert!(mesh.group(BOUNDARY_GROUP).is_some());
}

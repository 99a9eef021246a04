//! Serialization checks over real files: format dispatch, byte-level
//! anchors, and a UNV round trip.

use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

use hexmesh::boundary::classify_sides;
use hexmesh::grid::{cartesian_grid_3d, linspace};
use hexmesh::io::{unv, MeshSnapshot, OutputFormat, write_mesh};
use hexmesh::sink::{populate_mesh, MemoryMesh};

fn tmp(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("hexmesh-export-{name}"))
}

fn snapshot() -> MeshSnapshot {
    let x = linspace(0.0, 2.0, 3);
    let y = linspace(0.0, 1.0, 2);
    let z = linspace(0.0, 1.0, 2);
    let (nodes, cells) = cartesian_grid_3d(&x, &y, &z).unwrap();
    let mut mesh = MemoryMesh::new();
    populate_mesh(&mut mesh, &nodes, &cells).unwrap();
    classify_sides(&mut mesh).unwrap();
    MeshSnapshot::from_sink(&mesh)
}

#[test]
fn every_format_writes_through_the_dispatcher() {
    let snapshot = snapshot();
    let mesh = snapshot.view();

    let unv_path = tmp("box.unv");
    write_mesh(OutputFormat::Unv, &unv_path, &mesh).unwrap();
    let text = fs::read_to_string(&unv_path).unwrap();
    assert!(text.starts_with("    -1\n   164\n"));
    assert!(text.contains("Region_1"));

    let mfem_path = tmp("box.mesh");
    write_mesh(OutputFormat::Mfem, &mfem_path, &mesh).unwrap();
    let text = fs::read_to_string(&mfem_path).unwrap();
    assert!(text.contains("MFEM mesh v1.0"));
    assert!(text.contains("elements\n2\n"));
    assert!(text.contains("vertices\n12\n3\n"));
    // classified mesh carries boundary patches
    assert!(text.contains("boundary\n"));

    let vtk_path = tmp("box.vtk");
    write_mesh(OutputFormat::Vtk, &vtk_path, &mesh).unwrap();
    let text = fs::read_to_string(&vtk_path).unwrap();
    assert!(text.contains("CELLS  2 18\n"));
    assert!(text.contains("CELL_TYPES  2\n"));
    assert!(text.contains("POINT_DATA  12\n"));

    let base = tmp("box.datablock");
    write_mesh(OutputFormat::Datablock, &base, &mesh).unwrap();
    let coords = fs::read_to_string(base.with_extension("coords")).unwrap();
    assert!(coords.starts_with("# node-ID x y z bdr-ID\n"));
    let lnods = fs::read_to_string(base.with_extension("lnods")).unwrap();
    assert!(lnods.starts_with("# elem-ID mat elem-type conn... \n"));
    assert!(lnods.contains(" hex "));
}

#[test]
fn format_extensions() {
    assert_eq!(OutputFormat::Unv.extension(), "unv");
    assert_eq!(OutputFormat::Mfem.extension(), "mesh");
    assert_eq!(OutputFormat::Datablock.extension(), "coords");
    assert_eq!(OutputFormat::Vtk.extension(), "vtk");
}

#[test]
fn unv_round_trip_over_a_sheared_grid() {
    let x = linspace(0.0, 3.0, 4);
    let y = linspace(0.0, 2.0, 3);
    let z = linspace(-10.0, 0.0, 3);
    let (mut nodes, cells) = cartesian_grid_3d(&x, &y, &z).unwrap();
    for node in &mut nodes {
        node[2] += 0.37 * node[0] - 0.11 * node[1];
    }
    let snapshot = MeshSnapshot {
        nodes,
        cells,
        boundaries: Vec::new(),
        materials: None,
    };

    let mut buffer = Vec::new();
    unv::write_unv(&mut buffer, &snapshot.view()).unwrap();
    let parsed = unv::read_unv(Cursor::new(buffer)).unwrap();

    assert_eq!(parsed.cells, snapshot.cells);
    assert_eq!(parsed.nodes.len(), snapshot.nodes.len());
    for (a, b) in parsed.nodes.iter().zip(snapshot.nodes.iter()) {
        for axis in 0..3 {
            assert!((a[axis] - b[axis]).abs() < 1e-9);
        }
    }
}

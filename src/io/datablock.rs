//! Datablock format: a `.coords` node table and a `.lnods` connectivity
//! table, both line-oriented whitespace-separated text.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::error::{MeshError, ParseError};
use crate::geometry::Point3;

use super::ExportMesh;

const COORDS_HEADER: &str = "# node-ID x y z bdr-ID\n";
const LNODS_HEADER: &str = "# elem-ID mat elem-type conn... \n";

/// Write the `.coords` table: 1-based node id, coordinates, boundary tag.
pub fn write_coords<W: Write>(w: &mut W, mesh: &ExportMesh) -> Result<(), MeshError> {
    write!(w, "{COORDS_HEADER}")?;
    let tags = mesh.node_boundary_tags();
    for (n, node) in mesh.nodes.iter().enumerate() {
        write!(w, "{}", n + 1)?;
        for x in node {
            write!(w, " {x}")?;
        }
        writeln!(w, " {}", tags[n])?;
    }
    Ok(())
}

/// Write the `.lnods` table: 1-based element id, material, element type,
/// 1-based connectivity.
pub fn write_lnods<W: Write>(w: &mut W, mesh: &ExportMesh) -> Result<(), MeshError> {
    write!(w, "{LNODS_HEADER}")?;
    for (c, cell) in mesh.cells.iter().enumerate() {
        write!(w, "{} {} hex", c + 1, mesh.material(c))?;
        for &node in cell {
            write!(w, " {}", node + 1)?;
        }
        writeln!(w)?;
    }
    writeln!(w)?;
    Ok(())
}

fn open(path: &Path) -> Result<BufReader<File>, MeshError> {
    if !path.exists() {
        return Err(ParseError::FileNotFound(path.to_path_buf()).into());
    }
    Ok(BufReader::new(File::open(path)?))
}

/// Read a `.coords` table.
///
/// Accepts the crate's own five-column layout (`id x y z tag`) as well as
/// bare three-column `x y z` tables produced by other tools. Returns the
/// node array and per-node boundary tags (0 when the column is absent).
pub fn read_coords(path: &Path) -> Result<(Vec<Point3>, Vec<i64>), MeshError> {
    let reader = open(path)?;
    let mut nodes = Vec::new();
    let mut tags = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        let (xyz, tag) = match tokens.len() {
            3 => (&tokens[0..3], 0i64),
            4 => (&tokens[1..4], 0i64),
            5 => (
                &tokens[1..4],
                tokens[4]
                    .parse()
                    .map_err(|_| ParseError::malformed(lineno + 1, "bad boundary tag"))?,
            ),
            n => {
                return Err(
                    ParseError::malformed(lineno + 1, format!("expected 3-5 columns, got {n}"))
                        .into(),
                )
            }
        };
        let mut point = [0.0f64; 3];
        for (slot, token) in point.iter_mut().zip(xyz.iter()) {
            *slot = token
                .parse()
                .map_err(|_| ParseError::malformed(lineno + 1, format!("bad coordinate `{token}`")))?;
        }
        nodes.push(point);
        tags.push(tag);
    }
    Ok((nodes, tags))
}

/// Read a `.lnods` table.
///
/// Accepts the crate's own layout (`id mat hex n1..n8`) and bare eight-column
/// connectivity tables. Node ids on disk are 1-based. Returns the cells and
/// per-cell materials (1 when the column is absent).
pub fn read_lnods(path: &Path) -> Result<(Vec<[usize; 8]>, Vec<i64>), MeshError> {
    let reader = open(path)?;
    let mut cells = Vec::new();
    let mut materials = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        let (conn, mat) = match tokens.len() {
            8 => (&tokens[0..8], 1i64),
            11 if tokens[2] == "hex" => (
                &tokens[3..11],
                tokens[1]
                    .parse()
                    .map_err(|_| ParseError::malformed(lineno + 1, "bad material id"))?,
            ),
            n => {
                return Err(ParseError::malformed(
                    lineno + 1,
                    format!("expected 8 or 11 columns, got {n}"),
                )
                .into())
            }
        };
        let mut cell = [0usize; 8];
        for (slot, token) in cell.iter_mut().zip(conn.iter()) {
            let id: usize = token
                .parse()
                .map_err(|_| ParseError::malformed(lineno + 1, format!("bad node id `{token}`")))?;
            if id == 0 {
                return Err(ParseError::malformed(lineno + 1, "node ids are 1-based").into());
            }
            *slot = id - 1;
        }
        cells.push(cell);
        materials.push(mat);
    }
    Ok((cells, materials))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{cartesian_grid_3d, linspace};
    use std::io::Write as _;

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("hexmesh-datablock-{name}"));
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn coords_layout() {
        let nodes = vec![[0.0, 0.5, 1.0], [2.0, 0.0, -1.0]];
        let cells: Vec<[usize; 8]> = Vec::new();
        let mesh = ExportMesh::new(&nodes, &cells);
        let mut out = Vec::new();
        write_coords(&mut out, &mesh).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "# node-ID x y z bdr-ID\n1 0 0.5 1 0\n2 2 0 -1 0\n"
        );
    }

    #[test]
    fn lnods_layout() {
        let nodes = vec![[0.0; 3]; 8];
        let cells = vec![[0, 1, 2, 3, 4, 5, 6, 7]];
        let mesh = ExportMesh::new(&nodes, &cells);
        let mut out = Vec::new();
        write_lnods(&mut out, &mesh).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "# elem-ID mat elem-type conn... \n1 1 hex 1 2 3 4 5 6 7 8\n\n"
        );
    }

    #[test]
    fn round_trip_through_files() {
        let x = linspace(0.0, 2.0, 3);
        let y = linspace(0.0, 1.0, 2);
        let z = linspace(0.0, 1.0, 2);
        let (nodes, cells) = cartesian_grid_3d(&x, &y, &z).unwrap();
        let mesh = ExportMesh::new(&nodes, &cells);

        let mut coords_out = Vec::new();
        write_coords(&mut coords_out, &mesh).unwrap();
        let coords_path = temp_file("rt.coords", &String::from_utf8(coords_out).unwrap());
        let mut lnods_out = Vec::new();
        write_lnods(&mut lnods_out, &mesh).unwrap();
        let lnods_path = temp_file("rt.lnods", &String::from_utf8(lnods_out).unwrap());

        let (read_nodes, tags) = read_coords(&coords_path).unwrap();
        let (read_cells, materials) = read_lnods(&lnods_path).unwrap();
        assert_eq!(read_nodes, nodes);
        assert_eq!(tags, vec![0; nodes.len()]);
        assert_eq!(read_cells, cells);
        assert_eq!(materials, vec![1; cells.len()]);
    }

    #[test]
    fn bare_three_column_coords_are_accepted() {
        let path = temp_file("bare.coords", "0.0 1.0 2.0\n3.0 4.0 5.0\n");
        let (nodes, tags) = read_coords(&path).unwrap();
        assert_eq!(nodes, vec![[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]]);
        assert_eq!(tags, vec![0, 0]);
    }

    #[test]
    fn bare_connectivity_is_accepted() {
        let path = temp_file("bare.lnods", "1 2 3 4 5 6 7 8\n");
        let (cells, materials) = read_lnods(&path).unwrap();
        assert_eq!(cells, vec![[0, 1, 2, 3, 4, 5, 6, 7]]);
        assert_eq!(materials, vec![1]);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = read_coords(Path::new("/nonexistent/file.coords")).unwrap_err();
        assert!(matches!(
            err,
            MeshError::Parse(ParseError::FileNotFound(_))
        ));
    }

    #[test]
    fn malformed_line_carries_its_number() {
        let path = temp_file("bad.coords", "# header\n1 2\n");
        let err = read_coords(&path).unwrap_err();
        match err {
            MeshError::Parse(ParseError::Malformed { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }
}

//! I-DEAS universal file (UNV) writer and reader.
//!
//! Datasets written: 164 (units), 2420 (coordinate system), 2411 (nodes),
//! 2412 (elements, FE descriptor 115 = linear hexahedron), 2467 (element
//! groups, one per material). Field widths and the `E+NN` float notation are
//! part of the format contract.

use std::io::{BufRead, Write};

use itertools::Itertools;

use crate::error::{MeshError, ParseError};
use crate::geometry::Point3;

use super::ExportMesh;

const SEP: &str = "    -1";
const DS_UNITS: u32 = 164;
const DS_COORDSYS: u32 = 2420;
const DS_NODES: u32 = 2411;
const DS_ELEMENTS: u32 = 2412;
const DS_GROUPS: u32 = 2467;

/// FE descriptor id of the 8-node linear brick.
const HEX8: u64 = 115;

/// Fixed-width scientific notation with a signed two-digit exponent, the
/// `%25.16E`-style layout the format requires. The standard `{:E}` formatter
/// emits neither the `+` sign nor the zero padding.
fn sci(value: f64, width: usize, precision: usize) -> String {
    let formatted = format!("{value:.precision$e}");
    let mut parts = formatted.splitn(2, 'e');
    let mantissa = parts.next().unwrap_or_default();
    let exponent: i32 = parts.next().and_then(|e| e.parse().ok()).unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!(
        "{:>width$}",
        format!("{mantissa}E{sign}{:02}", exponent.abs())
    )
}

/// Serialize `mesh` as a UNV stream.
pub fn write_unv<W: Write>(w: &mut W, mesh: &ExportMesh) -> Result<(), MeshError> {
    // units
    writeln!(w, "{SEP}")?;
    writeln!(w, "{DS_UNITS:>6}")?;
    writeln!(w, "{:>10}{:<20}{:>10}", 1, "SI: Meters (newton)", 2)?;
    writeln!(
        w,
        "{}{}{}\n{}",
        sci(1.0, 25, 17),
        sci(1.0, 25, 17),
        sci(1.0, 25, 17),
        sci(273.15, 25, 17)
    )?;
    writeln!(w, "{SEP}")?;

    // coordinate system
    writeln!(w, "{SEP}")?;
    writeln!(w, "{DS_COORDSYS:>6}")?;
    writeln!(w, "{:>10}", 1)?;
    writeln!(w, "{:<40}", "Structured hexahedral mesh")?;
    writeln!(w, "{:>10}{:>10}{:>10}", 1, 0, 0)?;
    writeln!(w, "{:<40}", "Global cartesian coord. system")?;
    for row in [
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [0.0, 0.0, 0.0],
    ] {
        writeln!(
            w,
            "{}{}{}",
            sci(row[0], 25, 16),
            sci(row[1], 25, 16),
            sci(row[2], 25, 16)
        )?;
    }
    writeln!(w, "{SEP}")?;

    // nodes
    writeln!(w, "{SEP}")?;
    writeln!(w, "{DS_NODES:>6}")?;
    for (n, node) in mesh.nodes.iter().enumerate() {
        writeln!(w, "{:>10}{:>10}{:>10}{:>10}", n + 1, 1, 1, 11)?;
        writeln!(
            w,
            "{}{}{}",
            sci(node[0], 25, 16),
            sci(node[1], 25, 16),
            sci(node[2], 25, 16)
        )?;
    }
    writeln!(w, "{SEP}")?;

    // elements
    writeln!(w, "{SEP}")?;
    writeln!(w, "{DS_ELEMENTS:>6}")?;
    for (c, cell) in mesh.cells.iter().enumerate() {
        let mat = mesh.material(c);
        writeln!(
            w,
            "{:>10}{:>10}{:>10}{:>10}{:>10}{:>10}",
            c + 1,
            HEX8,
            mat,
            mat,
            mat,
            8
        )?;
        for &node in cell {
            write!(w, "{:>10}", node + 1)?;
        }
        writeln!(w)?;
    }
    writeln!(w, "{SEP}")?;

    // element groups, one per material
    writeln!(w, "{SEP}")?;
    writeln!(w, "{DS_GROUPS:>6}")?;
    let regions: Vec<i64> = (0..mesh.cells.len())
        .map(|c| mesh.material(c))
        .sorted_unstable()
        .dedup()
        .collect();
    for region in regions {
        let members: Vec<usize> = (0..mesh.cells.len())
            .filter(|&c| mesh.material(c) == region)
            .collect();
        writeln!(
            w,
            "{:>10}{:>10}{:>10}{:>10}{:>10}{:>10}{:>10}{:>10}",
            region,
            0,
            0,
            0,
            0,
            0,
            0,
            members.len()
        )?;
        writeln!(w, "Region_{region}")?;
        let mut column = 0;
        for cell in members {
            write!(w, "{:>10}{:>10}{:>10}{:>10}", 8, cell + 1, 0, 0)?;
            column += 1;
            if column == 2 {
                column = 0;
                writeln!(w)?;
            }
        }
        if column == 1 {
            writeln!(w)?;
        }
    }
    writeln!(w, "{SEP}")?;
    Ok(())
}

/// Mesh contents recovered from a UNV stream.
#[derive(Clone, Debug, Default)]
pub struct UnvMesh {
    pub nodes: Vec<Point3>,
    pub cells: Vec<[usize; 8]>,
    pub materials: Vec<i64>,
}

/// Parse the node and hexahedron datasets of a UNV stream.
///
/// Datasets other than 2411 and 2412 are skipped; non-hexahedral elements
/// are rejected. Node records may appear in any id order.
pub fn read_unv<R: BufRead>(reader: R) -> Result<UnvMesh, MeshError> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        lines.push(line?);
    }

    let mut mesh = UnvMesh::default();
    let mut nodes: Vec<(u64, Point3)> = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if lines[i].trim() != "-1" {
            i += 1;
            continue;
        }
        i += 1;
        let Some(code_line) = lines.get(i) else { break };
        let code: u32 = code_line
            .trim()
            .parse()
            .map_err(|_| ParseError::malformed(i + 1, "expected a dataset code"))?;
        i += 1;
        let block_start = i;
        while i < lines.len() && lines[i].trim() != "-1" {
            i += 1;
        }
        let block = &lines[block_start..i];
        i += 1; // closing separator
        match code {
            DS_NODES => parse_nodes(block, block_start, &mut nodes)?,
            DS_ELEMENTS => parse_elements(block, block_start, &mut mesh)?,
            _ => {}
        }
    }

    nodes.sort_by_key(|&(id, _)| id);
    mesh.nodes = nodes.into_iter().map(|(_, xyz)| xyz).collect();
    Ok(mesh)
}

fn parse_nodes(
    block: &[String],
    offset: usize,
    nodes: &mut Vec<(u64, Point3)>,
) -> Result<(), MeshError> {
    for pair in block.chunks(2) {
        if pair.len() < 2 {
            return Err(ParseError::malformed(offset + 1, "truncated node record").into());
        }
        let id: u64 = pair[0]
            .split_whitespace()
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| ParseError::malformed(offset + 1, "bad node id"))?;
        let coords: Vec<f64> = pair[1]
            .split_whitespace()
            .map(|t| t.parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| ParseError::malformed(offset + 2, e.to_string()))?;
        if coords.len() != 3 {
            return Err(ParseError::malformed(offset + 2, "expected 3 coordinates").into());
        }
        nodes.push((id, [coords[0], coords[1], coords[2]]));
    }
    Ok(())
}

fn parse_elements(
    block: &[String],
    offset: usize,
    mesh: &mut UnvMesh,
) -> Result<(), MeshError> {
    for pair in block.chunks(2) {
        if pair.len() < 2 {
            return Err(ParseError::malformed(offset + 1, "truncated element record").into());
        }
        let header: Vec<i64> = pair[0]
            .split_whitespace()
            .map(|t| t.parse::<i64>())
            .collect::<Result<_, _>>()
            .map_err(|e| ParseError::malformed(offset + 1, e.to_string()))?;
        if header.len() < 6 {
            return Err(ParseError::malformed(offset + 1, "short element header").into());
        }
        if header[1] != HEX8 as i64 {
            return Err(ParseError::malformed(
                offset + 1,
                format!("unsupported FE descriptor {}", header[1]),
            )
            .into());
        }
        let conn: Vec<usize> = pair[1]
            .split_whitespace()
            .map(|t| t.parse::<usize>())
            .collect::<Result<_, _>>()
            .map_err(|e| ParseError::malformed(offset + 2, e.to_string()))?;
        if conn.len() != 8 {
            return Err(ParseError::malformed(offset + 2, "expected 8 node ids").into());
        }
        let mut cell = [0usize; 8];
        for (slot, &id) in cell.iter_mut().zip(conn.iter()) {
            if id == 0 {
                return Err(ParseError::malformed(offset + 2, "node ids are 1-based").into());
            }
            *slot = id - 1;
        }
        mesh.cells.push(cell);
        mesh.materials.push(header[2]);
    }
    Ok(())
}

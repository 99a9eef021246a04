//! Readers for region polygons and scattered surface points.
//!
//! Both formats are id-first tables with one header line: regions carry
//! `id x y` rows, surface samples `id x y z` rows. `.txt` files are
//! whitespace-separated, `.csv` comma-separated. Shapefiles are recognized
//! but not parsed.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{MeshError, ParseError};
use crate::geometry::Point3;

fn delimiter_for(path: &Path) -> Result<Option<char>, MeshError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "txt" | "dat" => Ok(None),
        "csv" => Ok(Some(',')),
        other => Err(ParseError::UnsupportedExtension(other.to_string()).into()),
    }
}

fn read_table(path: &Path, columns: usize) -> Result<Vec<Vec<f64>>, MeshError> {
    let delimiter = delimiter_for(path)?;
    if !path.exists() {
        return Err(ParseError::FileNotFound(path.to_path_buf()).into());
    }
    let reader = BufReader::new(File::open(path)?);

    let mut rows = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if lineno == 0 {
            continue; // header
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let tokens: Vec<&str> = match delimiter {
            Some(d) => trimmed.split(d).map(str::trim).collect(),
            None => trimmed.split_whitespace().collect(),
        };
        // id column plus the requested value columns
        if tokens.len() < columns + 1 {
            return Err(ParseError::malformed(
                lineno + 1,
                format!("expected {} columns, got {}", columns + 1, tokens.len()),
            )
            .into());
        }
        let mut row = Vec::with_capacity(columns);
        for token in &tokens[1..=columns] {
            row.push(token.parse::<f64>().map_err(|_| {
                ParseError::malformed(lineno + 1, format!("bad value `{token}`"))
            })?);
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Read one region polygon: ordered xy vertices at z = 0.
pub fn read_regions(path: &Path) -> Result<Vec<Point3>, MeshError> {
    let rows = read_table(path, 2)?;
    Ok(rows.into_iter().map(|r| [r[0], r[1], 0.0]).collect())
}

/// Read scattered surface samples: x, y, elevation.
pub fn read_surface_points(path: &Path) -> Result<Vec<Point3>, MeshError> {
    let rows = read_table(path, 3)?;
    Ok(rows.into_iter().map(|r| [r[0], r[1], r[2]]).collect())
}

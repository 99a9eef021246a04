//! Unified error types for hexmesh public APIs.
//!
//! Every fallible operation in the crate returns [`MeshError`]. Degenerate
//! geometry that the pipeline can survive (non-positive cell volumes, pinched
//! pillars) is reported through `log::warn!` instead and never surfaces here.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for hexmesh operations.
#[derive(Debug, Error)]
pub enum MeshError {
    /// Malformed grid axes or degenerate input geometry. Fatal to the call.
    #[error("invalid domain: {0}")]
    InvalidDomain(String),
    /// A requested boundary side/group was never created on the mesh.
    #[error("boundary group `{0}` not found")]
    MissingBoundaryGroup(String),
    /// The scattered-data interpolation collaborator failed.
    #[error("interpolation failed: {0}")]
    Interpolation(String),
    /// A cell references a node index outside the node array.
    #[error("cell {cell} references node {node}, but only {nodes} nodes exist")]
    NodeIndexOutOfRange {
        cell: usize,
        node: usize,
        nodes: usize,
    },
    /// Text input could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// File I/O failure; propagated to the immediate caller.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Parse failures for the text formats the crate consumes.
///
/// Distinguishes "file not found", "malformed contents", and "unsupported
/// extension" so callers can react instead of receiving a silent empty result.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("malformed contents at line {line}: {message}")]
    Malformed { line: usize, message: String },
    #[error("unsupported file extension: `{0}`")]
    UnsupportedExtension(String),
}

impl ParseError {
    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        ParseError::Malformed {
            line,
            message: message.into(),
        }
    }
}

//! Error types for the PowerTree engine.
//!
//! This module provides a unified error type [`PowerTreeError`] that covers
//! every fallible operation: tree editing, snapshot loading and file I/O.
//!
//! Electrical problems (a regulator asked for too much current, an input
//! voltage out of range, ...) are *not* errors. They are reported as
//! [`Diagnostic`](crate::check::Diagnostic)s and never abort a computation.

use thiserror::Error;

use crate::check::{Diagnostic, DiagnosticCode};
use crate::stage::StageId;

/// Result type alias using [`PowerTreeError`].
pub type Result<T> = std::result::Result<T, PowerTreeError>;

/// Unified error type for all PowerTree operations.
#[derive(Error, Debug)]
pub enum PowerTreeError {
    // ============ Tree Editing Errors ============
    /// A mutation would break a tree invariant
    #[error(transparent)]
    Structural(#[from] StructuralError),

    // ============ Snapshot Errors ============
    /// A snapshot document could not be turned into a tree
    #[error(transparent)]
    Format(#[from] FormatError),

    // ============ I/O Errors ============
    /// Error reading a snapshot file
    #[error("Failed to read snapshot file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error writing a snapshot file
    #[error("Failed to write snapshot file '{path}': {source}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error writing a report
    #[error("Report output error: {message}")]
    ReportError { message: String },

    // ============ WASM Errors ============
    /// WASM-specific error
    #[cfg(feature = "wasm")]
    #[error("WASM error: {message}")]
    WasmError { message: String },
}

impl PowerTreeError {
    /// The structural diagnostic code, if this is a structural error.
    pub fn diagnostic_code(&self) -> Option<DiagnosticCode> {
        match self {
            Self::Structural(e) => e.code(),
            _ => None,
        }
    }
}

/// Rejection of a tree mutation.
///
/// The tree is always left exactly as it was before the rejected call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructuralError {
    /// Stage id not present in the tree
    #[error("Stage '{id}' not found in tree")]
    NodeNotFound { id: StageId },

    /// Stage id already used by another stage
    #[error("Duplicate stage id '{id}'")]
    DuplicateNode { id: StageId },

    /// The edge would close a loop
    #[error("Connecting '{parent}' -> '{child}' would create a cycle")]
    Cycle { parent: StageId, child: StageId },

    /// The child is already fed by another stage
    #[error("Stage '{child}' is already powered by '{existing}'")]
    MultiParent { child: StageId, existing: StageId },

    /// Loads have no output rail
    #[error("Load '{parent}' has no output rail to connect '{child}' to")]
    LoadOutput { parent: StageId, child: StageId },

    /// Sources are always roots
    #[error("Source '{child}' cannot be powered by '{parent}'")]
    SourceInput { parent: StageId, child: StageId },

    /// Plain removal would orphan children
    #[error("Stage '{id}' still powers {children} stage(s); remove the subtree instead")]
    HasChildren { id: StageId, children: usize },

    /// A kind change would break the edges already attached to the stage
    #[error("Stage '{id}' cannot become a {kind}: {message}")]
    KindConflict {
        id: StageId,
        kind: &'static str,
        message: String,
    },
}

impl StructuralError {
    /// Map the rejection onto the diagnostic taxonomy.
    ///
    /// Lookup and bookkeeping failures (unknown or duplicate ids, removal
    /// policy) have no diagnostic counterpart.
    pub fn code(&self) -> Option<DiagnosticCode> {
        match self {
            Self::Cycle { .. } => Some(DiagnosticCode::StructuralCycle),
            Self::MultiParent { .. } => Some(DiagnosticCode::MultiParent),
            Self::LoadOutput { .. } | Self::SourceInput { .. } | Self::KindConflict { .. } => {
                Some(DiagnosticCode::InvalidEdge)
            }
            Self::NodeNotFound { .. } | Self::DuplicateNode { .. } | Self::HasChildren { .. } => {
                None
            }
        }
    }

    /// Express the rejection as a structural ERROR diagnostic.
    pub fn to_diagnostic(&self) -> Option<Diagnostic> {
        let code = self.code()?;
        let node = match self {
            Self::MultiParent { child, .. }
            | Self::LoadOutput { child, .. }
            | Self::SourceInput { child, .. } => Some(child.clone()),
            Self::KindConflict { id, .. } => Some(id.clone()),
            _ => None,
        };
        Some(Diagnostic::error(node, code, self.to_string()))
    }
}

/// Failure to read a snapshot document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    /// The document is not valid JSON
    #[error("Malformed snapshot document: {message}")]
    Malformed { message: String },

    /// A top-level collection or record has the wrong shape
    #[error("Invalid snapshot document: {message}")]
    InvalidDocument { message: String },

    /// A field required by the node's type is absent
    #[error("Node '{node}' is missing required field '{field}'")]
    MissingField { node: String, field: String },

    /// A field is present but has the wrong type or value
    #[error("Node '{node}' has invalid field '{field}': {message}")]
    InvalidField {
        node: String,
        field: String,
        message: String,
    },

    /// Unrecognised stage type tag
    #[error("Node '{node}' has unknown type '{tag}'")]
    UnknownStageType { node: String, tag: String },

    /// A load declares both a current and a power draw
    #[error("Load '{node}' declares both 'current' and 'power'; they are mutually exclusive")]
    ConflictingDemand { node: String },

    /// Two nodes share an id
    #[error("Duplicate node id '{node}'")]
    DuplicateNode { node: String },

    /// An edge references an id with no node
    #[error("Edge {index} references unknown node '{node}'")]
    UnknownEdgeNode { index: usize, node: String },

    /// Document written by a newer format
    #[error("Unsupported snapshot version {version} (latest supported is {latest})")]
    UnsupportedVersion { version: u64, latest: u64 },
}

impl FormatError {
    /// Create a missing-field error
    pub fn missing_field(node: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            node: node.into(),
            field: field.into(),
        }
    }

    /// Create an ill-typed field error
    pub fn invalid_field(
        node: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            node: node.into(),
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for FormatError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for PowerTreeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Format(e.into())
    }
}

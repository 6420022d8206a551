//! Error types for graph loading and matching.
//!
//! Load failures are fatal: there is nothing to match against. A pattern
//! that cannot occur is not an error; it is an `Ok` outcome with a zero
//! count.

use std::path::PathBuf;

use thiserror::Error;

use crate::graph::{Label, VertexId};

/// Errors raised while building or loading a [`crate::Graph`].
#[derive(Debug, Error)]
pub enum GraphError {
    /// The graph file could not be read.
    #[error("failed to read graph {}: {source}", path.display())]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A line of the text format could not be parsed.
    #[error("line {line}: {message}")]
    Parse {
        /// One-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// The CSR arrays are inconsistent.
    #[error("invalid adjacency: {0}")]
    InvalidCsr(String),

    /// A vertex id is outside `0..vertex_count`.
    #[error("vertex {vertex} out of range (vertex count {vertex_count})")]
    VertexOutOfRange {
        /// Offending id.
        vertex: VertexId,
        /// Number of vertices in the graph.
        vertex_count: usize,
    },

    /// A label is outside `0..label_count`.
    #[error("vertex {vertex} has label {label} but only {label_count} labels exist")]
    LabelOutOfRange {
        /// Vertex carrying the label.
        vertex: VertexId,
        /// Offending label.
        label: Label,
        /// Declared label count.
        label_count: usize,
    },

    /// An edge connects a vertex to itself.
    #[error("self-loop on vertex {0}")]
    SelfLoop(VertexId),

    /// The declared degree of a vertex disagrees with its edges.
    #[error("vertex {vertex} declares degree {declared} but has {actual} neighbours")]
    DegreeMismatch {
        /// Vertex id.
        vertex: VertexId,
        /// Degree in the `v` line.
        declared: usize,
        /// Degree implied by the `e` lines.
        actual: usize,
    },
}

impl GraphError {
    /// Build a parse error for `line`.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Build an invalid-adjacency error.
    pub fn csr(message: impl Into<String>) -> Self {
        Self::InvalidCsr(message.into())
    }
}

/// Errors raised before matching starts.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The pattern has more vertices than the fixed-size buffers support.
    #[error("unsupported pattern size: {vertices} vertices (maximum {max})")]
    UnsupportedPatternSize {
        /// Pattern vertex count.
        vertices: usize,
        /// Supported maximum.
        max: usize,
    },

    /// The pattern has no vertices.
    #[error("pattern graph is empty")]
    EmptyPattern,

    /// The pattern is not connected, so no spanning tree exists.
    #[error("pattern graph is disconnected")]
    DisconnectedPattern,

    /// A graph could not be built.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

//! Plain-text graph format.
//!
//! ```text
//! t <vertex count> <edge count>      optional header
//! v <id> <label> <degree>
//! e <src> <dst> [ignored tokens]
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use super::{Graph, Label, VertexId, adjacency_lists};
use crate::error::GraphError;

impl Graph {
    /// Read a graph in the text format from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Io`] if the file cannot be read, or any parse or
    /// consistency error raised by [`Graph::from_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| GraphError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let graph: Self = text.parse()?;
        debug!("loaded {} ({} vertices)", path.display(), graph.vertex_count());
        Ok(graph)
    }
}

/// A `v` line.
struct VertexLine {
    id: VertexId,
    label: Label,
    degree: usize,
    line: usize,
}

fn field<T: FromStr>(tokens: &[&str], i: usize, line: usize, what: &str) -> Result<T, GraphError> {
    let token = tokens
        .get(i)
        .ok_or_else(|| GraphError::parse(line, format!("missing {what}")))?;
    token
        .parse()
        .map_err(|_| GraphError::parse(line, format!("invalid {what} `{token}`")))
}

impl FromStr for Graph {
    type Err = GraphError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut header: Option<(usize, usize, usize)> = None;
        let mut records: Vec<VertexLine> = Vec::new();
        let mut edges: Vec<(VertexId, VertexId)> = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let tokens: Vec<&str> = raw.split_whitespace().collect();
            match tokens.first().copied() {
                None => {}
                Some(t) if t.starts_with('#') => {}
                Some("t") => {
                    let v: usize = field(&tokens, 1, line, "vertex count")?;
                    let e: usize = field(&tokens, 2, line, "edge count")?;
                    header = Some((v, e, line));
                }
                Some("v") => {
                    let id: VertexId = field(&tokens, 1, line, "vertex id")?;
                    let label: Label = field(&tokens, 2, line, "label")?;
                    let degree: usize = field(&tokens, 3, line, "degree")?;
                    records.push(VertexLine {
                        id,
                        label,
                        degree,
                        line,
                    });
                }
                Some("e") => {
                    let src: VertexId = field(&tokens, 1, line, "source")?;
                    let dst: VertexId = field(&tokens, 2, line, "target")?;
                    edges.push((src, dst));
                }
                Some(other) => {
                    return Err(GraphError::parse(line, format!("unknown record `{other}`")));
                }
            }
        }

        // Ids are checked against the number of `v` lines before any
        // per-vertex storage is sized.
        let n = records.len();
        if let Some((v, _, line)) = header {
            if v != n {
                return Err(GraphError::parse(
                    line,
                    format!("header declares {v} vertices, found {n} vertex lines"),
                ));
            }
        }
        let mut vertices: Vec<Option<(Label, usize)>> = vec![None; n];
        for record in records {
            let slot = record.id as usize;
            if slot >= n {
                return Err(match header {
                    Some(_) => GraphError::parse(
                        record.line,
                        format!("vertex id {} out of range for {n} vertices", record.id),
                    ),
                    None => GraphError::csr(format!("vertex ids are not dense: {} among {n} vertices", record.id)),
                });
            }
            if vertices[slot].is_some() {
                return Err(GraphError::parse(record.line, format!("vertex {} declared twice", record.id)));
            }
            vertices[slot] = Some((record.label, record.degree));
        }

        let mut labels = Vec::with_capacity(n);
        let mut declared = Vec::with_capacity(n);
        for (id, vertex) in vertices.into_iter().enumerate() {
            let (label, degree) = vertex.ok_or_else(|| GraphError::csr(format!("vertex {id} is never declared")))?;
            labels.push(label);
            declared.push(degree);
        }

        let adjacency = adjacency_lists(labels.len(), &edges)?;
        for (v, (list, &degree)) in adjacency.iter().zip(&declared).enumerate() {
            if list.len() != degree {
                return Err(GraphError::DegreeMismatch {
                    vertex: v as VertexId,
                    declared: degree,
                    actual: list.len(),
                });
            }
        }

        let edge_count = adjacency.iter().map(Vec::len).sum::<usize>() / 2;
        if let Some((v, e, line)) = header {
            if v != labels.len() || e != edge_count {
                return Err(GraphError::parse(
                    line,
                    format!(
                        "header declares {v} vertices and {e} edges, found {} and {edge_count}",
                        labels.len()
                    ),
                ));
            }
        }

        Ok(Self::from_adjacency(labels, adjacency))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SMALL: &str = "t 3 2
v 0 5 1
v 1 2 2
v 2 5 1
e 0 1
e 1 2
";

    #[test]
    fn parses_small_graph() {
        let g: Graph = SMALL.parse().expect("valid");
        assert_eq!(g.vertex_count(), 3);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.label(0), 5);
        assert_eq!(g.label_count(), 6);
        assert_eq!(g.neighbors(1), &[0, 2]);
    }

    #[test]
    fn header_is_optional_and_comments_skipped() {
        let g: Graph = "# tiny\nv 0 0 1\n\nv 1 0 1\ne 1 0 7\n".parse().expect("valid");
        assert_eq!(g.edge_count(), 1);
        assert!(g.check_edge_existence(0, 1));
    }

    #[test]
    fn degree_mismatch_is_fatal() {
        let err = "v 0 0 2\nv 1 0 1\ne 0 1\n".parse::<Graph>().unwrap_err();
        assert!(matches!(
            err,
            GraphError::DegreeMismatch { vertex: 0, declared: 2, actual: 1 }
        ));
    }

    #[test]
    fn header_mismatch_is_fatal() {
        let err = "t 3 1\nv 0 0 1\nv 1 0 1\ne 0 1\n".parse::<Graph>().unwrap_err();
        assert!(matches!(err, GraphError::Parse { line: 1, .. }));
    }

    #[test]
    fn garbage_reports_line() {
        let err = "v 0 0 0\nx 1 2\n".parse::<Graph>().unwrap_err();
        assert!(matches!(err, GraphError::Parse { line: 2, .. }));
        let err = "v 0 zero 0\n".parse::<Graph>().unwrap_err();
        assert!(err.to_string().contains("invalid label"));
    }

    #[test]
    fn gaps_in_ids_are_rejected() {
        let err = "v 0 0 0\nv 2 0 0\n".parse::<Graph>().unwrap_err();
        assert!(matches!(err, GraphError::InvalidCsr(_)));
    }

    #[test]
    fn huge_id_is_rejected_against_header() {
        let err = "t 1 0\nv 200000000 0 0\n".parse::<Graph>().unwrap_err();
        assert!(matches!(err, GraphError::Parse { line: 2, .. }), "{err}");
        let err = "t 4000000000 0\n".parse::<Graph>().unwrap_err();
        assert!(matches!(err, GraphError::Parse { line: 1, .. }), "{err}");
    }

    #[test]
    fn huge_id_is_rejected_without_header() {
        let err = "v 0 0 0\nv 4294967295 0 0\n".parse::<Graph>().unwrap_err();
        assert!(matches!(err, GraphError::InvalidCsr(_)), "{err}");
    }

    #[test]
    fn duplicate_vertex_reports_line() {
        let err = "v 0 0 0\nv 0 0 0\n".parse::<Graph>().unwrap_err();
        assert!(matches!(err, GraphError::Parse { line: 2, .. }), "{err}");
    }

    #[test]
    fn edge_to_unknown_vertex() {
        let err = "v 0 0 1\ne 0 4\n".parse::<Graph>().unwrap_err();
        assert!(matches!(err, GraphError::VertexOutOfRange { vertex: 4, .. }));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SMALL.as_bytes()).expect("write");
        let g = Graph::load(file.path()).expect("load");
        assert_eq!(g.vertex_count(), 3);
    }

    #[test]
    fn load_missing_file() {
        let err = Graph::load("/no/such/graph.txt").unwrap_err();
        assert!(matches!(err, GraphError::Io { .. }));
    }
}

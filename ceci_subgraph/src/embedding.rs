//! Pattern-to-data vertex mappings.

use crate::graph::{Graph, VertexId};

/// One injective mapping of pattern vertices onto data vertices, indexed by
/// pattern vertex.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Embedding {
    mapping: Vec<VertexId>,
}

impl Embedding {
    /// Mapping indexed by pattern vertex.
    #[must_use]
    pub const fn new(mapping: Vec<VertexId>) -> Self {
        Self { mapping }
    }

    /// Data vertex assigned to pattern vertex `u`.
    #[must_use]
    pub fn get(&self, u: VertexId) -> VertexId {
        self.mapping[u as usize]
    }

    /// Number of pattern vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    /// True for the empty mapping.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Data vertices by pattern vertex.
    #[must_use]
    pub fn as_slice(&self) -> &[VertexId] {
        &self.mapping
    }

    /// `(pattern vertex, data vertex)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId, VertexId)> + '_ {
        self.mapping.iter().enumerate().map(|(u, &v)| (u as VertexId, v))
    }

    /// Sorted image; equal for embeddings onto the same vertex set.
    #[must_use]
    pub fn signature(&self) -> Vec<VertexId> {
        let mut sig = self.mapping.clone();
        sig.sort_unstable();
        sig
    }

    /// Labels agree, the mapping is injective and every pattern edge lands
    /// on a data edge.
    #[must_use]
    pub fn is_valid(&self, data: &Graph, pattern: &Graph) -> bool {
        if self.mapping.len() != pattern.vertex_count() {
            return false;
        }
        let sig = self.signature();
        if sig.windows(2).any(|w| w[0] == w[1]) {
            return false;
        }
        if sig.last().is_some_and(|&v| v as usize >= data.vertex_count()) {
            return false;
        }
        self.iter().all(|(u, v)| pattern.label(u) == data.label(v))
            && pattern
                .edges()
                .all(|(a, b)| data.check_edge_existence(self.get(a), self.get(b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity() {
        let tri = Graph::from_edges(vec![0, 0, 0], &[(0, 1), (1, 2), (0, 2)]).expect("valid");
        let path = Graph::from_edges(vec![0, 0, 0], &[(0, 1), (1, 2)]).expect("valid");
        assert!(Embedding::new(vec![2, 0, 1]).is_valid(&tri, &path));
        assert!(!Embedding::new(vec![2, 2, 1]).is_valid(&tri, &path));
        assert!(!Embedding::new(vec![0, 1]).is_valid(&tri, &path));
        assert!(!Embedding::new(vec![0, 1, 5]).is_valid(&tri, &path));
        assert_eq!(Embedding::new(vec![2, 0, 1]).signature(), vec![0, 1, 2]);
    }
}

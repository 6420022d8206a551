//! Immutable labelled graph in CSR form.
//!
//! Both the data graph and the pattern graph use this representation. On
//! top of the plain adjacency it keeps a label -> vertices reverse index and,
//! per vertex, the neighbour-label-frequency (NLF) table together with the
//! neighbour list regrouped by label. All of it is built once and never
//! mutated afterwards.

mod loader;

use std::collections::VecDeque;

use tracing::debug;

use crate::error::GraphError;

/// Dense vertex id, `0..vertex_count`.
pub type VertexId = u32;
/// Dense vertex label.
pub type Label = u32;

/// One row of a vertex's neighbour-label-frequency table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NlfEntry {
    /// Neighbour label.
    pub label: Label,
    /// Number of neighbours carrying `label`.
    pub count: u32,
    /// Absolute start of the run of neighbours with this label inside
    /// the grouped neighbour array.
    start: usize,
}

/// Undirected, vertex-labelled graph.
#[derive(Clone, Debug)]
pub struct Graph {
    offsets: Vec<usize>,
    neighbors: Vec<VertexId>,
    labels: Vec<Label>,
    label_count: usize,
    edge_count: usize,

    label_offsets: Vec<usize>,
    label_vertices: Vec<VertexId>,

    nlf_offsets: Vec<usize>,
    nlf: Vec<NlfEntry>,
    grouped_neighbors: Vec<VertexId>,

    max_degree: usize,
    max_label_frequency: usize,
}

impl Graph {
    /// Build a graph from CSR arrays handed over by a host engine.
    ///
    /// `offsets` has `vertex_count + 1` entries, `neighbors` holds both
    /// directions of every edge (`2 * edge_count` entries) and every
    /// per-vertex slice must be strictly ascending.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] if the arrays are inconsistent, contain
    /// self-loops, out-of-range ids or labels, or are not symmetric.
    pub fn from_arrays(
        vertex_count: usize,
        label_count: usize,
        edge_count: usize,
        offsets: Vec<usize>,
        neighbors: Vec<VertexId>,
        labels: Vec<Label>,
    ) -> Result<Self, GraphError> {
        if offsets.len() != vertex_count + 1 {
            return Err(GraphError::csr(format!(
                "expected {} offsets, got {}",
                vertex_count + 1,
                offsets.len()
            )));
        }
        if labels.len() != vertex_count {
            return Err(GraphError::csr(format!(
                "expected {vertex_count} labels, got {}",
                labels.len()
            )));
        }
        if offsets[0] != 0 || offsets.windows(2).any(|w| w[0] > w[1]) {
            return Err(GraphError::csr("offsets must start at 0 and never decrease"));
        }
        if offsets[vertex_count] != neighbors.len() || neighbors.len() != 2 * edge_count {
            return Err(GraphError::csr(format!(
                "{} neighbour entries for {edge_count} edges (last offset {})",
                neighbors.len(),
                offsets[vertex_count]
            )));
        }

        for (v, &label) in labels.iter().enumerate() {
            if label as usize >= label_count {
                return Err(GraphError::LabelOutOfRange {
                    vertex: v as VertexId,
                    label,
                    label_count,
                });
            }
        }

        for v in 0..vertex_count {
            let slice = &neighbors[offsets[v]..offsets[v + 1]];
            for &n in slice {
                if n as usize >= vertex_count {
                    return Err(GraphError::VertexOutOfRange {
                        vertex: n,
                        vertex_count,
                    });
                }
                if n as usize == v {
                    return Err(GraphError::SelfLoop(n));
                }
            }
            if slice.windows(2).any(|w| w[0] >= w[1]) {
                return Err(GraphError::csr(format!(
                    "neighbours of vertex {v} are not strictly ascending"
                )));
            }
        }

        for v in 0..vertex_count {
            for &n in &neighbors[offsets[v]..offsets[v + 1]] {
                let back = &neighbors[offsets[n as usize]..offsets[n as usize + 1]];
                if back.binary_search(&(v as VertexId)).is_err() {
                    return Err(GraphError::csr(format!(
                        "edge {v} -> {n} has no reverse entry"
                    )));
                }
            }
        }

        Ok(Self::build(label_count, offsets, neighbors, labels))
    }

    /// Build a graph from a label vector and an edge list. Duplicate edges
    /// are collapsed; the label count is one more than the largest label.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] on self-loops or out-of-range endpoints.
    pub fn from_edges(labels: Vec<Label>, edges: &[(VertexId, VertexId)]) -> Result<Self, GraphError> {
        let adjacency = adjacency_lists(labels.len(), edges)?;
        Ok(Self::from_adjacency(labels, adjacency))
    }

    fn from_adjacency(labels: Vec<Label>, adjacency: Vec<Vec<VertexId>>) -> Self {
        let label_count = labels.iter().max().map_or(0, |&l| l as usize + 1);
        let mut offsets = Vec::with_capacity(adjacency.len() + 1);
        offsets.push(0);
        let mut neighbors = Vec::with_capacity(adjacency.iter().map(Vec::len).sum());
        for list in adjacency {
            neighbors.extend(list);
            offsets.push(neighbors.len());
        }
        Self::build(label_count, offsets, neighbors, labels)
    }

    /// Derive the label index and NLF tables from validated CSR arrays.
    fn build(
        label_count: usize,
        offsets: Vec<usize>,
        neighbors: Vec<VertexId>,
        labels: Vec<Label>,
    ) -> Self {
        let vertex_count = labels.len();

        let mut label_offsets = vec![0usize; label_count + 1];
        for &l in &labels {
            label_offsets[l as usize + 1] += 1;
        }
        for i in 0..label_count {
            label_offsets[i + 1] += label_offsets[i];
        }
        let mut cursor = label_offsets.clone();
        let mut label_vertices = vec![0; vertex_count];
        for (v, &l) in labels.iter().enumerate() {
            label_vertices[cursor[l as usize]] = v as VertexId;
            cursor[l as usize] += 1;
        }
        let max_label_frequency = label_offsets
            .windows(2)
            .map(|w| w[1] - w[0])
            .max()
            .unwrap_or(0);

        let mut nlf_offsets = Vec::with_capacity(vertex_count + 1);
        nlf_offsets.push(0);
        let mut nlf = Vec::new();
        let mut grouped_neighbors = Vec::with_capacity(neighbors.len());
        let mut max_degree = 0;
        for v in 0..vertex_count {
            let slice = &neighbors[offsets[v]..offsets[v + 1]];
            max_degree = max_degree.max(slice.len());

            let base = grouped_neighbors.len();
            grouped_neighbors.extend_from_slice(slice);
            // Stable sort keeps ids ascending within each label run.
            grouped_neighbors[base..].sort_by_key(|&n| labels[n as usize]);

            let mut i = base;
            while i < grouped_neighbors.len() {
                let label = labels[grouped_neighbors[i] as usize];
                let start = i;
                while i < grouped_neighbors.len() && labels[grouped_neighbors[i] as usize] == label {
                    i += 1;
                }
                nlf.push(NlfEntry {
                    label,
                    count: (i - start) as u32,
                    start,
                });
            }
            nlf_offsets.push(nlf.len());
        }

        let edge_count = neighbors.len() / 2;
        debug!(
            vertices = vertex_count,
            edges = edge_count,
            labels = label_count,
            max_degree,
            "graph built"
        );

        Self {
            offsets,
            neighbors,
            labels,
            label_count,
            edge_count,
            label_offsets,
            label_vertices,
            nlf_offsets,
            nlf,
            grouped_neighbors,
            max_degree,
            max_label_frequency,
        }
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.labels.len()
    }

    /// Number of undirected edges.
    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// One past the largest label.
    #[must_use]
    pub const fn label_count(&self) -> usize {
        self.label_count
    }

    /// Largest vertex degree.
    #[must_use]
    pub const fn max_degree(&self) -> usize {
        self.max_degree
    }

    /// Size of the largest label class.
    #[must_use]
    pub const fn max_label_frequency(&self) -> usize {
        self.max_label_frequency
    }

    /// Sorted neighbours of `v`.
    #[must_use]
    #[contracts::debug_requires((v as usize) < self.vertex_count())]
    pub fn neighbors(&self, v: VertexId) -> &[VertexId] {
        let v = v as usize;
        &self.neighbors[self.offsets[v]..self.offsets[v + 1]]
    }

    /// Number of neighbours of `v`.
    #[must_use]
    #[contracts::debug_requires((v as usize) < self.vertex_count())]
    pub fn degree(&self, v: VertexId) -> usize {
        let v = v as usize;
        self.offsets[v + 1] - self.offsets[v]
    }

    /// Label of `v`.
    #[must_use]
    #[contracts::debug_requires((v as usize) < self.vertex_count())]
    pub fn label(&self, v: VertexId) -> Label {
        self.labels[v as usize]
    }

    /// Sorted vertices carrying label `l`; empty for unknown labels.
    #[must_use]
    pub fn vertices_by_label(&self, l: Label) -> &[VertexId] {
        let l = l as usize;
        if l >= self.label_count {
            return &[];
        }
        &self.label_vertices[self.label_offsets[l]..self.label_offsets[l + 1]]
    }

    /// Neighbour-label-frequency table of `v`, ordered by label.
    #[must_use]
    #[contracts::debug_requires((v as usize) < self.vertex_count())]
    pub fn nlf(&self, v: VertexId) -> &[NlfEntry] {
        let v = v as usize;
        &self.nlf[self.nlf_offsets[v]..self.nlf_offsets[v + 1]]
    }

    fn nlf_entry(&self, v: VertexId, l: Label) -> Option<&NlfEntry> {
        let table = self.nlf(v);
        table
            .binary_search_by_key(&l, |e| e.label)
            .ok()
            .map(|i| &table[i])
    }

    /// Number of neighbours of `v` labelled `l`.
    #[must_use]
    pub fn nlf_count(&self, v: VertexId, l: Label) -> u32 {
        self.nlf_entry(v, l).map_or(0, |e| e.count)
    }

    /// Sorted neighbours of `v` labelled `l`.
    #[must_use]
    pub fn neighbors_by_label(&self, v: VertexId, l: Label) -> &[VertexId] {
        self.nlf_entry(v, l)
            .map(|e| &self.grouped_neighbors[e.start..e.start + e.count as usize])
            .unwrap_or_default()
    }

    /// Binary search on the neighbour list of the lower-degree endpoint.
    #[must_use]
    pub fn check_edge_existence(&self, u: VertexId, v: VertexId) -> bool {
        let n = self.vertex_count();
        if u as usize >= n || v as usize >= n {
            return false;
        }
        let (small, other) = if self.degree(u) <= self.degree(v) {
            (u, v)
        } else {
            (v, u)
        };
        self.neighbors(small).binary_search(&other).is_ok()
    }

    /// Every edge once, as `(low, high)` pairs in ascending order.
    pub fn edges(&self) -> impl Iterator<Item = (VertexId, VertexId)> + '_ {
        (0..self.vertex_count() as VertexId).flat_map(move |u| {
            self.neighbors(u)
                .iter()
                .copied()
                .filter(move |&v| v > u)
                .map(move |v| (u, v))
        })
    }

    /// True for graphs with a single connected component (and the empty graph).
    #[must_use]
    pub fn is_connected(&self) -> bool {
        let n = self.vertex_count();
        if n == 0 {
            return true;
        }
        let mut seen = vec![false; n];
        let mut queue = VecDeque::from([0 as VertexId]);
        seen[0] = true;
        let mut reached = 1;
        while let Some(u) = queue.pop_front() {
            for &w in self.neighbors(u) {
                if !seen[w as usize] {
                    seen[w as usize] = true;
                    reached += 1;
                    queue.push_back(w);
                }
            }
        }
        reached == n
    }

    /// Raw CSR arrays, in the same shape accepted by [`Graph::from_arrays`].
    #[must_use]
    pub fn csr(&self) -> (&[usize], &[VertexId], &[Label]) {
        (&self.offsets, &self.neighbors, &self.labels)
    }
}

/// Sorted, de-duplicated adjacency lists from an edge list.
fn adjacency_lists(
    vertex_count: usize,
    edges: &[(VertexId, VertexId)],
) -> Result<Vec<Vec<VertexId>>, GraphError> {
    let mut adjacency = vec![Vec::new(); vertex_count];
    for &(u, v) in edges {
        for x in [u, v] {
            if x as usize >= vertex_count {
                return Err(GraphError::VertexOutOfRange {
                    vertex: x,
                    vertex_count,
                });
            }
        }
        if u == v {
            return Err(GraphError::SelfLoop(u));
        }
        adjacency[u as usize].push(v);
        adjacency[v as usize].push(u);
    }
    for list in &mut adjacency {
        list.sort_unstable();
        list.dedup();
    }
    Ok(adjacency)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled_square() -> Graph {
        // 0 - 1
        // |   |
        // 3 - 2   plus diagonal 0-2
        Graph::from_edges(vec![0, 1, 0, 1], &[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)])
            .expect("valid graph")
    }

    #[test]
    fn csr_is_sorted_and_symmetric() {
        let g = labelled_square();
        assert_eq!(g.vertex_count(), 4);
        assert_eq!(g.edge_count(), 5);
        assert_eq!(g.neighbors(0), &[1, 2, 3]);
        assert_eq!(g.neighbors(1), &[0, 2]);
        assert_eq!(g.degree(2), 3);
        assert_eq!(g.max_degree(), 3);
    }

    #[test]
    fn label_index() {
        let g = labelled_square();
        assert_eq!(g.label_count(), 2);
        assert_eq!(g.vertices_by_label(0), &[0, 2]);
        assert_eq!(g.vertices_by_label(1), &[1, 3]);
        assert!(g.vertices_by_label(7).is_empty());
        assert_eq!(g.max_label_frequency(), 2);
    }

    #[test]
    fn nlf_and_grouped_neighbors() {
        let g = labelled_square();
        let table: Vec<_> = g.nlf(0).iter().map(|e| (e.label, e.count)).collect();
        assert_eq!(table, vec![(0, 1), (1, 2)]);
        assert_eq!(g.neighbors_by_label(0, 1), &[1, 3]);
        assert_eq!(g.neighbors_by_label(0, 0), &[2]);
        assert!(g.neighbors_by_label(1, 1).is_empty());
        assert_eq!(g.nlf_count(2, 1), 2);
        assert_eq!(g.nlf_count(2, 5), 0);
    }

    #[test]
    fn edge_existence_both_directions() {
        let g = labelled_square();
        for (u, v) in g.edges().collect::<Vec<_>>() {
            assert!(g.check_edge_existence(u, v));
            assert!(g.check_edge_existence(v, u));
        }
        assert!(!g.check_edge_existence(1, 3));
        assert!(!g.check_edge_existence(3, 1));
        assert!(!g.check_edge_existence(0, 40));
    }

    #[test]
    fn duplicate_edges_collapse() {
        let g = Graph::from_edges(vec![0, 0], &[(0, 1), (1, 0), (0, 1)]).expect("valid");
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.neighbors(0), &[1]);
    }

    #[test]
    fn self_loop_rejected() {
        let err = Graph::from_edges(vec![0, 0], &[(1, 1)]).unwrap_err();
        assert!(matches!(err, GraphError::SelfLoop(1)));
    }

    #[test]
    fn from_arrays_round_trip() {
        let g = labelled_square();
        let (offsets, neighbors, labels) = g.csr();
        let h = Graph::from_arrays(
            g.vertex_count(),
            g.label_count(),
            g.edge_count(),
            offsets.to_vec(),
            neighbors.to_vec(),
            labels.to_vec(),
        )
        .expect("valid arrays");
        assert_eq!(h.neighbors(0), g.neighbors(0));
        assert_eq!(h.neighbors_by_label(2, 1), g.neighbors_by_label(2, 1));
    }

    #[test]
    fn from_arrays_rejects_asymmetric() {
        // 0 -> 1 and 2 -> 1 recorded, vertex 1 lists nothing.
        let err = Graph::from_arrays(3, 1, 1, vec![0, 1, 1, 2], vec![1, 1], vec![0, 0, 0]);
        assert!(matches!(err, Err(GraphError::InvalidCsr(_))));
    }

    #[test]
    fn from_arrays_rejects_bad_label() {
        let err = Graph::from_arrays(2, 1, 1, vec![0, 1, 2], vec![1, 0], vec![0, 3]).unwrap_err();
        assert!(matches!(err, GraphError::LabelOutOfRange { vertex: 1, label: 3, .. }));
    }

    #[test]
    fn from_arrays_rejects_unsorted_slice() {
        let err = Graph::from_arrays(
            3,
            1,
            2,
            vec![0, 2, 3, 4],
            vec![2, 1, 0, 0],
            vec![0, 0, 0],
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::InvalidCsr(_)));
    }

    #[test]
    fn connectivity() {
        assert!(labelled_square().is_connected());
        let split = Graph::from_edges(vec![0, 0, 0, 0], &[(0, 1), (2, 3)]).expect("valid");
        assert!(!split.is_connected());
    }
}

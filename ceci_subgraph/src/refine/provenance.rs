//! Provenance bookkeeping for non-tree pattern edges.
//!
//! A pattern edge `(u, w)` that is not a tree edge can only be checked once
//! both endpoints are bound, and both hang off the tree below their nearest
//! common ancestor `b` (the anchor). For a data vertex `v` assigned to a
//! pattern vertex `x` on the path from `b` down to `u` or `w`, the
//! provenance records which data vertices assigned to `b` can reach `v`
//! through the candidate space. Two endpoint candidates are compatible only
//! if they are adjacent and share an anchor assignment.

use std::collections::HashMap;
use std::slice;

use crate::graph::VertexId;
use crate::order::PatternTree;

/// A backward pattern edge that is not a tree edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NonTreeEdge {
    /// Endpoint visited later.
    pub later: VertexId,
    /// Endpoint visited earlier.
    pub earlier: VertexId,
    /// Nearest common tree ancestor of both endpoints.
    pub anchor: VertexId,
}

/// Non-tree edges of `tree` and, per pattern vertex, the anchors whose
/// assignments it has to carry.
pub fn non_tree_edges(tree: &PatternTree) -> (Vec<NonTreeEdge>, Vec<Vec<VertexId>>) {
    let mut edges = Vec::new();
    let mut anchors = vec![Vec::new(); tree.len()];
    for &u in tree.order() {
        for w in tree.non_tree_bn(u) {
            let anchor = tree.nearest_common_ancestor(u, w);
            edges.push(NonTreeEdge {
                later: u,
                earlier: w,
                anchor,
            });
            for end in [u, w] {
                for x in tree.path_up_to(end, anchor) {
                    anchors[x as usize].push(anchor);
                }
            }
        }
    }
    for list in &mut anchors {
        list.sort_unstable();
        list.dedup();
    }
    (edges, anchors)
}

/// Composite key of the flat provenance map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProvenanceKey {
    /// Pattern vertex.
    pub vertex: VertexId,
    /// Data vertex assigned to it.
    pub data: VertexId,
    /// Anchor pattern vertex.
    pub anchor: VertexId,
}

/// `(pattern vertex, data vertex, anchor) -> ascending anchor assignments`.
#[derive(Clone, Debug, Default)]
pub struct Provenance {
    origins: HashMap<ProvenanceKey, Vec<VertexId>>,
}

impl Provenance {
    /// Forget every entry.
    pub fn clear(&mut self) {
        self.origins.clear();
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.origins.len()
    }

    /// True when nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    /// Anchor assignments behind `data` at `vertex`. A vertex is its own
    /// anchor's provenance, so `vertex == anchor` yields `[data]`.
    #[must_use]
    pub fn lookup<'a>(&'a self, vertex: VertexId, data: &'a VertexId, anchor: VertexId) -> &'a [VertexId] {
        if vertex == anchor {
            return slice::from_ref(data);
        }
        self.origins
            .get(&ProvenanceKey {
                vertex,
                data: *data,
                anchor,
            })
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Store the anchor assignments for `key`, sorted and de-duplicated.
    pub(crate) fn insert(&mut self, key: ProvenanceKey, mut values: Vec<VertexId>) {
        values.sort_unstable();
        values.dedup();
        self.origins.insert(key, values);
    }
}

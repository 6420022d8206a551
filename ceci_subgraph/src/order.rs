//! Pattern spanning tree and visitation order.
//!
//! The tree is an arena: every node lives in one `Vec` indexed by pattern
//! vertex id, and parent/child links are ids into that vector.

use std::collections::VecDeque;

use tracing::debug;

use crate::error::MatchError;
use crate::graph::{Graph, VertexId};

/// Largest supported pattern. Several per-match buffers, and the ancestor
/// bit sets below, are sized from this.
pub const MAX_PATTERN_VERTICES: usize = 64;

/// Reject patterns the engine cannot handle. Runs before any tree is built.
///
/// # Errors
///
/// [`MatchError::EmptyPattern`], [`MatchError::UnsupportedPatternSize`] or
/// [`MatchError::DisconnectedPattern`].
pub fn validate_pattern(pattern: &Graph) -> Result<(), MatchError> {
    let vertices = pattern.vertex_count();
    if vertices == 0 {
        return Err(MatchError::EmptyPattern);
    }
    if vertices > MAX_PATTERN_VERTICES {
        return Err(MatchError::UnsupportedPatternSize {
            vertices,
            max: MAX_PATTERN_VERTICES,
        });
    }
    if !pattern.is_connected() {
        return Err(MatchError::DisconnectedPattern);
    }
    Ok(())
}

/// One pattern vertex in the BFS tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeNode {
    /// Pattern vertex.
    pub id: VertexId,
    /// Tree parent, `None` for the root.
    pub parent: Option<VertexId>,
    /// Depth below the root.
    pub level: usize,
    /// Tree children in visitation order.
    pub children: Vec<VertexId>,
    /// Pattern neighbours visited earlier, in visitation order.
    pub bn: Vec<VertexId>,
    /// Pattern neighbours visited later, in visitation order.
    pub fn_: Vec<VertexId>,
}

/// BFS tree of the pattern with its visitation order.
#[derive(Clone, Debug)]
pub struct PatternTree {
    nodes: Vec<TreeNode>,
    order: Vec<VertexId>,
    position: Vec<usize>,
}

impl PatternTree {
    /// Root pattern vertex.
    #[must_use]
    pub fn root(&self) -> VertexId {
        self.order[0]
    }

    /// Pattern vertices in visitation order.
    #[must_use]
    pub fn order(&self) -> &[VertexId] {
        &self.order
    }

    /// Tree node of `u`.
    #[must_use]
    pub fn node(&self, u: VertexId) -> &TreeNode {
        &self.nodes[u as usize]
    }

    /// Tree parent of `u`.
    #[must_use]
    pub fn parent(&self, u: VertexId) -> Option<VertexId> {
        self.nodes[u as usize].parent
    }

    /// Tree children of `u`.
    #[must_use]
    pub fn children(&self, u: VertexId) -> &[VertexId] {
        &self.nodes[u as usize].children
    }

    /// Index of `u` in the visitation order.
    #[must_use]
    pub fn position(&self, u: VertexId) -> usize {
        self.position[u as usize]
    }

    /// Number of pattern vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True for an empty tree.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Bit set of `u` and all of its ancestors.
    fn ancestor_mask(&self, mut u: VertexId) -> u64 {
        let mut mask = 1u64 << u;
        while let Some(p) = self.parent(u) {
            mask |= 1u64 << p;
            u = p;
        }
        mask
    }

    /// Whether `a` lies on the path from `b` to the root (`b` included).
    #[must_use]
    pub fn is_ancestor(&self, a: VertexId, b: VertexId) -> bool {
        self.ancestor_mask(b) & (1u64 << a) != 0
    }

    /// Nearest common tree ancestor of `a` and `b`.
    #[must_use]
    pub fn nearest_common_ancestor(&self, a: VertexId, b: VertexId) -> VertexId {
        let mask = self.ancestor_mask(a);
        let mut u = b;
        loop {
            if mask & (1u64 << u) != 0 {
                return u;
            }
            match self.parent(u) {
                Some(p) => u = p,
                None => return u,
            }
        }
    }

    /// Vertices on the tree path from `u` up to `ancestor`, both included.
    #[must_use]
    pub fn path_up_to(&self, u: VertexId, ancestor: VertexId) -> Vec<VertexId> {
        let mut path = vec![u];
        let mut cur = u;
        while cur != ancestor {
            match self.parent(cur) {
                Some(p) => {
                    path.push(p);
                    cur = p;
                }
                None => break,
            }
        }
        path
    }

    /// `u` and its descendants in breadth-first order.
    #[must_use]
    pub fn subtree(&self, u: VertexId) -> Vec<VertexId> {
        let mut out = Vec::new();
        let mut queue = VecDeque::from([u]);
        while let Some(x) = queue.pop_front() {
            out.push(x);
            queue.extend(self.children(x).iter().copied());
        }
        out
    }

    /// Pattern neighbours of `u` that are not its tree parent and come
    /// earlier in the order.
    pub fn non_tree_bn(&self, u: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        let parent = self.parent(u);
        self.node(u)
            .bn
            .iter()
            .copied()
            .filter(move |&w| Some(w) != parent)
    }
}

/// Builds the [`PatternTree`] from a root.
pub struct OrderBuilder<'a> {
    pattern: &'a Graph,
}

impl<'a> OrderBuilder<'a> {
    /// Builder over `pattern`.
    pub const fn new(pattern: &'a Graph) -> Self {
        Self { pattern }
    }

    /// The root's two highest-degree neighbours come first (ties to the
    /// higher id), then repeatedly the unvisited vertex with the most
    /// visited neighbours (ties to the lower id). A vertex's parent is the
    /// earliest visited vertex adjacent to it.
    #[contracts::debug_requires(self.pattern.is_connected())]
    #[contracts::debug_requires((root as usize) < self.pattern.vertex_count())]
    pub fn build(&self, root: VertexId) -> PatternTree {
        let p = self.pattern;
        let n = p.vertex_count();
        let mut visited = vec![false; n];
        let mut order = Vec::with_capacity(n);
        let mut parent: Vec<Option<VertexId>> = vec![None; n];

        order.push(root);
        visited[root as usize] = true;

        let mut by_degree: Vec<VertexId> = p.neighbors(root).to_vec();
        by_degree.sort_by_key(|&w| (p.degree(w), w));
        for &w in by_degree.iter().rev().take(2) {
            order.push(w);
            visited[w as usize] = true;
            parent[w as usize] = Some(root);
        }

        while order.len() < n {
            let mut best: Option<(usize, VertexId)> = None;
            for u in 0..n as VertexId {
                if visited[u as usize] {
                    continue;
                }
                let hits = p
                    .neighbors(u)
                    .iter()
                    .filter(|&&w| visited[w as usize])
                    .count();
                if hits > 0 && best.is_none_or(|(h, _)| hits > h) {
                    best = Some((hits, u));
                }
            }
            let Some((_, u)) = best else {
                break;
            };
            parent[u as usize] = order
                .iter()
                .copied()
                .find(|&w| p.check_edge_existence(u, w));
            order.push(u);
            visited[u as usize] = true;
        }

        let mut position = vec![0; n];
        for (i, &u) in order.iter().enumerate() {
            position[u as usize] = i;
        }

        let mut nodes: Vec<TreeNode> = (0..n as VertexId)
            .map(|u| {
                let mut bn: Vec<VertexId> = Vec::new();
                let mut fn_: Vec<VertexId> = Vec::new();
                for &w in p.neighbors(u) {
                    if position[w as usize] < position[u as usize] {
                        bn.push(w);
                    } else {
                        fn_.push(w);
                    }
                }
                bn.sort_by_key(|&w| position[w as usize]);
                fn_.sort_by_key(|&w| position[w as usize]);
                TreeNode {
                    id: u,
                    parent: parent[u as usize],
                    level: 0,
                    children: Vec::new(),
                    bn,
                    fn_,
                }
            })
            .collect();

        for &u in &order {
            if let Some(pu) = parent[u as usize] {
                nodes[u as usize].level = nodes[pu as usize].level + 1;
                nodes[pu as usize].children.push(u);
            }
        }

        debug!(root, ?order, "pattern order");
        PatternTree {
            nodes,
            order,
            position,
        }
    }
}

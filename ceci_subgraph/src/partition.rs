//! Two-way split of the pattern for the partitioned join.
//!
//! The root's child subtrees are divided into two groups. Each group becomes
//! its own ordering that starts at the shared root. Both halves are
//! enumerated independently and joined on the pattern edges and same-label
//! pairs that cross between them.

use std::collections::VecDeque;

use itertools::Itertools;
use tracing::{debug, trace};

use crate::graph::{Graph, VertexId};
use crate::order::PatternTree;

/// Exhaustive subset search is used up to this many root children.
pub const MAX_EXHAUSTIVE_CHILDREN: usize = 16;
/// Repair iterations per split.
pub const MAX_REPAIR_ITERATIONS: usize = 10;

/// One ordering of the split.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Half {
    /// Pattern vertices, root first.
    pub order: Vec<VertexId>,
    /// Per position, the earlier positions adjacent in the pattern.
    pub connections: Vec<Vec<usize>>,
    /// Per position, whether its label occurs at another position.
    pub morphism: Vec<bool>,
}

impl Half {
    fn new(pattern: &Graph, order: Vec<VertexId>) -> Self {
        let connections = (0..order.len())
            .map(|k| {
                (0..k)
                    .filter(|&j| pattern.check_edge_existence(order[j], order[k]))
                    .collect()
            })
            .collect();
        let morphism = (0..order.len())
            .map(|k| {
                let label = pattern.label(order[k]);
                order
                    .iter()
                    .enumerate()
                    .any(|(j, &w)| j != k && pattern.label(w) == label)
            })
            .collect();
        Self {
            order,
            connections,
            morphism,
        }
    }

    /// Number of positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when the half holds no vertex.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Position of `u` in this half.
    #[must_use]
    pub fn position(&self, u: VertexId) -> Option<usize> {
        self.order.iter().position(|&w| w == u)
    }
}

/// Result of the split.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionPlan {
    /// Half holding the root and the chosen subtrees.
    pub first: Half,
    /// Half holding the root and the other subtrees.
    pub second: Half,
    /// `(position in first, position in second)` of each pattern edge
    /// between the halves. The shared root is never part of one.
    pub cross_edges: Vec<(usize, usize)>,
    /// Same-label position pairs across the halves; their data vertices
    /// must differ.
    pub identifications: Vec<(usize, usize)>,
}

impl PartitionPlan {
    fn from_orders(pattern: &Graph, first: Vec<VertexId>, second: Vec<VertexId>) -> Self {
        let first = Half::new(pattern, first);
        let second = Half::new(pattern, second);
        let mut cross_edges = Vec::new();
        let mut identifications = Vec::new();
        for i in 1..first.len() {
            for j in 1..second.len() {
                let (a, b) = (first.order[i], second.order[j]);
                if pattern.check_edge_existence(a, b) {
                    cross_edges.push((i, j));
                }
                if pattern.label(a) == pattern.label(b) {
                    identifications.push((i, j));
                }
            }
        }
        Self {
            first,
            second,
            cross_edges,
            identifications,
        }
    }

    /// Whole pattern in one half; the second half holds only the root.
    #[must_use]
    pub fn single(pattern: &Graph, order: Vec<VertexId>) -> Self {
        let root = order[0];
        Self::from_orders(pattern, order, vec![root])
    }

    /// True when there is nothing to join.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.second.len() <= 1
    }

    /// Number of cross edges landing on each position of the second half.
    #[must_use]
    pub fn second_multiplicity(&self) -> Vec<usize> {
        let mut counts = vec![0; self.second.len()];
        for &(_, j) in &self.cross_edges {
            counts[j] += 1;
        }
        counts
    }
}

/// Each position after the first has an earlier pattern neighbour.
fn is_connected_prefix(pattern: &Graph, order: &[VertexId]) -> bool {
    (1..order.len()).all(|k| {
        order[..k]
            .iter()
            .any(|&w| pattern.check_edge_existence(w, order[k]))
    })
}

/// Splits a pattern tree into two halves sharing the root.
pub struct Partitioner<'a> {
    pattern: &'a Graph,
    tree: &'a PatternTree,
    /// Candidate count per pattern vertex.
    sizes: &'a [usize],
}

impl<'a> Partitioner<'a> {
    /// Partitioner using `sizes` as flat candidate counts per pattern vertex.
    pub const fn new(pattern: &'a Graph, tree: &'a PatternTree, sizes: &'a [usize]) -> Self {
        Self {
            pattern,
            tree,
            sizes,
        }
    }

    fn cartesian(&self, vertices: &[VertexId]) -> u128 {
        vertices
            .iter()
            .fold(1u128, |acc, &u| acc.saturating_mul(self.sizes[u as usize] as u128))
    }

    /// Split the pattern. With `enabled == false`, or fewer than two root
    /// children, the whole order lands in the first half.
    #[must_use]
    pub fn split(&self, enabled: bool) -> PartitionPlan {
        let root = self.tree.root();
        let children = self.tree.children(root);
        if !enabled || children.len() < 2 {
            let mut order = self.tree.order().to_vec();
            self.reorder(&mut order);
            return PartitionPlan::single(self.pattern, order);
        }

        let subtrees: Vec<Vec<VertexId>> = children.iter().map(|&c| self.tree.subtree(c)).collect();
        let chosen = if children.len() <= MAX_EXHAUSTIVE_CHILDREN {
            self.best_subset(&subtrees)
        } else {
            self.greedy_subset(&subtrees)
        };

        let (mut first, mut second) = (vec![root], vec![root]);
        let mut in_first = vec![false; children.len()];
        for &i in &chosen {
            in_first[i] = true;
        }
        for (i, &c) in children.iter().enumerate() {
            let target = if in_first[i] { &mut first } else { &mut second };
            target.push(c);
        }
        // Breadth-first below the children in place.
        for group in [&mut first, &mut second] {
            let mut queue: VecDeque<VertexId> = group.drain(1..).collect();
            while let Some(x) = queue.pop_front() {
                group.push(x);
                queue.extend(self.tree.children(x).iter().copied());
            }
        }

        self.repair(&mut first, &mut second);
        self.reorder(&mut first);
        self.reorder(&mut second);

        let plan = PartitionPlan::from_orders(self.pattern, first, second);
        debug!(
            first = ?plan.first.order,
            second = ?plan.second.order,
            cross_edges = plan.cross_edges.len(),
            "partition"
        );
        plan
    }

    /// Indices of root children forming the first group: the subset of at
    /// most half the children minimising the larger of the two cartesian
    /// products, then the number of cross edges. Earlier subsets win ties.
    fn best_subset(&self, subtrees: &[Vec<VertexId>]) -> Vec<usize> {
        let m = subtrees.len();
        let carts: Vec<u128> = subtrees.iter().map(|s| self.cartesian(s)).collect();

        let mut owner = vec![usize::MAX; self.pattern.vertex_count()];
        for (i, s) in subtrees.iter().enumerate() {
            for &u in s {
                owner[u as usize] = i;
            }
        }
        let mut between = vec![vec![0usize; m]; m];
        for (a, b) in self.pattern.edges() {
            let (ia, ib) = (owner[a as usize], owner[b as usize]);
            if ia != usize::MAX && ib != usize::MAX && ia != ib {
                between[ia][ib] += 1;
                between[ib][ia] += 1;
            }
        }

        let mut best: Option<((u128, usize), Vec<usize>)> = None;
        for k in 1..=m / 2 {
            for subset in (0..m).combinations(k) {
                let mut inside = vec![false; m];
                for &i in &subset {
                    inside[i] = true;
                }
                let (mut c1, mut c2) = (1u128, 1u128);
                for i in 0..m {
                    if inside[i] {
                        c1 = c1.saturating_mul(carts[i]);
                    } else {
                        c2 = c2.saturating_mul(carts[i]);
                    }
                }
                let cross: usize = subset
                    .iter()
                    .map(|&i| (0..m).filter(|&j| !inside[j]).map(|j| between[i][j]).sum::<usize>())
                    .sum();
                let key = (c1.max(c2), cross);
                trace!(?subset, ?key, "subset score");
                if best.as_ref().is_none_or(|(b, _)| key < *b) {
                    best = Some((key, subset));
                }
            }
        }
        best.map(|(_, s)| s).unwrap_or_default()
    }

    /// Largest subtrees first, each into the group with the smaller product.
    fn greedy_subset(&self, subtrees: &[Vec<VertexId>]) -> Vec<usize> {
        let carts: Vec<u128> = subtrees.iter().map(|s| self.cartesian(s)).collect();
        let mut indices: Vec<usize> = (0..subtrees.len()).collect();
        indices.sort_by(|&a, &b| carts[b].cmp(&carts[a]).then(a.cmp(&b)));
        let (mut c1, mut c2) = (1u128, 1u128);
        let mut chosen = Vec::new();
        for i in indices {
            if c1 <= c2 && chosen.len() < subtrees.len() / 2 {
                c1 = c1.saturating_mul(carts[i]);
                chosen.push(i);
            } else {
                c2 = c2.saturating_mul(carts[i]);
            }
        }
        chosen.sort_unstable();
        chosen
    }

    /// Move vertices that have no pattern edge inside their own half (root
    /// aside) but do have one into the other half. Reverted when a half
    /// would be left with two members or fewer.
    fn repair(&self, first: &mut Vec<VertexId>, second: &mut Vec<VertexId>) {
        let (orig_first, orig_second) = (first.clone(), second.clone());
        let p = self.pattern;
        let has_edge_into = |x: VertexId, group: &[VertexId]| {
            group[1..].iter().any(|&w| w != x && p.check_edge_existence(x, w))
        };
        for _ in 0..MAX_REPAIR_ITERATIONS {
            let mut moved = false;
            for flip in [false, true] {
                let (from, to) = if flip {
                    (&mut *second, &mut *first)
                } else {
                    (&mut *first, &mut *second)
                };
                let mut k = 1;
                while k < from.len() {
                    let x = from[k];
                    if !has_edge_into(x, from.as_slice()) && has_edge_into(x, to.as_slice()) {
                        from.remove(k);
                        to.push(x);
                        moved = true;
                    } else {
                        k += 1;
                    }
                }
            }
            if !moved {
                break;
            }
        }
        if first.len() <= 2 || second.len() <= 2 {
            if *first != orig_first || *second != orig_second {
                trace!("repair reverted");
            }
            *first = orig_first;
            *second = orig_second;
        }
    }

    /// Pull vertices with clearly fewer candidates (1.5x) forward, keeping
    /// every position attached to an earlier one.
    fn reorder(&self, order: &mut [VertexId]) {
        let n = order.len();
        for i in 1..n {
            for j in i + 1..n {
                let (a, b) = (self.sizes[order[i] as usize], self.sizes[order[j] as usize]);
                if 2 * a > 3 * b {
                    order.swap(i, j);
                    if !is_connected_prefix(self.pattern, order) {
                        order.swap(i, j);
                    }
                }
            }
        }
    }
}

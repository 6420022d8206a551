//! Cross join of the two half tries.
//!
//! The half with fewer complete rows drives the join. For each of its rows,
//! cut at the deepest position that takes part in a cross constraint, the
//! data neighbours of every cross-edge endpoint are counted per inner
//! position. An inner row survives only when each constrained position is
//! hit by all of its cross edges and does not reuse a data vertex bound to
//! a same-label position of the outer row. Positions below the constrained
//! prefix on either side contribute their leaf counts as a product.

use tracing::debug;

use super::trie::LocalTrie;
use crate::context::MatchContext;
use crate::graph::{Graph, VertexId};
use crate::partition::{Half, PartitionPlan};
use crate::profiling::Timer;

struct Side<'a> {
    half: &'a Half,
    trie: &'a LocalTrie,
}

pub(crate) struct CrossJoin<'a> {
    data: &'a Graph,
    pattern: &'a Graph,
    outer: Side<'a>,
    inner: Side<'a>,
    /// `(outer position, inner position)`.
    cross: Vec<(usize, usize)>,
    identifications: Vec<(usize, usize)>,
}

impl<'a> CrossJoin<'a> {
    /// Join of the two half tries of `plan`.
    pub fn new(
        data: &'a Graph,
        pattern: &'a Graph,
        plan: &'a PartitionPlan,
        first: &'a LocalTrie,
        second: &'a LocalTrie,
    ) -> Self {
        let a = Side {
            half: &plan.first,
            trie: first,
        };
        let b = Side {
            half: &plan.second,
            trie: second,
        };
        if first.leaves() <= second.leaves() {
            Self {
                data,
                pattern,
                outer: a,
                inner: b,
                cross: plan.cross_edges.clone(),
                identifications: plan.identifications.clone(),
            }
        } else {
            let flip = |pairs: &[(usize, usize)]| -> Vec<(usize, usize)> {
                pairs.iter().map(|&(i, j)| (j, i)).collect()
            };
            Self {
                data,
                pattern,
                outer: b,
                inner: a,
                cross: flip(&plan.cross_edges),
                identifications: flip(&plan.identifications),
            }
        }
    }

    /// Number of combined rows.
    pub fn count(&self, ctx: &mut MatchContext) -> u64 {
        let _timer = Timer::new("enumerate::join");
        if self.outer.trie.leaves() == 0 || self.inner.trie.leaves() == 0 {
            return 0;
        }
        let constrained = self.cross.iter().chain(&self.identifications);
        let outer_cut = constrained.clone().map(|&(o, _)| o).max().unwrap_or(0);
        let inner_cut = constrained.map(|&(_, i)| i).max().unwrap_or(0);

        let inner_len = self.inner.half.len();
        let mut required = vec![0usize; inner_len];
        for &(_, i) in &self.cross {
            required[i] += 1;
        }
        let mut distinct = vec![false; inner_len];
        for &(_, i) in &self.identifications {
            distinct[i] = true;
        }
        let mut outer_marks: Vec<usize> = self.identifications.iter().map(|&(o, _)| o).collect();
        outer_marks.sort_unstable();
        outer_marks.dedup();

        let n = ctx.data_vertices();
        ctx.prepare_join(inner_len);
        let mut row = vec![0 as VertexId; self.outer.half.len()];
        let mut stack: Vec<(usize, usize)> = Vec::new();
        let mut total = 0u64;

        for orow in 0..self.outer.trie.rows(outer_cut) {
            let below = self.outer.trie.leaf_range(outer_cut, orow).len() as u64;
            if below == 0 {
                continue;
            }
            self.outer.trie.reconstruct(outer_cut, orow, &mut row);
            let Ok(root_row) = self.inner.trie.roots().binary_search(&row[0]) else {
                continue;
            };
            ctx.stats.join_outer_rows += 1;

            for &p in &outer_marks {
                ctx.visited[row[p] as usize] = true;
            }
            for &(o, i) in &self.cross {
                let label = self.pattern.label(self.inner.half.order[i]);
                for &x in self.data.neighbors_by_label(row[o], label) {
                    let idx = i * n + x as usize;
                    if ctx.join_hits[idx] == 0 {
                        ctx.join_touched.push(idx);
                    }
                    ctx.join_hits[idx] += 1;
                }
            }

            let mut matched = 0u64;
            stack.clear();
            stack.push((0, root_row));
            while let Some((level, r)) = stack.pop() {
                if level == inner_cut {
                    matched += self.inner.trie.leaf_range(level, r).len() as u64;
                    continue;
                }
                let next = level + 1;
                for child in self.inner.trie.child_range(level, r) {
                    ctx.stats.join_probes += 1;
                    let x = self.inner.trie.value(next, child) as usize;
                    if required[next] > 0 && ctx.join_hits[next * n + x] as usize != required[next] {
                        continue;
                    }
                    if distinct[next] && ctx.visited[x] {
                        continue;
                    }
                    stack.push((next, child));
                }
            }

            for &p in &outer_marks {
                ctx.visited[row[p] as usize] = false;
            }
            ctx.clear_join();

            total = total.saturating_add(matched.saturating_mul(below));
        }
        debug!(
            total,
            outer_rows = ctx.stats.join_outer_rows,
            probes = ctx.stats.join_probes,
            "cross join"
        );
        total
    }
}

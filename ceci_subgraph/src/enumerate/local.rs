//! Enumeration of one half, either into a [`LocalTrie`] or depth-first.

use tracing::trace;

use super::trie::LocalTrie;
use crate::context::MatchContext;
use crate::graph::{Graph, VertexId};
use crate::intersect::SetIntersector;
use crate::order::PatternTree;
use crate::partition::Half;
use crate::profiling::Timer;
use crate::refine::CandidateSpace;

pub(crate) struct LocalEnumerator<'a> {
    /// Data graph.
    pub data: &'a Graph,
    /// Pattern graph.
    pub pattern: &'a Graph,
    /// BFS tree of the pattern.
    pub tree: &'a PatternTree,
    /// Refined candidate space.
    pub space: &'a CandidateSpace,
    /// Flat candidates per pattern vertex.
    pub flat: &'a [Vec<VertexId>],
    /// Intersection kernel.
    pub intersector: SetIntersector,
}

impl LocalEnumerator<'_> {
    /// Position of each vertex's tree parent within `half`, when it comes
    /// earlier in the half.
    fn tree_parents(&self, half: &Half) -> Vec<Option<usize>> {
        let order = &half.order;
        (0..order.len())
            .map(|k| {
                self.tree
                    .parent(order[k])
                    .and_then(|p| order[..k].iter().position(|&w| w == p))
            })
            .collect()
    }

    /// Data vertices that can sit at position `k` after the prefix
    /// `row[..k]`, written to `out` in ascending order.
    fn extend(
        &self,
        half: &Half,
        k: usize,
        tree_parent: Option<usize>,
        row: &[VertexId],
        ctx: &mut MatchContext,
        out: &mut Vec<VertexId>,
    ) {
        let u = half.order[k];
        let label = self.pattern.label(u);
        let mut buffer = std::mem::take(&mut ctx.buffer);
        let mut spare = std::mem::take(&mut ctx.spare);
        buffer.clear();
        match tree_parent {
            Some(pp) => buffer.extend_from_slice(self.space.group(u, row[pp])),
            None => buffer.extend_from_slice(&self.flat[u as usize]),
        }
        for &c in &half.connections[k] {
            if buffer.is_empty() {
                break;
            }
            if Some(c) == tree_parent {
                continue;
            }
            spare.clear();
            self.intersector
                .intersect_into(&buffer, self.data.neighbors_by_label(row[c], label), &mut spare);
            std::mem::swap(&mut buffer, &mut spare);
        }

        out.clear();
        if half.morphism[k] {
            for &v in &row[..k] {
                ctx.visited[v as usize] = true;
            }
            out.extend(buffer.iter().copied().filter(|&v| !ctx.visited[v as usize]));
            for &v in &row[..k] {
                ctx.visited[v as usize] = false;
            }
        } else {
            out.extend_from_slice(&buffer);
        }
        ctx.buffer = buffer;
        ctx.spare = spare;
    }

    /// Every injective, edge-respecting assignment of `half`, level by level.
    pub fn build(&self, half: &Half, ctx: &mut MatchContext) -> LocalTrie {
        let _timer = Timer::new("enumerate::local");
        let order = &half.order;
        let parents = self.tree_parents(half);
        let mut trie = LocalTrie::with_root(&self.flat[order[0] as usize]);
        let mut row = vec![0 as VertexId; order.len()];
        let mut next = Vec::new();

        for k in 1..order.len() {
            trie.open_level();
            for prev in 0..trie.rows(k - 1) {
                trie.reconstruct(k - 1, prev, &mut row);
                self.extend(half, k, parents[k], &row, ctx, &mut next);
                for &v in &next {
                    trie.push(v, prev);
                }
            }
            trace!(level = k, vertex = order[k], rows = trie.rows(k), "trie level");
            if trie.rows(k) == 0 {
                break;
            }
        }

        // A level that emptied out leaves the deeper levels unopened.
        while trie.depth() < order.len() {
            trie.open_level();
        }
        trie.reverse_cuts();
        ctx.stats.trie_levels.push(trie.level_sizes());
        trie
    }

    /// Depth-first walk over the complete rows of `half`, in the same order
    /// [`Self::build`] lays them out. Rows are handed to `emit` by position;
    /// the walk stops as soon as `emit` returns `false`, and the return
    /// value says whether that happened.
    pub fn walk<F>(&self, half: &Half, ctx: &mut MatchContext, mut emit: F) -> bool
    where
        F: FnMut(&[VertexId]) -> bool,
    {
        let _timer = Timer::new("enumerate::walk");
        let n = half.order.len();
        let parents = self.tree_parents(half);
        let mut row = vec![0 as VertexId; n];
        let mut frames: Vec<Vec<VertexId>> = vec![Vec::new(); n];
        let mut cursor = vec![0usize; n];
        let mut visits = vec![0usize; n];
        frames[0].extend_from_slice(&self.flat[half.order[0] as usize]);

        let mut k = 0;
        let mut stopped = false;
        loop {
            let Some(&v) = frames[k].get(cursor[k]) else {
                if k == 0 {
                    break;
                }
                k -= 1;
                continue;
            };
            cursor[k] += 1;
            row[k] = v;
            visits[k] += 1;
            if k + 1 == n {
                if !emit(&row) {
                    stopped = true;
                    break;
                }
                continue;
            }
            k += 1;
            let mut frame = std::mem::take(&mut frames[k]);
            self.extend(half, k, parents[k], &row, ctx, &mut frame);
            frames[k] = frame;
            cursor[k] = 0;
        }

        trace!(?visits, stopped, "walk done");
        ctx.stats.trie_levels.push(visits);
        stopped
    }
}

//! Embedding enumeration over a refined candidate space.
//!
//! Without a limit, each half of a [`PartitionPlan`] is expanded into a
//! [`LocalTrie`] and the two tries are joined; a degenerate plan is counted
//! straight off its only trie. With a limit, the whole pattern is walked
//! depth-first so that the work stops with the first row past the cap.
//! Embedding materialisation and vertex-set deduplication always use a
//! single half.

mod join;
mod local;
mod trie;

use std::collections::HashSet;

use tracing::debug;

pub use trie::LocalTrie;

use crate::context::MatchContext;
use crate::embedding::Embedding;
use crate::graph::{Graph, VertexId};
use crate::intersect::SetIntersector;
use crate::order::PatternTree;
use crate::partition::{Half, PartitionPlan};
use crate::refine::CandidateSpace;
use join::CrossJoin;
use local::LocalEnumerator;

/// Count produced by [`Enumerator::count`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tally {
    /// Embeddings counted, never above the limit.
    pub count: u64,
    /// Rows beyond the limit existed and were not counted.
    pub truncated: bool,
    /// Produced by the cross join rather than a single trie.
    pub joined: bool,
}

impl Tally {
    const fn single(count: u64, truncated: bool) -> Self {
        Self {
            count,
            truncated,
            joined: false,
        }
    }
}

/// Turns a refined candidate space into counts or embeddings.
pub struct Enumerator<'a> {
    local: LocalEnumerator<'a>,
}

/// Embedding for a row laid out by `order`.
fn to_embedding(order: &[VertexId], row: &[VertexId]) -> Embedding {
    let mut mapping = vec![0 as VertexId; order.len()];
    for (k, &u) in order.iter().enumerate() {
        mapping[u as usize] = row[k];
    }
    Embedding::new(mapping)
}

impl<'a> Enumerator<'a> {
    /// Enumerator over `space`, with `flat` its flattened candidate lists.
    pub fn new(
        data: &'a Graph,
        pattern: &'a Graph,
        tree: &'a PatternTree,
        space: &'a CandidateSpace,
        flat: &'a [Vec<VertexId>],
        intersector: SetIntersector,
    ) -> Self {
        Self {
            local: LocalEnumerator {
                data,
                pattern,
                tree,
                space,
                flat,
                intersector,
            },
        }
    }

    /// Number of embeddings, capped at `limit`. A capped count ignores the
    /// split and walks the whole pattern depth-first.
    pub fn count(&self, plan: &PartitionPlan, limit: Option<u64>, ctx: &mut MatchContext) -> Tally {
        if let Some(cap) = limit {
            if plan.is_degenerate() {
                return self.walk_count(&plan.first, cap, ctx);
            }
            let whole = PartitionPlan::single(self.local.pattern, self.local.tree.order().to_vec());
            return self.walk_count(&whole.first, cap, ctx);
        }
        if plan.is_degenerate() {
            let trie = self.local.build(&plan.first, ctx);
            return Tally::single(trie.leaves() as u64, false);
        }
        let first = self.local.build(&plan.first, ctx);
        if first.leaves() == 0 {
            return Tally {
                count: 0,
                truncated: false,
                joined: true,
            };
        }
        let second = self.local.build(&plan.second, ctx);
        debug!(first = first.leaves(), second = second.leaves(), "half rows");
        let count = CrossJoin::new(self.local.data, self.local.pattern, plan, &first, &second).count(ctx);
        Tally {
            count,
            truncated: false,
            joined: true,
        }
    }

    fn walk_count(&self, half: &Half, cap: u64, ctx: &mut MatchContext) -> Tally {
        let mut count = 0u64;
        let truncated = self.local.walk(half, ctx, |_| {
            if count >= cap {
                return false;
            }
            count += 1;
            true
        });
        Tally::single(count, truncated)
    }

    /// Materialise up to `limit` embeddings of a single-half plan.
    pub fn embeddings(
        &self,
        plan: &PartitionPlan,
        limit: Option<u64>,
        ctx: &mut MatchContext,
    ) -> (Vec<Embedding>, bool) {
        let order = &plan.first.order;
        let Some(cap) = limit else {
            let trie = self.local.build(&plan.first, ctx);
            return (self.rows(&trie, plan).collect(), false);
        };
        let mut out = Vec::new();
        let truncated = self.local.walk(&plan.first, ctx, |row| {
            if out.len() as u64 >= cap {
                return false;
            }
            out.push(to_embedding(order, row));
            true
        });
        (out, truncated)
    }

    /// First embedding onto each distinct data vertex set, at most `limit`
    /// of them.
    pub fn distinct_embeddings(
        &self,
        plan: &PartitionPlan,
        limit: Option<u64>,
        ctx: &mut MatchContext,
    ) -> (Vec<Embedding>, bool) {
        let order = &plan.first.order;
        let mut seen: HashSet<Vec<VertexId>> = HashSet::new();
        let mut out = Vec::new();
        let truncated = self.local.walk(&plan.first, ctx, |row| {
            let embedding = to_embedding(order, row);
            if !seen.insert(embedding.signature()) {
                return true;
            }
            if limit.is_some_and(|cap| out.len() as u64 >= cap) {
                return false;
            }
            out.push(embedding);
            true
        });
        (out, truncated)
    }

    /// Number of distinct data vertex sets covered by embeddings, capped at
    /// `limit`. Stops at the first set past the cap.
    pub fn distinct_subgraphs(&self, plan: &PartitionPlan, limit: Option<u64>, ctx: &mut MatchContext) -> Tally {
        let mut seen: HashSet<Vec<VertexId>> = HashSet::new();
        let mut signature = Vec::with_capacity(plan.first.len());
        let truncated = self.local.walk(&plan.first, ctx, |row| {
            signature.clear();
            signature.extend_from_slice(row);
            signature.sort_unstable();
            if seen.contains(&signature) {
                return true;
            }
            if limit.is_some_and(|cap| seen.len() as u64 >= cap) {
                return false;
            }
            seen.insert(signature.clone());
            true
        });
        Tally::single(seen.len() as u64, truncated)
    }

    fn rows<'t>(&'t self, trie: &'t LocalTrie, plan: &'t PartitionPlan) -> impl Iterator<Item = Embedding> + 't {
        let order = &plan.first.order;
        let last = order.len() - 1;
        let mut row = vec![0 as VertexId; order.len()];
        (0..trie.leaves()).map(move |leaf| {
            trie.reconstruct(last, leaf, &mut row);
            to_embedding(order, &row)
        })
    }
}

#[cfg(test)]
mod tests {
    use ceci_common::IntersectionStrategy;

    use super::*;
    use crate::candidates::CandidateGenerator;
    use crate::order::OrderBuilder;
    use crate::partition::Partitioner;
    use crate::refine::CandidateRefiner;

    /// Tally under `plan`, trie rows, and the same rows walked depth-first.
    fn run(
        data: &Graph,
        pattern: &Graph,
        partition: bool,
        limit: Option<u64>,
    ) -> (Tally, Vec<Embedding>, Vec<Embedding>) {
        let mut ctx = MatchContext::new(data.vertex_count());
        let generator = CandidateGenerator::new(data, pattern);
        let mut candidates = generator.generate();
        let tree = OrderBuilder::new(pattern).build(generator.select_root());
        let intersector = SetIntersector::new(IntersectionStrategy::Merge);
        let refiner = CandidateRefiner::new(data, pattern, &tree, intersector);
        refiner.prune(&mut candidates, 3, &mut ctx);
        let mut space = refiner.build_space(&candidates, &mut ctx).expect("non-empty");
        refiner.refine(&mut space, &mut ctx);
        let flat = space.flatten();
        let sizes: Vec<usize> = flat.iter().map(Vec::len).collect();
        let partitioner = Partitioner::new(pattern, &tree, &sizes);
        let enumerator = Enumerator::new(data, pattern, &tree, &space, &flat, intersector);
        let tally = enumerator.count(&partitioner.split(partition), limit, &mut ctx);
        let single = partitioner.split(false);
        let (rows, _) = enumerator.embeddings(&single, None, &mut ctx);
        let (walked, truncated) = enumerator.embeddings(&single, Some(u64::MAX), &mut ctx);
        assert!(!truncated);
        (tally, rows, walked)
    }

    /// Hub 0 with spokes 1..=4 and the rim edges 1-2, 3-4.
    fn wheel() -> Graph {
        Graph::from_edges(
            vec![0, 1, 1, 1, 1],
            &[(0, 1), (0, 2), (0, 3), (0, 4), (1, 2), (3, 4)],
        )
        .expect("valid")
    }

    /// Hub with three spokes, two of which are joined.
    fn fan() -> Graph {
        Graph::from_edges(vec![0, 1, 1, 1], &[(0, 1), (0, 2), (0, 3), (1, 2)]).expect("valid")
    }

    #[test]
    fn join_matches_single_half() {
        let (data, pattern) = (wheel(), fan());
        let (joined, rows, _) = run(&data, &pattern, true, None);
        let (single, _, _) = run(&data, &pattern, false, None);
        assert_eq!(joined.count, single.count);
        assert_eq!(single.count, rows.len() as u64);
        // Ordered rim edge (4 ways) times one of the two remaining spokes.
        assert_eq!(single.count, 8);
        assert!(rows.iter().all(|e| e.is_valid(&data, &pattern)));
    }

    #[test]
    fn limit_truncates() {
        let (data, pattern) = (wheel(), fan());
        let (tally, _, _) = run(&data, &pattern, false, Some(3));
        assert_eq!(tally.count, 3);
        assert!(tally.truncated);
        let (tally, _, _) = run(&data, &pattern, true, Some(8));
        assert_eq!(tally.count, 8);
        assert!(!tally.truncated);
        assert!(!tally.joined);
    }

    #[test]
    fn walk_visits_trie_rows_in_order() {
        let (data, pattern) = (wheel(), fan());
        let (_, rows, walked) = run(&data, &pattern, false, None);
        assert_eq!(rows, walked);
    }
}

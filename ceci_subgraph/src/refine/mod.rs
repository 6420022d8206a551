//! Structural candidate refinement.
//!
//! Three stages, each of which only ever removes candidates:
//!
//! 1. pruning rounds over the flat NLF candidate lists, alternating between
//!    backward and forward neighbours;
//! 2. construction of the compact [`CandidateSpace`] top-down along the
//!    visitation order;
//! 3. reverse refinement of that space to a fixpoint, using provenance to
//!    check non-tree pattern edges and tree links to drop orphaned entries.

mod provenance;
mod space;

use std::collections::HashMap;
use std::slice;

use tracing::{debug, trace};

pub use provenance::{NonTreeEdge, Provenance, ProvenanceKey, non_tree_edges};
pub use space::{CandidateSpace, Groups};

use crate::candidates::CandidateSets;
use crate::context::MatchContext;
use crate::graph::{Graph, VertexId};
use crate::intersect::SetIntersector;
use crate::order::PatternTree;
use crate::profiling::Timer;

/// Tombstone for candidates removed during pruning.
const INVALID: VertexId = VertexId::MAX;

/// Prunes candidates and builds and refines the candidate space.
pub struct CandidateRefiner<'a> {
    data: &'a Graph,
    pattern: &'a Graph,
    tree: &'a PatternTree,
    intersector: SetIntersector,
    edges: Vec<NonTreeEdge>,
    anchors: Vec<Vec<VertexId>>,
}

impl<'a> CandidateRefiner<'a> {
    /// Refiner over the non-tree edges of `tree`.
    pub fn new(
        data: &'a Graph,
        pattern: &'a Graph,
        tree: &'a PatternTree,
        intersector: SetIntersector,
    ) -> Self {
        let (edges, anchors) = non_tree_edges(tree);
        debug!(non_tree_edges = edges.len(), "refiner ready");
        Self {
            data,
            pattern,
            tree,
            intersector,
            edges,
            anchors,
        }
    }

    /// Pattern edges outside the BFS tree.
    #[must_use]
    pub fn non_tree_edges(&self) -> &[NonTreeEdge] {
        &self.edges
    }

    /// Run `rounds` pruning rounds. Even rounds walk the order forwards and
    /// use backward neighbours as pivots, odd rounds walk it backwards and
    /// use forward neighbours. Returns the candidate total after each round.
    pub fn prune(
        &self,
        candidates: &mut CandidateSets,
        rounds: usize,
        ctx: &mut MatchContext,
    ) -> Vec<usize> {
        let _timer = Timer::new("refine::prune");
        let order = self.tree.order();
        let mut totals = Vec::with_capacity(rounds);
        for round in 0..rounds {
            if round % 2 == 0 {
                for &u in order.iter().skip(1) {
                    self.prune_vertex(candidates, u, &self.tree.node(u).bn, ctx);
                }
            } else {
                for &u in order.iter().rev().skip(1) {
                    self.prune_vertex(candidates, u, &self.tree.node(u).fn_, ctx);
                }
            }
            let total = (0..candidates.len() as VertexId)
                .map(|u| candidates.get(u).iter().filter(|&&v| v != INVALID).count())
                .sum();
            trace!(round, total, "pruning round");
            totals.push(total);
        }
        for u in 0..candidates.len() as VertexId {
            candidates.get_mut(u).retain(|&v| v != INVALID);
        }
        totals
    }

    /// Keep a candidate of `u` only if every pivot has a candidate adjacent
    /// to it. `flags[n] == i` after pivot `i` means `n` was hit by all of the
    /// first `i` pivots.
    fn prune_vertex(
        &self,
        candidates: &mut CandidateSets,
        u: VertexId,
        pivots: &[VertexId],
        ctx: &mut MatchContext,
    ) {
        if pivots.is_empty() {
            return;
        }
        let label = self.pattern.label(u);
        let degree = self.pattern.degree(u);
        for (i, &pivot) in pivots.iter().enumerate() {
            for &v in candidates.get(pivot) {
                if v == INVALID {
                    continue;
                }
                for &n in self.data.neighbors_by_label(v, label) {
                    if self.data.degree(n) < degree {
                        continue;
                    }
                    let flag = &mut ctx.flags[n as usize];
                    if *flag == i as u32 {
                        *flag += 1;
                        if i == 0 {
                            ctx.touched.push(n);
                        }
                    }
                }
            }
        }
        let need = pivots.len() as u32;
        for v in candidates.get_mut(u).iter_mut() {
            if *v != INVALID && ctx.flags[*v as usize] != need {
                *v = INVALID;
            }
        }
        ctx.clear_flags();
    }

    /// Build the compact candidate space. `Err(u)` names a pattern vertex
    /// left without candidates, which proves there is no embedding.
    pub fn build_space(
        &self,
        candidates: &CandidateSets,
        ctx: &mut MatchContext,
    ) -> Result<CandidateSpace, VertexId> {
        let _timer = Timer::new("refine::build_space");
        let n = self.tree.len();
        let mut space = CandidateSpace::new(n);
        let root = self.tree.root();
        for &v in candidates.get(root) {
            space.groups_mut(root).insert(v, vec![v]);
        }
        if space.groups(root).is_empty() {
            return Err(root);
        }

        let mut built = vec![false; n];
        built[root as usize] = true;
        for &u in self.tree.order().iter().skip(1) {
            let Some(p) = self.tree.parent(u) else {
                continue;
            };
            let label = self.pattern.label(u);
            let own = candidates.get(u);
            for v_f in space.flat(p) {
                ctx.buffer.clear();
                self.intersector
                    .intersect_into(self.data.neighbors_by_label(v_f, label), own, &mut ctx.buffer);
                if ctx.buffer.is_empty() {
                    space.remove_candidate(p, v_f);
                    for &c in self.tree.children(p) {
                        if built[c as usize] {
                            space.groups_mut(c).remove(&v_f);
                        }
                    }
                } else {
                    space.groups_mut(u).insert(v_f, ctx.buffer.clone());
                }
            }
            built[u as usize] = true;
            if space.groups(p).is_empty() {
                return Err(p);
            }
            if space.groups(u).is_empty() {
                return Err(u);
            }
        }
        debug!(entries = space.entries(), "candidate space built");
        Ok(space)
    }

    /// Provenance of every candidate on a path between an anchor and a
    /// non-tree edge endpoint, computed top-down from the current space.
    #[must_use]
    pub fn provenance(&self, space: &CandidateSpace) -> Provenance {
        let mut prov = Provenance::default();
        if self.edges.is_empty() {
            return prov;
        }
        for &u in self.tree.order() {
            let Some(p) = self.tree.parent(u) else {
                continue;
            };
            let mut local: HashMap<(VertexId, VertexId), Vec<VertexId>> = HashMap::new();
            for &b in &self.anchors[u as usize] {
                if b == u {
                    continue;
                }
                for (g, list) in space.groups(u) {
                    let origins = prov.lookup(p, g, b);
                    if origins.is_empty() {
                        continue;
                    }
                    for &v in list {
                        local.entry((v, b)).or_default().extend_from_slice(origins);
                    }
                }
            }
            for ((data, anchor), values) in local {
                prov.insert(
                    ProvenanceKey {
                        vertex: u,
                        data,
                        anchor,
                    },
                    values,
                );
            }
        }
        prov
    }

    /// Remove candidates of both endpoints of every non-tree edge that have
    /// no adjacent partner with a shared anchor assignment.
    fn check_non_tree_edges(
        &self,
        space: &mut CandidateSpace,
        prov: &Provenance,
        ctx: &mut MatchContext,
    ) -> bool {
        let mut changed = false;
        for e in &self.edges {
            let (u, w, b) = (e.later, e.earlier, e.anchor);
            let label_u = self.pattern.label(u);
            let label_w = self.pattern.label(w);

            let flat_u = space.flat(u);
            let parent_w = self.tree.parent(w).unwrap_or(w);
            changed |= space.retain(w, |h, x| {
                let own = if b == w {
                    slice::from_ref(&x)
                } else {
                    prov.lookup(parent_w, &h, b)
                };
                ctx.buffer.clear();
                self.intersector
                    .intersect_into(self.data.neighbors_by_label(x, label_u), &flat_u, &mut ctx.buffer);
                ctx.buffer
                    .iter()
                    .any(|v| self.intersector.intersects(prov.lookup(u, v, b), own))
            });

            let flat_w = space.flat(w);
            let parent_u = self.tree.parent(u).unwrap_or(u);
            changed |= space.retain(u, |g, v| {
                let own = prov.lookup(parent_u, &g, b);
                ctx.buffer.clear();
                self.intersector
                    .intersect_into(self.data.neighbors_by_label(v, label_w), &flat_w, &mut ctx.buffer);
                ctx.buffer
                    .iter()
                    .any(|x| self.intersector.intersects(own, prov.lookup(w, x, b)))
            });
        }
        changed
    }

    /// Drop candidates without a group under some child, and groups whose
    /// parent candidate is gone.
    fn enforce_tree_links(&self, space: &mut CandidateSpace) -> bool {
        let mut changed = false;
        for &u in self.tree.order().iter().rev() {
            for &c in self.tree.children(u) {
                let supported: Vec<VertexId> = space.groups(c).keys().copied().collect();
                changed |= space.retain(u, |_, v| supported.binary_search(&v).is_ok());
            }
        }
        for &u in self.tree.order().iter().skip(1) {
            let Some(p) = self.tree.parent(u) else {
                continue;
            };
            let live = space.flat(p);
            changed |= space.retain_groups(u, |g| live.binary_search(&g).is_ok());
        }
        changed
    }

    /// Reverse refinement until nothing changes or some pattern vertex runs
    /// out of candidates. Returns whether anything was removed.
    pub fn refine(&self, space: &mut CandidateSpace, ctx: &mut MatchContext) -> bool {
        let _timer = Timer::new("refine::fixpoint");
        let mut any = false;
        loop {
            ctx.stats.refinement_passes += 1;
            let prov = self.provenance(space);
            let mut changed = self.check_non_tree_edges(space, &prov, ctx);
            changed |= self.enforce_tree_links(space);
            trace!(changed, entries = space.entries(), "refinement pass");
            if !changed {
                break;
            }
            any = true;
            if space.first_empty().is_some() {
                break;
            }
        }
        any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::CandidateGenerator;
    use crate::order::OrderBuilder;

    struct Fixture {
        data: Graph,
        pattern: Graph,
        tree: PatternTree,
    }

    impl Fixture {
        fn new(data: Graph, pattern: Graph, root: VertexId) -> Self {
            let tree = OrderBuilder::new(&pattern).build(root);
            Self {
                data,
                pattern,
                tree,
            }
        }

        fn refiner(&self) -> CandidateRefiner<'_> {
            CandidateRefiner::new(&self.data, &self.pattern, &self.tree, SetIntersector::default())
        }

        fn candidates(&self) -> CandidateSets {
            CandidateGenerator::new(&self.data, &self.pattern).generate()
        }
    }

    /// Triangle pattern against a triangle plus a pendant square.
    fn triangle_vs_mixed() -> Fixture {
        let data = Graph::from_edges(
            vec![0; 7],
            &[(0, 1), (1, 2), (0, 2), (2, 3), (3, 4), (4, 5), (5, 6), (6, 3)],
        )
        .expect("valid");
        let pattern = Graph::from_edges(vec![0; 3], &[(0, 1), (1, 2), (0, 2)]).expect("valid");
        Fixture::new(data, pattern, 0)
    }

    #[test]
    fn pruning_never_grows() {
        let f = triangle_vs_mixed();
        let mut candidates = f.candidates();
        let before = candidates.total();
        let mut ctx = MatchContext::new(f.data.vertex_count());
        let totals = f.refiner().prune(&mut candidates, 3, &mut ctx);
        assert_eq!(totals.len(), 3);
        assert!(totals[0] <= before);
        assert!(totals.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(candidates.total(), *totals.last().expect("three rounds"));
        assert!(ctx.flags.iter().all(|&f| f == 0));
    }

    #[test]
    fn non_tree_edge_removes_square_vertices() {
        let f = triangle_vs_mixed();
        let refiner = f.refiner();
        assert_eq!(refiner.non_tree_edges().len(), 1);

        let mut ctx = MatchContext::new(f.data.vertex_count());
        let mut candidates = f.candidates();
        refiner.prune(&mut candidates, 3, &mut ctx);
        let mut space = refiner.build_space(&candidates, &mut ctx).expect("non-empty");
        refiner.refine(&mut space, &mut ctx);

        for u in 0..3 {
            assert_eq!(space.flat(u), vec![0, 1, 2], "pattern vertex {u}");
        }
    }

    #[test]
    fn refinement_is_idempotent() {
        let f = triangle_vs_mixed();
        let refiner = f.refiner();
        let mut ctx = MatchContext::new(f.data.vertex_count());
        let mut candidates = f.candidates();
        refiner.prune(&mut candidates, 3, &mut ctx);
        let mut space = refiner.build_space(&candidates, &mut ctx).expect("non-empty");
        refiner.refine(&mut space, &mut ctx);
        let snapshot = space.clone();
        assert!(!refiner.refine(&mut space, &mut ctx));
        assert_eq!(space, snapshot);
    }

    #[test]
    fn build_reports_empty_vertex() {
        // Pattern edge between labels 0 and 1, data has no such edge.
        let data = Graph::from_edges(vec![0, 0, 1, 1], &[(0, 1), (2, 3)]).expect("valid");
        let pattern = Graph::from_edges(vec![0, 1], &[(0, 1)]).expect("valid");
        let f = Fixture::new(data, pattern, 0);
        let mut ctx = MatchContext::new(f.data.vertex_count());
        // Skip pruning so that the build itself has to notice.
        let candidates = CandidateSets::from_sets(vec![vec![0, 1], vec![2, 3]]);
        assert!(f.refiner().build_space(&candidates, &mut ctx).is_err());
    }

    #[test]
    fn provenance_tracks_anchor() {
        let f = triangle_vs_mixed();
        let refiner = f.refiner();
        let mut ctx = MatchContext::new(f.data.vertex_count());
        let mut candidates = f.candidates();
        refiner.prune(&mut candidates, 3, &mut ctx);
        let space = refiner.build_space(&candidates, &mut ctx).expect("non-empty");
        let prov = refiner.provenance(&space);
        let e = refiner.non_tree_edges()[0];
        assert_eq!(f.tree.parent(e.later), Some(e.anchor));
        // Every group key of a direct child of the anchor is one of the
        // recorded anchor assignments of its members.
        for (&g, list) in space.groups(e.later) {
            for v in list {
                let origins = prov.lookup(e.later, v, e.anchor);
                assert!(origins.contains(&g));
                assert!(origins.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }
}

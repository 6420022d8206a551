//! Per-invocation scratch state.
//!
//! One [`MatchContext`] is created for each top-level match and dropped when
//! it returns. Nothing in here is shared between invocations, so independent
//! matches can run concurrently. Every buffer is reset by the phase that
//! dirtied it before the next phase reads it.

use crate::graph::VertexId;

/// Counters collected while matching, for logging and tests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchStats {
    /// Chosen root pattern vertex.
    pub root: Option<VertexId>,
    /// Total candidates after the NLF filter.
    pub nlf_candidates: usize,
    /// Total candidates after each pruning round.
    pub pruning_rounds: Vec<usize>,
    /// Entries in the compact candidate space right after it was built.
    pub space_entries: usize,
    /// Reverse refinement passes until the fixpoint.
    pub refinement_passes: usize,
    /// Total flat candidates after refinement.
    pub refined_candidates: usize,
    /// Pattern vertices in each half, root counted in both.
    pub partition_sizes: (usize, usize),
    /// Rows per trie level, one vector per enumerated half. A depth-first
    /// walk records how many vertices it tried at each position instead.
    pub trie_levels: Vec<Vec<usize>>,
    /// Outer rows driven through the cross join.
    pub join_outer_rows: u64,
    /// Inner trie rows inspected by the cross join.
    pub join_probes: u64,
}

/// Scratch state for one match.
pub struct MatchContext {
    /// One counter per data vertex; all zero between uses.
    pub(crate) flags: Vec<u32>,
    /// Data vertices whose `flags` entry is non-zero.
    pub(crate) touched: Vec<VertexId>,
    /// Data vertices bound in the current partial row.
    pub(crate) visited: Vec<bool>,
    /// `data vertices x positions` hit counters for the cross join.
    pub(crate) join_hits: Vec<u8>,
    /// Indices into `join_hits` that are non-zero.
    pub(crate) join_touched: Vec<usize>,
    pub(crate) buffer: Vec<VertexId>,
    pub(crate) spare: Vec<VertexId>,
    pub(crate) stats: MatchStats,
}

impl MatchContext {
    /// Context sized for a data graph with `data_vertices` vertices.
    pub fn new(data_vertices: usize) -> Self {
        Self {
            flags: vec![0; data_vertices],
            touched: Vec::new(),
            visited: vec![false; data_vertices],
            join_hits: Vec::new(),
            join_touched: Vec::new(),
            buffer: Vec::new(),
            spare: Vec::new(),
            stats: MatchStats::default(),
        }
    }

    /// Number of data vertices the buffers cover.
    #[must_use]
    pub fn data_vertices(&self) -> usize {
        self.flags.len()
    }

    /// Zero every flag recorded in `touched`.
    pub(crate) fn clear_flags(&mut self) {
        for &v in &self.touched {
            self.flags[v as usize] = 0;
        }
        self.touched.clear();
    }

    /// Size the join counters for `positions` pattern positions. The
    /// counters must be all zero on return.
    pub(crate) fn prepare_join(&mut self, positions: usize) {
        let needed = self.data_vertices() * positions;
        if self.join_hits.len() < needed {
            self.join_hits.resize(needed, 0);
        }
        debug_assert!(self.join_touched.is_empty());
    }

    /// Zero every join counter recorded in `join_touched`.
    pub(crate) fn clear_join(&mut self) {
        for &i in &self.join_touched {
            self.join_hits[i] = 0;
        }
        self.join_touched.clear();
    }

    /// Counters collected so far.
    #[must_use]
    pub const fn stats(&self) -> &MatchStats {
        &self.stats
    }

    pub(crate) fn into_stats(self) -> MatchStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_reset() {
        let mut ctx = MatchContext::new(8);
        ctx.flags[3] = 2;
        ctx.flags[5] = 1;
        ctx.touched.extend([3, 5]);
        ctx.clear_flags();
        assert!(ctx.flags.iter().all(|&f| f == 0));
        assert!(ctx.touched.is_empty());
    }

    #[test]
    fn join_scratch_grows_and_resets() {
        let mut ctx = MatchContext::new(4);
        ctx.prepare_join(3);
        assert_eq!(ctx.join_hits.len(), 12);
        ctx.join_hits[7] = 4;
        ctx.join_touched.push(7);
        ctx.clear_join();
        assert!(ctx.join_hits.iter().all(|&h| h == 0));
    }
}

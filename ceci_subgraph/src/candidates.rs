//! Neighbour-label-frequency candidate filter and root selection.

use tracing::{debug, trace};

use crate::graph::{Graph, NlfEntry, VertexId};

/// True when `data` has, for every label of `pattern`, at least as many
/// neighbours. Both tables are ordered by label.
fn nlf_dominates(data: &[NlfEntry], pattern: &[NlfEntry]) -> bool {
    let mut rows = data.iter();
    'pattern: for p in pattern {
        for d in rows.by_ref() {
            if d.label == p.label {
                if d.count < p.count {
                    return false;
                }
                continue 'pattern;
            }
            if d.label > p.label {
                return false;
            }
        }
        return false;
    }
    true
}

/// Per pattern vertex candidate lists, each ascending.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CandidateSets {
    sets: Vec<Vec<VertexId>>,
}

impl CandidateSets {
    pub(crate) const fn from_sets(sets: Vec<Vec<VertexId>>) -> Self {
        Self { sets }
    }

    /// Filtered candidates of `u`, ascending.
    #[must_use]
    pub fn get(&self, u: VertexId) -> &[VertexId] {
        &self.sets[u as usize]
    }

    pub(crate) fn get_mut(&mut self, u: VertexId) -> &mut Vec<VertexId> {
        &mut self.sets[u as usize]
    }

    /// Number of pattern vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// True for an empty pattern.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Sum of all candidate list lengths.
    #[must_use]
    pub fn total(&self) -> usize {
        self.sets.iter().map(Vec::len).sum()
    }

    /// First pattern vertex without candidates, if any.
    #[must_use]
    pub fn first_empty(&self) -> Option<VertexId> {
        self.sets.iter().position(Vec::is_empty).map(|u| u as VertexId)
    }

    /// Candidate counts per pattern vertex.
    #[must_use]
    pub fn sizes(&self) -> Vec<usize> {
        self.sets.iter().map(Vec::len).collect()
    }
}

/// Filters data vertices per pattern vertex by label, degree and NLF.
pub struct CandidateGenerator<'a> {
    data: &'a Graph,
    pattern: &'a Graph,
}

impl<'a> CandidateGenerator<'a> {
    /// Generator for `pattern` against `data`.
    pub const fn new(data: &'a Graph, pattern: &'a Graph) -> Self {
        Self { data, pattern }
    }

    /// Whether data vertex `v` passes the filter for pattern vertex `u`.
    #[must_use]
    pub fn admits(&self, u: VertexId, v: VertexId) -> bool {
        self.data.label(v) == self.pattern.label(u)
            && self.data.degree(v) >= self.pattern.degree(u)
            && nlf_dominates(self.data.nlf(v), self.pattern.nlf(u))
    }

    /// Candidates of `u`. With `out = None` only the count is produced.
    pub fn nlf_candidates(&self, u: VertexId, mut out: Option<&mut Vec<VertexId>>) -> usize {
        let mut count = 0;
        for &v in self.data.vertices_by_label(self.pattern.label(u)) {
            if self.admits(u, v) {
                count += 1;
                if let Some(out) = out.as_deref_mut() {
                    out.push(v);
                }
            }
        }
        count
    }

    /// Candidate lists for every pattern vertex.
    #[must_use]
    pub fn generate(&self) -> CandidateSets {
        let sets: Vec<Vec<VertexId>> = (0..self.pattern.vertex_count() as VertexId)
            .map(|u| {
                let mut out = Vec::new();
                self.nlf_candidates(u, Some(&mut out));
                out
            })
            .collect();
        let sets = CandidateSets::from_sets(sets);
        debug!(total = sets.total(), sizes = ?sets.sizes(), "nlf candidates");
        sets
    }

    /// Pattern vertex minimising `candidates / degree` among vertices with
    /// more than one candidate. Falls back to vertex 0.
    #[must_use]
    pub fn select_root(&self) -> VertexId {
        let mut root = 0;
        let mut best = self.data.vertex_count() as f64;
        for u in 0..self.pattern.vertex_count() as VertexId {
            let count = self.nlf_candidates(u, None);
            if count <= 1 {
                continue;
            }
            let degree = self.pattern.degree(u).max(1);
            let score = count as f64 / degree as f64;
            trace!(u, count, score, "root score");
            if score < best {
                best = score;
                root = u;
            }
        }
        debug!(root, score = best, "selected root");
        root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> Graph {
        // 0(a)-1(b), 0-2(b), 0-3(c), 4(a)-5(b), 6(a) isolated
        Graph::from_edges(vec![0, 1, 1, 2, 0, 1, 0], &[(0, 1), (0, 2), (0, 3), (4, 5)])
            .expect("valid")
    }

    fn pattern() -> Graph {
        // a with two b neighbours
        Graph::from_edges(vec![0, 1, 1], &[(0, 1), (0, 2)]).expect("valid")
    }

    #[test]
    fn nlf_filter() {
        let (d, p) = (data(), pattern());
        let generator = CandidateGenerator::new(&d, &p);
        let mut out = Vec::new();
        assert_eq!(generator.nlf_candidates(0, Some(&mut out)), 1);
        assert_eq!(out, vec![0]);
        assert_eq!(generator.nlf_candidates(1, None), 3);
    }

    #[test]
    fn nlf_dominance() {
        let (d, p) = (data(), pattern());
        let generator = CandidateGenerator::new(&d, &p);
        assert!(generator.admits(0, 0));
        assert!(!generator.admits(0, 4));
        assert!(!generator.admits(0, 6));
        assert!(!generator.admits(0, 1));
    }

    #[test]
    fn root_prefers_low_ratio() {
        let (d, p) = (data(), pattern());
        let generator = CandidateGenerator::new(&d, &p);
        // Vertex 0 has a single candidate and is skipped; 1 and 2 tie at 3/1.
        assert_eq!(generator.select_root(), 1);
    }

    #[test]
    fn empty_set_detected() {
        let d = data();
        let p = Graph::from_edges(vec![2, 2], &[(0, 1)]).expect("valid");
        let sets = CandidateGenerator::new(&d, &p).generate();
        assert_eq!(sets.first_empty(), Some(0));
    }
}

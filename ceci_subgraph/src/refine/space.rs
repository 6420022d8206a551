//! Compact candidate space.
//!
//! For every pattern vertex `u` the space maps each candidate of `u`'s tree
//! parent to the ascending list of data vertices that may be assigned to `u`
//! underneath it. The root maps each of its candidates to itself. After the
//! space is built entries are only ever removed.

use std::collections::BTreeMap;

use crate::graph::VertexId;

/// Parent candidate to the candidates of one pattern vertex.
pub type Groups = BTreeMap<VertexId, Vec<VertexId>>;

/// Candidates of each pattern vertex grouped by tree-parent candidate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CandidateSpace {
    groups: Vec<Groups>,
}

impl CandidateSpace {
    pub(crate) fn new(pattern_vertices: usize) -> Self {
        Self {
            groups: vec![Groups::new(); pattern_vertices],
        }
    }

    /// Parent candidate -> candidates of `u`.
    #[must_use]
    pub fn groups(&self, u: VertexId) -> &Groups {
        &self.groups[u as usize]
    }

    pub(crate) fn groups_mut(&mut self, u: VertexId) -> &mut Groups {
        &mut self.groups[u as usize]
    }

    /// Candidates of `u` below parent candidate `parent`.
    #[must_use]
    pub fn group(&self, u: VertexId, parent: VertexId) -> &[VertexId] {
        self.groups[u as usize]
            .get(&parent)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Ascending union of every group of `u`.
    #[must_use]
    pub fn flat(&self, u: VertexId) -> Vec<VertexId> {
        let mut out: Vec<VertexId> = self.groups[u as usize].values().flatten().copied().collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Ascending candidate lists for every pattern vertex.
    #[must_use]
    pub fn flatten(&self) -> Vec<Vec<VertexId>> {
        (0..self.groups.len() as VertexId).map(|u| self.flat(u)).collect()
    }

    /// Total number of (group, candidate) entries.
    #[must_use]
    pub fn entries(&self) -> usize {
        self.groups
            .iter()
            .map(|g| g.values().map(Vec::len).sum::<usize>())
            .sum()
    }

    /// Remove `v` from every group of `u`, dropping groups that empty out.
    /// Returns whether anything was removed.
    pub(crate) fn remove_candidate(&mut self, u: VertexId, v: VertexId) -> bool {
        let mut removed = false;
        self.groups[u as usize].retain(|_, list| {
            if let Ok(i) = list.binary_search(&v) {
                list.remove(i);
                removed = true;
            }
            !list.is_empty()
        });
        removed
    }

    /// Keep only the entries of `u` accepted by `keep(parent, candidate)`,
    /// dropping groups that empty out. Returns whether anything changed.
    pub(crate) fn retain(&mut self, u: VertexId, mut keep: impl FnMut(VertexId, VertexId) -> bool) -> bool {
        let mut changed = false;
        self.groups[u as usize].retain(|&parent, list| {
            let before = list.len();
            list.retain(|&v| keep(parent, v));
            changed |= list.len() != before;
            !list.is_empty()
        });
        changed
    }

    /// Drop whole groups of `u` whose parent candidate fails `keep`.
    pub(crate) fn retain_groups(&mut self, u: VertexId, mut keep: impl FnMut(VertexId) -> bool) -> bool {
        let before = self.groups[u as usize].len();
        self.groups[u as usize].retain(|&parent, _| keep(parent));
        before != self.groups[u as usize].len()
    }

    /// First pattern vertex left without any candidate.
    #[must_use]
    pub fn first_empty(&self) -> Option<VertexId> {
        self.groups.iter().position(Groups::is_empty).map(|u| u as VertexId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space() -> CandidateSpace {
        let mut s = CandidateSpace::new(2);
        s.groups_mut(0).insert(1, vec![1]);
        s.groups_mut(0).insert(4, vec![4]);
        s.groups_mut(1).insert(1, vec![2, 3]);
        s.groups_mut(1).insert(4, vec![3, 5]);
        s
    }

    #[test]
    fn flat_union() {
        let s = space();
        assert_eq!(s.flat(1), vec![2, 3, 5]);
        assert_eq!(s.entries(), 6);
        assert_eq!(s.group(1, 4), &[3, 5]);
        assert!(s.group(1, 9).is_empty());
    }

    #[test]
    fn removal_drops_empty_groups() {
        let mut s = space();
        assert!(s.remove_candidate(1, 3));
        assert_eq!(s.group(1, 1), &[2]);
        assert!(s.remove_candidate(1, 2));
        assert!(!s.groups(1).contains_key(&1));
        assert!(!s.remove_candidate(1, 2));
    }

    #[test]
    fn retain_reports_changes() {
        let mut s = space();
        assert!(!s.retain(1, |_, _| true));
        assert!(s.retain(1, |parent, v| parent == 4 || v == 3));
        assert_eq!(s.flat(1), vec![3, 5]);
        assert!(s.retain_groups(1, |parent| parent == 1));
        assert_eq!(s.flat(1), vec![3]);
        assert_eq!(s.first_empty(), None);
    }
}

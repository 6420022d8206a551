//! Level-by-level store of partial rows.
//!
//! Level `k` holds one entry per partial row of length `k + 1`: the data
//! vertex bound at position `k` and the index of its prefix row in level
//! `k - 1`. Rows are appended in prefix order, so the children of a row
//! form a contiguous range of the next level. After [`LocalTrie::reverse_cuts`]
//! those ranges are available as offset arrays.

use std::ops::Range;

use crate::graph::VertexId;

/// Partial rows of one half, one level per position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocalTrie {
    columns: Vec<Vec<VertexId>>,
    parents: Vec<Vec<u32>>,
    /// `children[k][r]..children[k][r + 1]` are the rows of level `k + 1`
    /// extending row `r` of level `k`.
    children: Vec<Vec<u32>>,
}

impl LocalTrie {
    pub(crate) fn with_root(values: &[VertexId]) -> Self {
        Self {
            columns: vec![values.to_vec()],
            parents: vec![Vec::new()],
            children: Vec::new(),
        }
    }

    pub(crate) fn open_level(&mut self) {
        self.columns.push(Vec::new());
        self.parents.push(Vec::new());
    }

    /// Append a row to the deepest level.
    pub(crate) fn push(&mut self, value: VertexId, parent: usize) {
        if let (Some(col), Some(par)) = (self.columns.last_mut(), self.parents.last_mut()) {
            col.push(value);
            par.push(parent as u32);
        }
    }

    /// Build the child offset arrays from the parent links.
    pub(crate) fn reverse_cuts(&mut self) {
        self.children = (1..self.columns.len())
            .map(|k| {
                let mut offsets = vec![0u32; self.columns[k - 1].len() + 1];
                for &p in &self.parents[k] {
                    offsets[p as usize + 1] += 1;
                }
                for i in 1..offsets.len() {
                    offsets[i] += offsets[i - 1];
                }
                offsets
            })
            .collect();
    }

    /// Number of levels.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.columns.len()
    }

    /// Rows on `level`.
    #[must_use]
    pub fn rows(&self, level: usize) -> usize {
        self.columns[level].len()
    }

    /// Rows per level.
    #[must_use]
    pub fn level_sizes(&self) -> Vec<usize> {
        self.columns.iter().map(Vec::len).collect()
    }

    /// Complete rows.
    #[must_use]
    pub fn leaves(&self) -> usize {
        self.columns.last().map_or(0, Vec::len)
    }

    /// Data vertex bound by row `row` of `level`.
    #[must_use]
    pub fn value(&self, level: usize, row: usize) -> VertexId {
        self.columns[level][row]
    }

    /// Values of level 0, ascending.
    #[must_use]
    pub fn roots(&self) -> &[VertexId] {
        &self.columns[0]
    }

    /// Write the prefix ending at `(level, row)` into `out[..=level]`.
    pub fn reconstruct(&self, level: usize, row: usize, out: &mut [VertexId]) {
        let mut r = row;
        for k in (0..=level).rev() {
            out[k] = self.columns[k][r];
            if k > 0 {
                r = self.parents[k][r] as usize;
            }
        }
    }

    /// Rows of `level + 1` extending `(level, row)`.
    #[must_use]
    pub fn child_range(&self, level: usize, row: usize) -> Range<usize> {
        let offsets = &self.children[level];
        offsets[row] as usize..offsets[row + 1] as usize
    }

    /// Complete rows extending `(level, row)`.
    #[must_use]
    pub fn leaf_range(&self, level: usize, row: usize) -> Range<usize> {
        let (mut start, mut end) = (row, row + 1);
        for k in level..self.depth() - 1 {
            let offsets = &self.children[k];
            start = offsets[start] as usize;
            end = offsets[end] as usize;
        }
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Roots 1, 2; rows 1-5, 1-6, 2-7; leaves 1-5-8, 1-5-9, 2-7-9.
    fn trie() -> LocalTrie {
        let mut t = LocalTrie::with_root(&[1, 2]);
        t.open_level();
        t.push(5, 0);
        t.push(6, 0);
        t.push(7, 1);
        t.open_level();
        t.push(8, 0);
        t.push(9, 0);
        t.push(9, 2);
        t.reverse_cuts();
        t
    }

    #[test]
    fn ranges() {
        let t = trie();
        assert_eq!(t.level_sizes(), vec![2, 3, 3]);
        assert_eq!(t.child_range(0, 0), 0..2);
        assert_eq!(t.child_range(1, 1), 2..2);
        assert_eq!(t.leaf_range(0, 0), 0..2);
        assert_eq!(t.leaf_range(0, 1), 2..3);
        assert_eq!(t.leaf_range(1, 1), 2..2);
        assert_eq!(t.leaf_range(2, 1), 1..2);
    }

    #[test]
    fn reconstruct_rows() {
        let t = trie();
        let mut row = [0; 3];
        t.reconstruct(2, 2, &mut row);
        assert_eq!(row, [2, 7, 9]);
        t.reconstruct(1, 1, &mut row);
        assert_eq!(&row[..2], &[1, 6]);
    }
}

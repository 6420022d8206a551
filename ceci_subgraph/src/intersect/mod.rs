//! Sorted-array set intersection.
//!
//! Every higher phase of the matcher reduces to intersecting ascending,
//! duplicate-free `u32` slices. Three kernels produce identical results and
//! differ only in throughput:
//!
//! - merge: scalar two-pointer walk, `O(n + m)`.
//! - galloping: exponential probe from each element of the shorter side into
//!   the longer side, `O(n log(m / n))`.
//! - block: compare one element of the shorter side against eight lanes of
//!   the longer side at once, scalar merge for the tail. On x86_64 the lane
//!   compare uses AVX2 when the CPU has it.
//!
//! The kernel is picked once per [`SetIntersector`]; CPU detection runs once
//! per process.

mod block;
mod galloping;
mod merge;

use std::sync::OnceLock;

use ceci_common::IntersectionStrategy;

/// Galloping wins once one side is this many times longer than the other.
pub const GALLOPING_RATIO: usize = 50;

/// Destination for intersection results.
pub(crate) trait Sink {
    fn push(&mut self, value: u32);
}

impl Sink for Vec<u32> {
    #[inline]
    fn push(&mut self, value: u32) {
        Vec::push(self, value);
    }
}

/// Count-only sink.
#[derive(Default)]
pub(crate) struct Counter(pub usize);

impl Sink for Counter {
    #[inline]
    fn push(&mut self, _: u32) {
        self.0 += 1;
    }
}

/// Whether the AVX2 lane kernel can run on this CPU.
pub fn simd_available() -> bool {
    static DETECTED: OnceLock<bool> = OnceLock::new();
    *DETECTED.get_or_init(|| {
        #[cfg(target_arch = "x86_64")]
        let detected = std::arch::is_x86_feature_detected!("avx2");
        #[cfg(not(target_arch = "x86_64"))]
        let detected = false;
        tracing::debug!(avx2 = detected, "intersection kernel detection");
        detected
    })
}

/// True when `values` is strictly ascending.
pub fn is_strictly_ascending(values: &[u32]) -> bool {
    values.windows(2).all(|w| w[0] < w[1])
}

/// Kernel chosen for one pair of inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kernel {
    Merge,
    Galloping,
    Block,
}

/// Intersection front end bound to one kernel choice.
#[derive(Clone, Copy, Debug)]
pub struct SetIntersector {
    strategy: IntersectionStrategy,
    avx2: bool,
}

impl Default for SetIntersector {
    fn default() -> Self {
        Self::new(IntersectionStrategy::Hybrid)
    }
}

impl SetIntersector {
    /// Intersector for `strategy`, using AVX2 when the CPU has it.
    #[must_use]
    pub fn new(strategy: IntersectionStrategy) -> Self {
        Self {
            strategy,
            avx2: simd_available(),
        }
    }

    /// Same kernel choice, but never use AVX2 even if it is present.
    #[must_use]
    pub const fn portable(strategy: IntersectionStrategy) -> Self {
        Self {
            strategy,
            avx2: false,
        }
    }

    /// Configured strategy.
    #[must_use]
    pub const fn strategy(&self) -> IntersectionStrategy {
        self.strategy
    }

    /// Append `a ∩ b` to `out` in ascending order.
    #[contracts::debug_requires(is_strictly_ascending(a) && is_strictly_ascending(b))]
    pub fn intersect_into(&self, a: &[u32], b: &[u32], out: &mut Vec<u32>) {
        self.run(a, b, out);
    }

    /// `|a ∩ b|` without materialising the result.
    #[contracts::debug_requires(is_strictly_ascending(a) && is_strictly_ascending(b))]
    pub fn intersect_count(&self, a: &[u32], b: &[u32]) -> usize {
        let mut counter = Counter::default();
        self.run(a, b, &mut counter);
        counter.0
    }

    /// Whether `a` and `b` share at least one element.
    pub fn intersects(&self, a: &[u32], b: &[u32]) -> bool {
        let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
        let mut cursor = 0;
        for &x in small {
            cursor = galloping::gallop(large, cursor, x);
            match large.get(cursor) {
                None => return false,
                Some(&y) if y == x => return true,
                Some(_) => {}
            }
        }
        false
    }

    /// Allocating convenience wrapper around [`Self::intersect_into`].
    #[must_use]
    #[contracts::debug_ensures(is_strictly_ascending(&ret))]
    pub fn intersect(&self, a: &[u32], b: &[u32]) -> Vec<u32> {
        let mut out = Vec::with_capacity(a.len().min(b.len()));
        self.intersect_into(a, b, &mut out);
        out
    }

    fn kernel(&self, small: usize, large: usize) -> Kernel {
        match self.strategy {
            IntersectionStrategy::Merge => Kernel::Merge,
            IntersectionStrategy::Galloping => Kernel::Galloping,
            IntersectionStrategy::Block => Kernel::Block,
            IntersectionStrategy::Hybrid => {
                if large > small.saturating_mul(GALLOPING_RATIO) {
                    Kernel::Galloping
                } else if self.avx2 {
                    Kernel::Block
                } else {
                    Kernel::Merge
                }
            }
        }
    }

    fn run<S: Sink>(&self, a: &[u32], b: &[u32], sink: &mut S) {
        let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
        if small.is_empty() {
            return;
        }
        match self.kernel(small.len(), large.len()) {
            Kernel::Merge => merge::merge_into(small, large, sink),
            Kernel::Galloping => galloping::galloping_into(small, large, sink),
            Kernel::Block => block::block_into(small, large, sink, self.avx2),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const ALL: [IntersectionStrategy; 4] = [
        IntersectionStrategy::Hybrid,
        IntersectionStrategy::Merge,
        IntersectionStrategy::Galloping,
        IntersectionStrategy::Block,
    ];

    fn check(a: &[u32], b: &[u32], expected: &[u32]) {
        for strategy in ALL {
            for intersector in [SetIntersector::new(strategy), SetIntersector::portable(strategy)] {
                assert_eq!(intersector.intersect(a, b), expected, "{strategy:?}");
                assert_eq!(intersector.intersect(b, a), expected, "{strategy:?} swapped");
                assert_eq!(intersector.intersect_count(a, b), expected.len(), "{strategy:?}");
                assert_eq!(intersector.intersects(a, b), !expected.is_empty());
            }
        }
    }

    #[rstest]
    #[case::both_empty(&[], &[], &[])]
    #[case::one_empty(&[1, 2, 3], &[], &[])]
    #[case::disjoint(&[1, 3, 5, 7, 9, 11, 13, 15, 17], &[0, 2, 4, 6, 8, 10, 12, 14, 16, 18], &[])]
    #[case::identical(&[2, 4, 8, 16, 32, 64, 128, 256, 512], &[2, 4, 8, 16, 32, 64, 128, 256, 512], &[2, 4, 8, 16, 32, 64, 128, 256, 512])]
    #[case::interleaved(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10], &[2, 3, 5, 7, 11, 13], &[2, 3, 5, 7])]
    #[case::single_hit(&[40], &[1, 5, 9, 13, 17, 21, 25, 29, 33, 37, 40, 45], &[40])]
    #[case::tail_only(&[100, 200], &[1, 2, 3, 4, 5, 6, 7, 8, 9, 100], &[100])]
    fn fixed_cases(#[case] a: &[u32], #[case] b: &[u32], #[case] expected: &[u32]) {
        check(a, b, expected);
    }

    #[test]
    fn heavily_skewed() {
        let large: Vec<u32> = (0..10_000).map(|x| x * 3).collect();
        let small = vec![0, 3, 4, 2_999, 3_000, 29_997, 40_000];
        check(&small, &large, &[0, 3, 3_000, 29_997]);
    }

    #[rstest]
    #[case::just_past_ratio(2, 149, Kernel::Galloping)]
    #[case::exactly_ratio(2, 100, Kernel::Merge)]
    #[case::one_above(1, 51, Kernel::Galloping)]
    #[case::balanced(40, 60, Kernel::Merge)]
    #[case::huge_small_side(usize::MAX / 2, usize::MAX, Kernel::Merge)]
    fn hybrid_switches_above_ratio(#[case] small: usize, #[case] large: usize, #[case] expected: Kernel) {
        let hybrid = SetIntersector::portable(IntersectionStrategy::Hybrid);
        assert_eq!(hybrid.kernel(small, large), expected);
    }

    #[test]
    fn appends_to_existing_buffer() {
        let mut out = vec![99];
        SetIntersector::default().intersect_into(&[1, 2], &[2, 3], &mut out);
        assert_eq!(out, vec![99, 2]);
    }
}

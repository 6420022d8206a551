//! Eight-lane block intersection.
//!
//! Each element of the shorter side is compared against a block of eight
//! consecutive elements of the longer side. A block is skipped as soon as the
//! current element exceeds its last lane; otherwise the element is resolved
//! against the block and the next element is loaded. Whatever is left once
//! fewer than eight lanes remain goes through the scalar merge.

use super::Sink;
use super::merge::merge_into;

pub(crate) const LANES: usize = 8;

#[inline(always)]
fn block_loop<S: Sink>(
    small: &[u32],
    large: &[u32],
    sink: &mut S,
    hit: impl Fn(&[u32], u32) -> bool,
) {
    let (mut i, mut j) = (0, 0);
    // Invariant: every element of large[..j] is below small[i].
    while i < small.len() && j + LANES <= large.len() {
        let x = small[i];
        let block = &large[j..j + LANES];
        if x > block[LANES - 1] {
            j += LANES;
            continue;
        }
        if hit(block, x) {
            sink.push(x);
        }
        i += 1;
    }
    merge_into(&small[i..], &large[j..], sink);
}

#[inline(always)]
fn portable_hit(block: &[u32], needle: u32) -> bool {
    block.iter().fold(false, |acc, &x| acc | (x == needle))
}

pub(crate) fn block_into<S: Sink>(small: &[u32], large: &[u32], sink: &mut S, avx2: bool) {
    #[cfg(target_arch = "x86_64")]
    if avx2 {
        // SAFETY: the caller only passes `avx2 = true` after runtime detection.
        unsafe { avx2::block_into(small, large, sink) };
        return;
    }
    #[cfg(not(target_arch = "x86_64"))]
    let _ = avx2;
    block_loop(small, large, sink, portable_hit);
}

#[cfg(target_arch = "x86_64")]
mod avx2 {
    use std::arch::x86_64::{
        __m256i, _mm256_cmpeq_epi32, _mm256_loadu_si256, _mm256_movemask_epi8, _mm256_set1_epi32,
    };

    use super::{LANES, Sink, block_loop};

    #[target_feature(enable = "avx2")]
    #[inline]
    unsafe fn hit(block: &[u32], needle: u32) -> bool {
        debug_assert!(block.len() >= LANES);
        // SAFETY: `block` holds at least eight u32 values and AVX2 is enabled
        // for this function.
        unsafe {
            let lanes = _mm256_loadu_si256(block.as_ptr().cast::<__m256i>());
            let probe = _mm256_set1_epi32(needle as i32);
            _mm256_movemask_epi8(_mm256_cmpeq_epi32(lanes, probe)) != 0
        }
    }

    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn block_into<S: Sink>(small: &[u32], large: &[u32], sink: &mut S) {
        // SAFETY: this function only runs on CPUs with AVX2.
        block_loop(small, large, sink, |block, x| unsafe { hit(block, x) });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portable_block_matches_merge() {
        let large: Vec<u32> = (0..100).map(|x| x * 5).collect();
        let small: Vec<u32> = (0..60).map(|x| x * 7).collect();

        let mut expected = Vec::new();
        merge_into(&small, &large, &mut expected);

        let mut got = Vec::new();
        block_into(&small, &large, &mut got, false);
        assert_eq!(got, expected);
    }

    #[test]
    fn lane_compare() {
        let block = [1, 3, 5, 7, 9, 11, 13, 15];
        assert!(portable_hit(&block, 9));
        assert!(!portable_hit(&block, 10));
    }
}

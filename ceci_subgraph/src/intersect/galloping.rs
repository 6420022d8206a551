//! Exponential (galloping) search intersection for skewed inputs.

use super::Sink;

/// First index `i >= begin` with `src[i] >= target`, or `src.len()`.
///
/// Probes the first three positions directly, then doubles the stride and
/// finishes with a binary search over the overshoot window.
pub(crate) fn gallop(src: &[u32], begin: usize, target: u32) -> usize {
    let end = src.len();
    if begin >= end || src[end - 1] < target {
        return end;
    }
    for (i, &x) in src.iter().enumerate().take((begin + 3).min(end)).skip(begin) {
        if x >= target {
            return i;
        }
    }

    // src[lo] < target <= src[hi]
    let mut lo = begin + 2;
    let mut jump = 4;
    let hi = loop {
        let probe = begin + jump;
        if probe >= end - 1 {
            break end - 1;
        }
        if src[probe] >= target {
            break probe;
        }
        lo = probe;
        jump *= 2;
    };
    lo + 1 + src[lo + 1..hi].partition_point(|&x| x < target)
}

/// Probe every element of `small` into `large`.
pub(crate) fn galloping_into<S: Sink>(small: &[u32], large: &[u32], sink: &mut S) {
    let mut cursor = 0;
    for &x in small {
        cursor = gallop(large, cursor, x);
        if cursor == large.len() {
            return;
        }
        if large[cursor] == x {
            sink.push(x);
            cursor += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gallop_matches_partition_point() {
        let src: Vec<u32> = (0..200).map(|x| x * 2 + 1).collect();
        for begin in [0, 1, 5, 63, 150, 199, 200] {
            for target in 0..410 {
                let expected =
                    begin.min(src.len()) + src[begin.min(src.len())..].partition_point(|&x| x < target);
                assert_eq!(gallop(&src, begin, target), expected, "begin {begin} target {target}");
            }
        }
    }

    #[test]
    fn gallop_short_slices() {
        assert_eq!(gallop(&[], 0, 3), 0);
        assert_eq!(gallop(&[5], 0, 3), 0);
        assert_eq!(gallop(&[5], 0, 6), 1);
        assert_eq!(gallop(&[1, 2, 3, 4], 1, 4), 3);
    }
}

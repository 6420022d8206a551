//! Scalar two-pointer merge.

use super::Sink;

#[inline(always)]
pub(crate) fn merge_into<S: Sink>(a: &[u32], b: &[u32], sink: &mut S) {
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let (x, y) = (a[i], b[j]);
        if x < y {
            i += 1;
        } else if x > y {
            j += 1;
        } else {
            sink.push(x);
            i += 1;
            j += 1;
        }
    }
}

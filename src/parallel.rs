//! # Parallel row-subrange dispatch
//!
//! Fork-join decomposition of a unit range (block rows, or single buffer
//! entries) into independent tasks using Rayon. Every task owns the slice of
//! the destination that corresponds to its subrange, so tasks never write to
//! the same memory. The call returns only after all subranges are done.

use std::ops::Range;

use rayon::join;
use tracing::trace;

/// Applies `f` to disjoint subranges of `range`, each paired with the matching
/// segment of `data`.
///
/// Unit `k` of `range` owns `data[(k - range.start) * unit_len ..]` up to the
/// next unit; the last unit may own fewer than `unit_len` entries, which lets a
/// padded final block row map onto a vector whose length is not a multiple of
/// the chunk size. Subranges of at most `grain_size` units run inline on the
/// calling thread; larger ones are halved and handed to `rayon::join`.
///
/// # Panics
///
/// Panics if `unit_len` or `grain_size` is zero, or if `data` is too short to
/// hold every unit but the last.
pub fn apply_to_subranges_mut<S, F>(
    range: Range<usize>,
    data: &mut [S],
    unit_len: usize,
    grain_size: usize,
    f: F,
) where
    S: Send,
    F: Fn(Range<usize>, &mut [S]) + Sync,
{
    assert!(unit_len > 0, "unit length must be positive");
    assert!(grain_size > 0, "grain size must be positive");

    if range.is_empty() {
        return;
    }
    assert!(
        (range.len() - 1) * unit_len <= data.len(),
        "destination of length {} cannot hold {} units of {}",
        data.len(),
        range.len(),
        unit_len
    );

    trace!(
        start = range.start,
        end = range.end,
        grain_size,
        "dispatching subranges"
    );
    split_and_apply(range, data, unit_len, grain_size, &f);
}

fn split_and_apply<S, F>(range: Range<usize>, data: &mut [S], unit_len: usize, grain_size: usize, f: &F)
where
    S: Send,
    F: Fn(Range<usize>, &mut [S]) + Sync,
{
    if range.len() <= grain_size {
        f(range, data);
        return;
    }

    let mid = range.start + range.len() / 2;
    let (lower, upper) = data.split_at_mut((mid - range.start) * unit_len);

    join(
        || split_and_apply(range.start..mid, lower, unit_len, grain_size, f),
        || split_and_apply(mid..range.end, upper, unit_len, grain_size, f),
    );
}

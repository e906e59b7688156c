//! Hierarchical interval binning for CSI indexes
//!
//! CSI generalizes the fixed BAI/TBI binning scheme (5 levels, 16 kb leaf
//! bins) to arbitrary `min_shift`/`depth` parameters declared in the index
//! header. Level 0 is a single bin spanning the whole reference; each deeper
//! level splits every bin into 8 children. Bin ids are assigned
//! breadth-first, so the first bin of level `l` has id `(8^l - 1) / 7`.
//!
//! Both functions here are pure and must be driven by the header-declared
//! parameters — different index producers choose different granularities.

/// Smallest bin fully containing the 0-based half-open interval `[beg, end)`
///
/// Walks from the deepest (finest) level upward and returns the first bin
/// whose span covers the whole interval; bin 0 (the whole-reference bin) is
/// the fallback when no finer level contains it.
pub fn bin_for_interval(beg: i64, end: i64, min_shift: i32, depth: i32) -> i64 {
    let end = end - 1;
    let mut level = depth;
    let mut shift = min_shift;
    // Offset of the first bin at the deepest level: (8^depth - 1) / 7
    let mut t = ((1i64 << (3 * depth)) - 1) / 7;

    while level > 0 {
        if (beg >> shift) == (end >> shift) {
            return t + (beg >> shift);
        }
        level -= 1;
        shift += 3;
        t -= 1i64 << (3 * level);
    }
    0
}

/// All bin ids, across every level, that may hold records overlapping the
/// 0-based half-open interval `[beg, end)`
///
/// Bins are coarse: a returned bin can span far more than the query
/// interval, so callers MUST re-filter candidate records against the exact
/// coordinates afterward.
pub fn bins_overlapping(beg: i64, end: i64, min_shift: i32, depth: i32) -> Vec<i64> {
    let end = end - 1;
    let mut bins = Vec::new();
    let mut shift = min_shift + 3 * depth;
    let mut t = 0i64;

    for level in 0..=depth {
        let first = t + (beg >> shift);
        let last = t + (end >> shift);
        bins.extend(first..=last);
        shift -= 3;
        t += 1i64 << (3 * level);
    }
    bins
}

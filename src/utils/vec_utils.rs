use std::ops::{Bound, Range, RangeBounds};

/// Maps a timestamp range onto index positions of a slice sorted ascending by `key`.
/// The returned range is always valid for slicing `items` (possibly empty).
pub fn index_range_by_key<T, B>(items: &[T], key: impl Fn(&T) -> i64, bounds: B) -> Range<usize>
where
    B: RangeBounds<i64>,
{
    let start = match bounds.start_bound() {
        Bound::Included(&ts) => items.partition_point(|item| key(item) < ts),
        Bound::Excluded(&ts) => items.partition_point(|item| key(item) <= ts),
        Bound::Unbounded => 0,
    };
    let end = match bounds.end_bound() {
        Bound::Included(&ts) => items.partition_point(|item| key(item) <= ts),
        Bound::Excluded(&ts) => items.partition_point(|item| key(item) < ts),
        Bound::Unbounded => items.len(),
    };
    // Inverted bounds (e.g. 10..5) yield an empty range instead of a panic on slicing
    start..end.max(start)
}

/// Exact-match lookup in a slice sorted ascending by `key`.
pub fn position_by_key<T>(items: &[T], key: impl Fn(&T) -> i64, ts: i64) -> Option<usize> {
    items.binary_search_by_key(&ts, |item| key(item)).ok()
}

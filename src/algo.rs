//! Sorting helpers built on the topological comparator.
//!
//! Every entry carries the first eight ranks of its path in a `u64`. Most
//! comparisons are settled by those caches alone; the rest fall through to
//! the block comparator, in place when the collection stores padded paths and
//! through the safe-copy path otherwise.
//!
//! The main entry points are [`topo_sort`] and [`topo_sort_mut`].

use crate::block::{self, Comparator};
use crate::core::{KeyAccessor, SortPtr};
use std::cmp::Ordering;

/// Performs an index-based topological sort on the provided collection.
///
/// This function does not modify the input collection. Instead, it returns a
/// `Vec<usize>` containing the indices that order the collection so that
/// every directory comes immediately before its contents. The sort is stable.
///
/// # Examples
///
/// ```
/// use topocmp::topo_sort;
///
/// let data = vec!["foo-fleem", "foo/bar/baz", "foo", "foo/bar"];
/// let indices = topo_sort(&data);
///
/// assert_eq!(indices, vec![2, 3, 1, 0]); // foo, foo/bar, foo/bar/baz, foo-fleem
/// ```
pub fn topo_sort<T: KeyAccessor + ?Sized>(provider: &T) -> Vec<usize> {
    let len = provider.len();
    if len == 0 {
        return vec![];
    }

    let cmp = block::global();
    let mut pointers: Vec<SortPtr> = (0..len)
        .map(|index| {
            let cache = provider.get_rank_prefix(index);
            SortPtr { index, cache }
        })
        .collect();

    pointers.sort_by(|a, b| compare_entries(provider, &cmp, a, b));

    pointers.into_iter().map(|p| p.index).collect()
}

/// Sorts a mutable slice of paths topologically, in place.
///
/// # Examples
///
/// ```
/// use topocmp::topo_sort_mut;
///
/// let mut data = vec!["foo-fleem", "foo/bar", "foo"];
/// topo_sort_mut(&mut data);
///
/// assert_eq!(data, vec!["foo", "foo/bar", "foo-fleem"]);
/// ```
pub fn topo_sort_mut<T: AsRef<[u8]>>(data: &mut [T]) {
    let indices = topo_sort(data);
    apply_permutation(data, indices);
}

/// Returns `true` if the collection is already in topological order.
pub fn is_topo_sorted<T: KeyAccessor + ?Sized>(provider: &T) -> bool {
    let cmp = block::global();
    (1..provider.len()).all(|i| key_order(provider, &cmp, i - 1, i) != Ordering::Greater)
}

fn apply_permutation<T>(data: &mut [T], mut indices: Vec<usize>) {
    for i in 0..data.len() {
        let mut current = i;
        while indices[current] != i {
            let next = indices[current];
            data.swap(current, next);
            indices[current] = current; // Mark as visited/placed
            current = next;
        }
        indices[current] = current;
    }
}

/// Compares two sort pointers.
///
/// 1. **Fast path**: compares the cached rank prefixes.
/// 2. **Slow path**: if the caches match, compares the full paths with the
///    block comparator.
#[inline(always)]
fn compare_entries<T: KeyAccessor + ?Sized>(
    provider: &T,
    cmp: &Comparator,
    a: &SortPtr,
    b: &SortPtr,
) -> Ordering {
    if a.cache != b.cache {
        return a.cache.cmp(&b.cache);
    }
    key_order(provider, cmp, a.index, b.index)
}

#[inline]
fn key_order<T: KeyAccessor + ?Sized>(
    provider: &T,
    cmp: &Comparator,
    a: usize,
    b: usize,
) -> Ordering {
    match (provider.get_padded(a), provider.get_padded(b)) {
        (Some(pa), Some(pb)) => cmp.compare(&pa, &pb),
        _ => cmp.compare_bytes(provider.get_key(a), provider.get_key(b)),
    }
}

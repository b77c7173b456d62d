//! Byte-at-a-time reference comparator.
//!
//! This is the unoptimized definition of topological order that every block
//! backend must agree with. It is also the comparator of last resort for
//! callers that cannot provide padded buffers at all.

use crate::rank::RANK_TABLE;
use std::cmp::Ordering;

/// Compares two paths in topological order, one byte at a time.
///
/// A path ends at its first zero byte or at the end of the slice, whichever
/// comes first.
///
/// ```
/// use std::cmp::Ordering;
/// use topocmp::reference::compare;
///
/// assert_eq!(compare(b"foo", b"foo/bar"), Ordering::Less);
/// assert_eq!(compare(b"foo/bar", b"foo-fleem"), Ordering::Less);
/// assert_eq!(compare(b"foo\0junk", b"foo"), Ordering::Equal);
/// ```
pub fn compare(a: &[u8], b: &[u8]) -> Ordering {
    let mut i = 0;
    loop {
        let ra = RANK_TABLE[byte_at(a, i) as usize];
        let rb = RANK_TABLE[byte_at(b, i) as usize];
        if ra != rb {
            return ra.cmp(&rb);
        }
        if ra == 0 {
            return Ordering::Equal;
        }
        i += 1;
    }
}

#[inline(always)]
fn byte_at(path: &[u8], i: usize) -> u8 {
    path.get(i).copied().unwrap_or(0)
}

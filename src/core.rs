//! Core types for topological comparison.
//!
//! This module defines:
//! - [`PaddedPath`] and [`PaddedRef`]: paths carrying the terminator and
//!   trailing slack the block comparator reads into.
//! - [`PathArena`]: flat, cache-line aligned storage for many padded paths.
//! - [`KeyAccessor`]: the trait sorting helpers use to reach path bytes.
//! - SortPtr: internal pointer/cache structure.

use crate::block::{self, BLOCK_WIDTH};
use crate::rank::RANK_TABLE;
use cuneiform::cuneiform;
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;

/// Size of the ranked prefix cached in the sort pointer.
pub const RANK_PREFIX_SIZE: usize = 8;

/// Bytes that must be readable after a terminator.
pub const SLACK: usize = BLOCK_WIDTH - 1;

/// Errors raised while building padded paths.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// A zero byte inside the path would be read as its terminator.
    #[error("path contains a zero byte at offset {position}")]
    InteriorNul { position: usize },
}

fn check_no_nul(bytes: &[u8]) -> Result<(), PathError> {
    match bytes.iter().position(|&b| b == 0) {
        Some(position) => Err(PathError::InteriorNul { position }),
        None => Ok(()),
    }
}

/// Pointer to an item, storing index and cached ranked prefix.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SortPtr {
    pub index: usize,
    pub cache: u64,
}

/// A borrowed path that is safe to hand to the block comparator.
///
/// The view covers the path bytes, a zero terminator, and at least
/// [`SLACK`] more readable bytes.
#[derive(Clone, Copy)]
pub struct PaddedRef<'a> {
    buf: &'a [u8],
    len: usize,
}

impl<'a> PaddedRef<'a> {
    /// Wraps `buf`, whose first `len` bytes are the path.
    ///
    /// Returns `None` unless `buf[len]` is the only zero byte in
    /// `buf[..=len]` and `buf` extends at least [`SLACK`] bytes past it.
    ///
    /// ```
    /// use topocmp::PaddedRef;
    ///
    /// let mut buf = b"foo/bar".to_vec();
    /// buf.resize(buf.len() + 16, 0);
    /// assert!(PaddedRef::new(&buf, 7).is_some());
    /// assert!(PaddedRef::new(&buf[..10], 7).is_none());
    /// ```
    pub fn new(buf: &'a [u8], len: usize) -> Option<Self> {
        let short = len
            .checked_add(BLOCK_WIDTH)
            .is_none_or(|need| buf.len() < need);
        if short || buf.get(len) != Some(&0) || check_no_nul(&buf[..len]).is_err() {
            return None;
        }
        Some(PaddedRef { buf, len })
    }

    /// # Safety
    ///
    /// Same conditions as [`PaddedRef::new`], unchecked.
    #[inline(always)]
    pub(crate) unsafe fn new_unchecked(buf: &'a [u8], len: usize) -> Self {
        debug_assert!(buf.len() >= len + BLOCK_WIDTH && buf[len] == 0);
        PaddedRef { buf, len }
    }

    /// The path bytes, without terminator.
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        &self.buf[..self.len]
    }

    /// Pointer to the first path byte.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.buf.as_ptr()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl AsRef<[u8]> for PaddedRef<'_> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for PaddedRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl PartialEq for PaddedRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for PaddedRef<'_> {}

impl PartialOrd for PaddedRef<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PaddedRef<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        block::compare(self, other)
    }
}

/// An owned path with its terminator and slack.
///
/// Ordering is topological.
///
/// ```
/// use topocmp::PaddedPath;
///
/// let mut paths: Vec<PaddedPath> = ["foo-fleem", "foo/bar", "foo"]
///     .into_iter()
///     .map(PaddedPath::new)
///     .collect::<Result<_, _>>()
///     .unwrap();
/// paths.sort();
/// let sorted: Vec<&[u8]> = paths.iter().map(|p| p.as_bytes()).collect();
/// assert_eq!(
///     sorted,
///     vec![b"foo".as_slice(), b"foo/bar".as_slice(), b"foo-fleem".as_slice()]
/// );
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PaddedPath {
    buf: Vec<u8>,
    len: usize,
}

impl PaddedPath {
    /// Copies `bytes` into a padded buffer.
    pub fn new(bytes: impl AsRef<[u8]>) -> Result<Self, PathError> {
        let bytes = bytes.as_ref();
        check_no_nul(bytes)?;
        let mut buf = Vec::with_capacity(bytes.len() + BLOCK_WIDTH);
        buf.extend_from_slice(bytes);
        buf.resize(bytes.len() + BLOCK_WIDTH, 0);
        Ok(PaddedPath {
            buf,
            len: bytes.len(),
        })
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    #[inline]
    pub fn as_padded(&self) -> PaddedRef<'_> {
        // SAFETY: `new` wrote a terminator at `len` followed by SLACK zeros
        // and rejected interior zeros.
        unsafe { PaddedRef::new_unchecked(&self.buf, self.len) }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl AsRef<[u8]> for PaddedPath {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for PaddedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.as_padded(), f)
    }
}

impl fmt::Display for PaddedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl PartialOrd for PaddedPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PaddedPath {
    fn cmp(&self, other: &Self) -> Ordering {
        block::compare(&self.as_padded(), &other.as_padded())
    }
}

impl TryFrom<&str> for PaddedPath {
    type Error = PathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        PaddedPath::new(value)
    }
}

impl TryFrom<&[u8]> for PaddedPath {
    type Error = PathError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        PaddedPath::new(value)
    }
}

const CHUNK_BYTES: usize = 128;

// Cache-aligned storage unit for the arena.
#[cuneiform]
struct Chunk {
    bytes: [u8; CHUNK_BYTES],
}

// The arena reads chunks as one contiguous byte run; alignment padding
// would leave uninitialized bytes in it.
const _: () = assert!(std::mem::size_of::<Chunk>() == CHUNK_BYTES);

impl Chunk {
    const ZEROED: Chunk = Chunk {
        bytes: [0; CHUNK_BYTES],
    };
}

/// Contiguous storage for many padded paths.
///
/// Paths are packed back to back, each followed by its terminator, in
/// cache-line aligned chunks. Bytes past the last terminator stay zero, so
/// every stored path has at least [`SLACK`] readable bytes after it.
///
/// ```
/// use topocmp::PathArena;
///
/// let arena: PathArena = ["foo-fleem", "foo/bar", "foo"].into_iter().collect();
/// let sorted: Vec<&[u8]> = topocmp::topo_sort(&arena)
///     .into_iter()
///     .map(|i| arena.get(i).as_bytes())
///     .collect();
/// assert_eq!(
///     sorted,
///     vec![b"foo".as_slice(), b"foo/bar".as_slice(), b"foo-fleem".as_slice()]
/// );
/// ```
#[derive(Default)]
pub struct PathArena {
    chunks: Vec<Chunk>,
    used: usize,
    spans: Vec<(usize, usize)>,
}

impl PathArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a path and returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::InteriorNul`] if `bytes` contains a zero byte.
    pub fn push(&mut self, bytes: impl AsRef<[u8]>) -> Result<usize, PathError> {
        let bytes = bytes.as_ref();
        check_no_nul(bytes)?;

        let start = self.used;
        let end = start + bytes.len();
        let needed = end + BLOCK_WIDTH;
        let chunk_count = needed.div_ceil(CHUNK_BYTES);
        if chunk_count > self.chunks.len() {
            self.chunks.resize_with(chunk_count, || Chunk::ZEROED);
        }

        // Terminator and slack are already zero: chunks start zeroed and
        // nothing is ever written past `used`.
        self.bytes_mut()[start..end].copy_from_slice(bytes);
        self.used = end + 1;
        self.spans.push((start, bytes.len()));
        Ok(self.spans.len() - 1)
    }

    /// Padded view of the path at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn get(&self, index: usize) -> PaddedRef<'_> {
        let (start, len) = self.spans[index];
        // SAFETY: `push` reserved a terminator and SLACK zero bytes after
        // every path and rejected interior zeros.
        unsafe { PaddedRef::new_unchecked(&self.bytes()[start..], len) }
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = PaddedRef<'_>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    #[inline]
    fn bytes(&self) -> &[u8] {
        // SAFETY: `Chunk` is exactly CHUNK_BYTES of initialized bytes with no
        // padding, so the chunk vector is one contiguous byte run.
        unsafe {
            std::slice::from_raw_parts(
                self.chunks.as_ptr() as *const u8,
                self.chunks.len() * CHUNK_BYTES,
            )
        }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: see `bytes`.
        unsafe {
            std::slice::from_raw_parts_mut(
                self.chunks.as_mut_ptr() as *mut u8,
                self.chunks.len() * CHUNK_BYTES,
            )
        }
    }
}

impl fmt::Debug for PathArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Collects paths into an arena.
///
/// # Panics
///
/// Panics if a path contains a zero byte; use [`PathArena::push`] to handle
/// that case.
impl<P: AsRef<[u8]>> FromIterator<P> for PathArena {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut arena = PathArena::new();
        for path in iter {
            if let Err(err) = arena.push(path) {
                panic!("cannot store path in arena: {err}");
            }
        }
        arena
    }
}

/// A trait for accessing path bytes from a collection without copying.
///
/// Collections that keep their paths padded (like [`PathArena`]) override
/// [`KeyAccessor::get_padded`], which lets the sorting helpers compare in
/// place; everything else goes through the safe-copy path of
/// [`crate::compare_bytes`].
///
/// # Examples
///
/// ```
/// use topocmp::core::KeyAccessor;
///
/// struct Listing {
///     entries: Vec<String>,
/// }
///
/// impl KeyAccessor for Listing {
///     fn get_key(&self, index: usize) -> &[u8] {
///         self.entries[index].as_bytes()
///     }
///
///     fn len(&self) -> usize {
///         self.entries.len()
///     }
/// }
/// ```
pub trait KeyAccessor {
    /// Returns the path bytes at the given index.
    fn get_key(&self, index: usize) -> &[u8];

    /// Returns the number of items in the collection.
    fn len(&self) -> usize;

    /// Returns `true` if the collection is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a padded view of the path, if the collection stores one.
    fn get_padded(&self, _index: usize) -> Option<PaddedRef<'_>> {
        None
    }

    /// The first [`RANK_PREFIX_SIZE`] ranks of the path, big-endian, with
    /// zero filling past the terminator.
    ///
    /// Two paths whose prefixes differ are ordered the same way as their
    /// prefixes.
    #[inline(always)]
    fn get_rank_prefix(&self, index: usize) -> u64 {
        let key = self.get_key(index);
        let mut buf = [0u8; RANK_PREFIX_SIZE];
        for (slot, &byte) in buf.iter_mut().zip(key) {
            if byte == 0 {
                break;
            }
            *slot = RANK_TABLE[byte as usize];
        }
        u64::from_be_bytes(buf)
    }
}

// Blanket implementation for indexable slices of byte-ref types.
impl<T: AsRef<[u8]>> KeyAccessor for [T] {
    fn get_key(&self, index: usize) -> &[u8] {
        self[index].as_ref()
    }

    fn len(&self) -> usize {
        self.len()
    }
}

// Explicit Vec impl to improve ergonomics (avoiding .as_slice()).
impl<T: AsRef<[u8]>> KeyAccessor for Vec<T> {
    fn get_key(&self, index: usize) -> &[u8] {
        self[index].as_ref()
    }

    fn len(&self) -> usize {
        self.len()
    }
}

impl<T: AsRef<[u8]>> KeyAccessor for VecDeque<T> {
    fn get_key(&self, index: usize) -> &[u8] {
        self[index].as_ref()
    }

    fn len(&self) -> usize {
        self.len()
    }
}

impl KeyAccessor for PathArena {
    fn get_key(&self, index: usize) -> &[u8] {
        self.get(index).as_bytes()
    }

    fn len(&self) -> usize {
        self.len()
    }

    fn get_padded(&self, index: usize) -> Option<PaddedRef<'_>> {
        Some(self.get(index))
    }
}

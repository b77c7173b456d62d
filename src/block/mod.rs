//! Block-wise topological comparison.
//!
//! Both operands are walked in [`BLOCK_WIDTH`]-byte blocks. Each block is
//! remapped into rank space (see [`crate::rank`]), then a single mask tells
//! whether any lane differs or terminates. Only the block that stops the walk
//! pays for locating the lane and pulling its two ranks out of the vector
//! registers; every other block costs a handful of lane-parallel operations
//! and one well-predicted branch.
//!
//! Several backends implement the same per-block contract:
//!
//! - [`SimdLevel::Scalar`]: portable mask sequence and bit scan, no intrinsics.
//! - [`SimdLevel::Sse2`]: compare/or/movemask, lane extraction through a store.
//! - [`SimdLevel::Sse42`]: the implicit-length string compare instruction
//!   (`pcmpistri`) and `pshufb` lane extraction.
//! - [`SimdLevel::Neon`]: compare masks narrowed to nibbles, `tbl` extraction.
//!
//! A [`Comparator`] is a resolved backend. The free functions in this module
//! use a process-wide comparator that is resolved once, honouring the
//! `TOPOCMP_SIMD` environment variable.

#[cfg(target_arch = "aarch64")]
mod neon;
mod scalar;
#[cfg(target_arch = "x86_64")]
mod sse2;
#[cfg(target_arch = "x86_64")]
mod sse42;

use crate::core::PaddedRef;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Number of bytes compared per step.
pub const BLOCK_WIDTH: usize = 16;

/// One step's worth of raw path bytes.
pub type Block = [u8; BLOCK_WIDTH];

/// Environment variable that pins the backend used by the process-wide comparator.
pub const SIMD_ENV: &str = "TOPOCMP_SIMD";

/// Where, within one pair of blocks, the two paths can first be told apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Located {
    /// Lowest lane whose ranks differ or where either path terminates.
    /// [`BLOCK_WIDTH`] when the block is a shared, unterminated prefix.
    pub index: usize,
    /// The ranks at `index` differ.
    pub differs: bool,
    /// The first path terminates at `index`.
    pub a_terminated: bool,
    /// The second path terminates at `index`.
    pub b_terminated: bool,
}

impl Located {
    /// No lane stops the walk.
    pub const CONTINUE: Located = Located {
        index: BLOCK_WIDTH,
        differs: false,
        a_terminated: false,
        b_terminated: false,
    };

    /// Builds the result for a stop at `index` from the two ranks found there.
    #[inline]
    pub(crate) fn at(index: usize, rank_a: u8, rank_b: u8) -> Located {
        Located {
            index,
            differs: rank_a != rank_b,
            a_terminated: rank_a == 0,
            b_terminated: rank_b == 0,
        }
    }

    /// Returns `true` if the walk must stop at this block.
    #[inline]
    pub fn is_stop(&self) -> bool {
        self.index < BLOCK_WIDTH
    }

    /// Ordering implied by this block, or `None` if the walk continues.
    ///
    /// Termination is checked before the rank difference: a path that ends
    /// at `index` sorts first unless the other ends there too.
    pub fn ordering(&self, rank_a: u8, rank_b: u8) -> Option<Ordering> {
        if !self.is_stop() {
            return None;
        }
        Some(match (self.a_terminated, self.b_terminated) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => rank_a.cmp(&rank_b),
        })
    }
}

/// Instruction set used by a [`Comparator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SimdLevel {
    Scalar,
    Sse2,
    Sse42,
    Neon,
}

impl SimdLevel {
    /// Every level, from most to least preferred.
    pub const ALL: [SimdLevel; 4] = [
        SimdLevel::Sse42,
        SimdLevel::Neon,
        SimdLevel::Sse2,
        SimdLevel::Scalar,
    ];

    /// Returns `true` if the running CPU can execute this level.
    pub fn is_supported(self) -> bool {
        match self {
            SimdLevel::Scalar => true,
            #[cfg(target_arch = "x86_64")]
            SimdLevel::Sse2 => is_x86_feature_detected!("sse2"),
            #[cfg(target_arch = "x86_64")]
            SimdLevel::Sse42 => {
                is_x86_feature_detected!("sse4.2") && is_x86_feature_detected!("ssse3")
            }
            #[cfg(target_arch = "aarch64")]
            SimdLevel::Neon => std::arch::is_aarch64_feature_detected!("neon"),
            #[allow(unreachable_patterns)]
            _ => false,
        }
    }

    fn backend(self) -> Option<&'static Backend> {
        if !self.is_supported() {
            return None;
        }
        match self {
            SimdLevel::Scalar => Some(&scalar::BACKEND),
            #[cfg(target_arch = "x86_64")]
            SimdLevel::Sse2 => Some(&sse2::BACKEND),
            #[cfg(target_arch = "x86_64")]
            SimdLevel::Sse42 => Some(&sse42::BACKEND),
            #[cfg(target_arch = "aarch64")]
            SimdLevel::Neon => Some(&neon::BACKEND),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}

impl fmt::Display for SimdLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SimdLevel::Scalar => "scalar",
            SimdLevel::Sse2 => "sse2",
            SimdLevel::Sse42 => "sse4.2",
            SimdLevel::Neon => "neon",
        })
    }
}

/// Error returned when parsing an unknown [`SimdLevel`] name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown SIMD level `{0}` (expected scalar, sse2, sse4.2 or neon)")]
pub struct UnknownLevel(pub String);

impl FromStr for SimdLevel {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scalar" => Ok(SimdLevel::Scalar),
            "sse2" => Ok(SimdLevel::Sse2),
            "sse4.2" | "sse42" => Ok(SimdLevel::Sse42),
            "neon" => Ok(SimdLevel::Neon),
            _ => Err(UnknownLevel(s.to_string())),
        }
    }
}

/// Per-backend function table.
///
/// All entries are `unsafe` because the SIMD ones require CPU features; a
/// table is only reachable through [`SimdLevel::backend`], which checks them.
pub(crate) struct Backend {
    /// Rank every lane of a raw block.
    pub remap: unsafe fn(&Block) -> Block,
    /// Locate the first distinguishing lane of two raw blocks.
    pub locate: unsafe fn(&Block, &Block) -> Located,
    /// Pull lane `index` (< `BLOCK_WIDTH`) out of a block.
    pub extract: unsafe fn(&Block, usize) -> u8,
    /// Compare one block at each pointer; `None` means "shared prefix, keep going".
    /// Both pointers must address `BLOCK_WIDTH` readable bytes.
    pub step: unsafe fn(*const u8, *const u8) -> Option<Ordering>,
    /// Full walk over two terminated, padded paths.
    pub compare: unsafe fn(*const u8, *const u8) -> Ordering,
}

/// A resolved comparison backend.
///
/// ```
/// use std::cmp::Ordering;
/// use topocmp::block::Comparator;
///
/// let cmp = Comparator::detect();
/// assert_eq!(cmp.compare_bytes(b"foo/bar", b"foo-fleem"), Ordering::Less);
/// ```
#[derive(Clone, Copy)]
pub struct Comparator {
    level: SimdLevel,
    backend: &'static Backend,
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Comparator")
            .field("level", &self.level)
            .finish()
    }
}

impl Comparator {
    /// Comparator for `level`, or `None` if the CPU does not support it.
    pub fn with_level(level: SimdLevel) -> Option<Comparator> {
        level.backend().map(|backend| Comparator { level, backend })
    }

    /// Best comparator for the running CPU.
    ///
    /// A supported level named in `TOPOCMP_SIMD` takes precedence.
    pub fn detect() -> Comparator {
        Comparator::detect_configured(std::env::var(SIMD_ENV).ok())
    }

    /// Best comparator, preferring the level named by `raw` when it is valid
    /// and supported.
    fn detect_configured(raw: Option<String>) -> Comparator {
        if let Some(configured) = configured_level(raw) {
            if let Some(cmp) = Comparator::with_level(configured) {
                return cmp;
            }
            warn!(level = %configured, "configured SIMD level unsupported, detecting");
        }
        Comparator::available()
            .next()
            .unwrap_or(Comparator {
                level: SimdLevel::Scalar,
                backend: &scalar::BACKEND,
            })
    }

    /// Every comparator the running CPU supports, most preferred first.
    pub fn available() -> impl Iterator<Item = Comparator> {
        SimdLevel::ALL.into_iter().filter_map(Comparator::with_level)
    }

    /// Instruction set this comparator runs on.
    pub fn level(&self) -> SimdLevel {
        self.level
    }

    /// Ranks every lane of `block`.
    pub fn remap_block(&self, block: &Block) -> Block {
        // SAFETY: the backend was checked against the CPU at construction.
        unsafe { (self.backend.remap)(block) }
    }

    /// Finds the first lane at which raw blocks `a` and `b` can be told apart.
    pub fn locate(&self, a: &Block, b: &Block) -> Located {
        // SAFETY: see `remap_block`.
        unsafe { (self.backend.locate)(a, b) }
    }

    /// Returns lane `index` of `block`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= BLOCK_WIDTH`.
    pub fn extract_lane(&self, block: &Block, index: usize) -> u8 {
        assert!(index < BLOCK_WIDTH, "lane {index} out of range");
        // SAFETY: see `remap_block`; the index was bounds-checked above.
        unsafe { (self.backend.extract)(block, index) }
    }

    /// Compares two padded paths.
    #[inline]
    pub fn compare(&self, a: &PaddedRef<'_>, b: &PaddedRef<'_>) -> Ordering {
        // SAFETY: `PaddedRef` guarantees a terminator followed by
        // `BLOCK_WIDTH - 1` readable bytes.
        unsafe { self.compare_raw(a.as_ptr(), b.as_ptr()) }
    }

    /// Compares two terminated paths in place.
    ///
    /// # Safety
    ///
    /// Each pointer must address a zero-terminated byte sequence followed by
    /// at least `BLOCK_WIDTH - 1` readable bytes, and neither sequence may be
    /// written to during the call.
    #[inline]
    pub unsafe fn compare_raw(&self, a: *const u8, b: *const u8) -> Ordering {
        if std::ptr::eq(a, b) {
            return Ordering::Equal;
        }
        // SAFETY: forwarded from the caller.
        unsafe { (self.backend.compare)(a, b) }
    }

    /// Compares two unpadded paths.
    ///
    /// A path ends at its first zero byte or at the end of the slice. Blocks
    /// that lie entirely inside both slices are compared in place; the last
    /// partial block of each slice is copied into a zero-filled scratch block
    /// first, so nothing past either slice is ever read.
    pub fn compare_bytes(&self, a: &[u8], b: &[u8]) -> Ordering {
        if std::ptr::eq(a, b) {
            return Ordering::Equal;
        }
        let mut tail_a: Block = [0; BLOCK_WIDTH];
        let mut tail_b: Block = [0; BLOCK_WIDTH];
        let mut offset = 0;
        loop {
            let pa = block_ptr(a, offset, &mut tail_a);
            let pb = block_ptr(b, offset, &mut tail_b);
            // SAFETY: each pointer addresses BLOCK_WIDTH bytes, either inside
            // its slice or inside its scratch block.
            if let Some(order) = unsafe { (self.backend.step)(pa, pb) } {
                return order;
            }
            offset += BLOCK_WIDTH;
        }
    }
}

/// Pointer to the block of `path` at `offset`, copying it to `tail` when it
/// runs past the end of the slice.
///
/// A copied block always contains a terminator, so the walk stops there.
#[inline(always)]
fn block_ptr(path: &[u8], offset: usize, tail: &mut Block) -> *const u8 {
    match path.get(offset..offset + BLOCK_WIDTH) {
        Some(window) => window.as_ptr(),
        None => {
            let rest = path.get(offset..).unwrap_or(&[]);
            tail.fill(0);
            tail[..rest.len()].copy_from_slice(rest);
            tail.as_ptr()
        }
    }
}

fn configured_level(raw: Option<String>) -> Option<SimdLevel> {
    let raw = raw?;
    match raw.parse() {
        Ok(level) => Some(level),
        Err(err) => {
            warn!(%err, var = SIMD_ENV, "ignoring invalid SIMD level");
            None
        }
    }
}

static GLOBAL: OnceLock<Comparator> = OnceLock::new();

/// The process-wide comparator, resolved on first use.
pub fn global() -> Comparator {
    *GLOBAL.get_or_init(|| {
        let cmp = Comparator::detect();
        debug!(level = %cmp.level(), "resolved topological comparator");
        cmp
    })
}

/// Compares two padded paths with the process-wide comparator.
///
/// ```
/// use std::cmp::Ordering;
/// use topocmp::PaddedPath;
///
/// let dir = PaddedPath::new("foo").unwrap();
/// let child = PaddedPath::new("foo/bar").unwrap();
/// assert_eq!(topocmp::compare(&dir.as_padded(), &child.as_padded()), Ordering::Less);
/// ```
#[inline]
pub fn compare(a: &PaddedRef<'_>, b: &PaddedRef<'_>) -> Ordering {
    global().compare(a, b)
}

/// Compares two unpadded paths with the process-wide comparator.
///
/// See [`Comparator::compare_bytes`].
#[inline]
pub fn compare_bytes(a: &[u8], b: &[u8]) -> Ordering {
    global().compare_bytes(a, b)
}

/// Compares two terminated paths in place with the process-wide comparator.
///
/// # Safety
///
/// See [`Comparator::compare_raw`].
#[inline]
pub unsafe fn compare_raw(a: *const u8, b: *const u8) -> Ordering {
    // SAFETY: forwarded from the caller.
    unsafe { global().compare_raw(a, b) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_names_round_trip() {
        for level in SimdLevel::ALL {
            assert_eq!(level.to_string().parse::<SimdLevel>(), Ok(level));
        }
        assert_eq!(" SSE42 ".parse::<SimdLevel>(), Ok(SimdLevel::Sse42));
        assert!("avx512".parse::<SimdLevel>().is_err());
    }

    #[test]
    fn test_configured_level_selects_backend() {
        let cmp = Comparator::detect_configured(Some("scalar".to_string()));
        assert_eq!(cmp.level(), SimdLevel::Scalar);
    }

    #[test]
    fn test_invalid_configured_level_falls_back_to_detection() {
        let best = Comparator::available().next().unwrap().level();
        for raw in [Some("bogus".to_string()), Some(String::new()), None] {
            assert_eq!(Comparator::detect_configured(raw).level(), best);
        }
    }

    #[test]
    fn test_unsupported_configured_level_falls_back_to_detection() {
        let best = Comparator::available().next().unwrap().level();
        for level in SimdLevel::ALL.into_iter().filter(|l| !l.is_supported()) {
            let cmp = Comparator::detect_configured(Some(level.to_string()));
            assert_eq!(cmp.level(), best);
        }
    }

    #[test]
    fn test_scalar_always_available() {
        assert!(SimdLevel::Scalar.is_supported());
        assert!(Comparator::available().any(|c| c.level() == SimdLevel::Scalar));
    }

    #[test]
    fn test_termination_checked_before_difference() {
        let both = Located::at(3, 0, 0);
        assert_eq!(both.ordering(0, 0), Some(Ordering::Equal));
        let a_ends = Located::at(3, 0, b'x');
        assert_eq!(a_ends.ordering(0, b'x'), Some(Ordering::Less));
        let b_ends = Located::at(3, 1, 0);
        assert_eq!(b_ends.ordering(1, 0), Some(Ordering::Greater));
        assert_eq!(Located::CONTINUE.ordering(0, 0), None);
    }

    #[test]
    fn test_safe_copy_never_reads_past_slice() {
        // The slice ends mid-block; the bytes after it in the parent buffer
        // must not influence the result.
        let parent = *b"foo/bar-and-more-bytes-past-the-end";
        for cmp in Comparator::available() {
            assert_eq!(cmp.compare_bytes(&parent[..7], b"foo/bar"), Ordering::Equal);
            assert_eq!(cmp.compare_bytes(&parent[..3], b"foo/"), Ordering::Less);
        }
    }
}

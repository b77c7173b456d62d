//! # Topocmp
//!
//! `topocmp` orders filesystem-style paths *topologically*: every directory
//! sorts immediately before its contents, and no sibling can land between a
//! directory and its children.
//!
//! Plain byte order gets this wrong because `-` (`0x2D`) and `.` (`0x2E`)
//! sort below `/` (`0x2F`):
//!
//! ```text
//! byte order        topological order
//! foo               foo
//! foo-fleem         foo/bar
//! foo/bar           foo/bar/baz
//! foo/bar/baz       foo-fleem
//! ```
//!
//! The fix is to compare *ranks* instead of bytes, where `/` ranks directly
//! above the terminator (see [`rank`]). Remapping happens on the fly inside
//! a vectorized comparator that walks both paths sixteen bytes at a time; the
//! caller's bytes are never modified.
//!
//! ## Key Features
//!
//! - **Block comparison**: one compare mask per sixteen bytes, with the first
//!   distinguishing lane pulled out of the vector registers only once.
//! - **Runtime dispatch**: SSE4.2 (`pcmpistri`), SSE2, NEON or a portable
//!   scalar backend, selected once per process (override with
//!   `TOPOCMP_SIMD`).
//! - **Padded buffers**: [`PaddedPath`] and [`PathArena`] keep the trailing
//!   slack the block loads need; plain slices go through a safe-copy path.
//! - **Sorting helpers**: [`topo_sort`] and [`topo_sort_mut`] for any
//!   [`KeyAccessor`].
//!
//! ## Usage
//!
//! ```rust
//! use topocmp::topo_sort_mut;
//!
//! let mut paths = vec!["foo/bar/baz", "foo-fleem", "foo", "foo/bar"];
//! topo_sort_mut(&mut paths);
//!
//! assert_eq!(paths, vec!["foo", "foo/bar", "foo/bar/baz", "foo-fleem"]);
//! ```
//!
//! As a comparator for an existing sort:
//!
//! ```rust
//! use topocmp::compare_bytes;
//!
//! let mut paths = vec!["foo-fleem", "foo/bar", "foo"];
//! paths.sort_by(|a, b| compare_bytes(a.as_bytes(), b.as_bytes()));
//!
//! assert_eq!(paths, vec!["foo", "foo/bar", "foo-fleem"]);
//! ```
//!
//! ## Memory Contract
//!
//! The in-place comparator reads whole blocks, so every path must be followed
//! by its zero terminator and at least [`BLOCK_WIDTH`]` - 1` more readable
//! bytes. [`PaddedPath`], [`PaddedRef`] and [`PathArena`] guarantee this;
//! [`compare_raw`] leaves it to the caller.

pub mod algo;
pub mod block;
pub mod core;
pub mod rank;
pub mod reference;

pub use algo::{is_topo_sorted, topo_sort, topo_sort_mut};
pub use block::{
    BLOCK_WIDTH, Comparator, Located, SimdLevel, compare, compare_bytes, compare_raw,
};
pub use crate::core::{KeyAccessor, PaddedPath, PaddedRef, PathArena, PathError};

pub mod prelude {
    pub use crate::algo::{is_topo_sorted, topo_sort, topo_sort_mut};
    pub use crate::block::{Comparator, compare, compare_bytes};
    pub use crate::core::{KeyAccessor, PaddedPath, PathArena};
}

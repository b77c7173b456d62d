//! The topological alphabet.
//!
//! Paths are ordered by comparing *ranks* instead of raw bytes. The rank of
//! a byte is the byte itself, except that `/` is pulled down to sit right
//! above the terminator and every byte in `0x01..=0x2E` moves up by one to
//! make room for it:
//!
//! | byte            | rank        |
//! |-----------------|-------------|
//! | `0x00`          | `0x00`      |
//! | `/` (`0x2F`)    | `0x01`      |
//! | `0x01..=0x2E`   | `byte + 1`  |
//! | `0x30..=0xFF`   | `byte`      |
//!
//! The mapping is a bijection on `0..=255`, so comparing ranks is a total
//! order, and it never touches the caller's bytes: ranks only ever live in
//! registers or in scratch copies.

/// The path separator, which ranks directly above the terminator.
pub const SEPARATOR: u8 = b'/';

/// Rank assigned to [`SEPARATOR`].
pub const SEPARATOR_RANK: u8 = 1;

/// Branchless `if mask { then } else { otherwise }` for a full-width byte mask.
///
/// `mask` must be either `0x00` or `0xFF`.
#[inline(always)]
pub const fn select_u8(mask: u8, then: u8, otherwise: u8) -> u8 {
    (mask & then) | (!mask & otherwise)
}

/// Widens a boolean into a `0x00`/`0xFF` byte mask.
#[inline(always)]
pub const fn mask_u8(cond: bool) -> u8 {
    0u8.wrapping_sub(cond as u8)
}

/// Returns the topological rank of `byte`.
///
/// ```
/// use topocmp::rank::rank;
///
/// assert_eq!(rank(0), 0);
/// assert_eq!(rank(b'/'), 1);
/// assert_eq!(rank(b'-'), b'-' + 1);
/// assert_eq!(rank(b'a'), b'a');
/// ```
#[inline(always)]
pub const fn rank(byte: u8) -> u8 {
    // byte - 1 wraps 0x00 to 0xFF, so one unsigned compare covers 0x01..=0x2E.
    let below = (byte.wrapping_sub(1) < SEPARATOR - 1) as u8;
    let shifted = byte.wrapping_add(below);
    select_u8(mask_u8(byte == SEPARATOR), SEPARATOR_RANK, shifted)
}

/// Inverse of [`rank`].
#[inline]
pub const fn unrank(rank: u8) -> u8 {
    match rank {
        SEPARATOR_RANK => SEPARATOR,
        2..=SEPARATOR => rank - 1,
        other => other,
    }
}

/// [`rank`] precomputed for all 256 byte values.
pub static RANK_TABLE: [u8; 256] = build_table();

const fn build_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = rank(i as u8);
        i += 1;
    }
    table
}

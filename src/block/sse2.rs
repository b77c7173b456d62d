//! SSE2 backend: compare/or/movemask, with lane extraction through a store.

use super::{BLOCK_WIDTH, Backend, Block, Located};
use std::arch::x86_64::*;
use std::cmp::Ordering;

pub(super) static BACKEND: Backend = Backend {
    remap,
    locate,
    extract,
    step,
    compare,
};

/// `(mask & then) | (!mask & otherwise)`, lane by lane.
#[inline]
#[target_feature(enable = "sse2")]
pub(super) unsafe fn select(mask: __m128i, then: __m128i, otherwise: __m128i) -> __m128i {
    unsafe { _mm_or_si128(_mm_and_si128(mask, then), _mm_andnot_si128(mask, otherwise)) }
}

/// Ranks all sixteen lanes.
///
/// `0x01..=0x2E` is detected as `byte - 1 <= 0x2D` (unsigned, via `min`), and
/// subtracting the all-ones mask adds one to exactly those lanes.
#[inline]
#[target_feature(enable = "sse2")]
pub(super) unsafe fn rank_lanes(v: __m128i) -> __m128i {
    unsafe {
        let one = _mm_set1_epi8(1);
        let is_slash = _mm_cmpeq_epi8(v, _mm_set1_epi8(b'/' as i8));
        let dec = _mm_sub_epi8(v, one);
        let below = _mm_cmpeq_epi8(_mm_min_epu8(dec, _mm_set1_epi8((b'/' - 2) as i8)), dec);
        let shifted = _mm_sub_epi8(v, below);
        select(is_slash, one, shifted)
    }
}

/// Bit `i` set when lane `i` differs in rank or terminates in either operand.
#[inline]
#[target_feature(enable = "sse2")]
unsafe fn stop_mask(raw_a: __m128i, raw_b: __m128i, rank_a: __m128i, rank_b: __m128i) -> u32 {
    unsafe {
        let zero = _mm_setzero_si128();
        let same = _mm_movemask_epi8(_mm_cmpeq_epi8(rank_a, rank_b)) as u32;
        let ends = _mm_movemask_epi8(_mm_or_si128(
            _mm_cmpeq_epi8(raw_a, zero),
            _mm_cmpeq_epi8(raw_b, zero),
        )) as u32;
        (same ^ 0xFFFF) | ends
    }
}

#[inline]
#[target_feature(enable = "sse2")]
unsafe fn lane(v: __m128i, index: usize) -> u8 {
    let mut lanes = [0u8; BLOCK_WIDTH];
    unsafe { _mm_storeu_si128(lanes.as_mut_ptr() as *mut __m128i, v) };
    lanes[index]
}

#[inline]
#[target_feature(enable = "sse2")]
unsafe fn load(ptr: *const u8) -> __m128i {
    unsafe { _mm_loadu_si128(ptr as *const __m128i) }
}

#[target_feature(enable = "sse2")]
unsafe fn remap(raw: &Block) -> Block {
    let mut out = [0u8; BLOCK_WIDTH];
    unsafe { _mm_storeu_si128(out.as_mut_ptr() as *mut __m128i, rank_lanes(load(raw.as_ptr()))) };
    out
}

#[target_feature(enable = "sse2")]
unsafe fn locate(a: &Block, b: &Block) -> Located {
    unsafe {
        let (raw_a, raw_b) = (load(a.as_ptr()), load(b.as_ptr()));
        let (rank_a, rank_b) = (rank_lanes(raw_a), rank_lanes(raw_b));
        let mask = stop_mask(raw_a, raw_b, rank_a, rank_b);
        if mask == 0 {
            return Located::CONTINUE;
        }
        let index = mask.trailing_zeros() as usize;
        Located::at(index, lane(rank_a, index), lane(rank_b, index))
    }
}

#[target_feature(enable = "sse2")]
unsafe fn extract(block: &Block, index: usize) -> u8 {
    unsafe { lane(load(block.as_ptr()), index) }
}

#[inline]
#[target_feature(enable = "sse2")]
unsafe fn step(a: *const u8, b: *const u8) -> Option<Ordering> {
    unsafe {
        let (raw_a, raw_b) = (load(a), load(b));
        let (rank_a, rank_b) = (rank_lanes(raw_a), rank_lanes(raw_b));
        let mask = stop_mask(raw_a, raw_b, rank_a, rank_b);
        if mask == 0 {
            return None;
        }
        let index = mask.trailing_zeros() as usize;
        // Ranks keep 0x00 as the unique minimum, so the rank order at the
        // stop lane already accounts for termination.
        Some(lane(rank_a, index).cmp(&lane(rank_b, index)))
    }
}

#[target_feature(enable = "sse2")]
unsafe fn compare(a: *const u8, b: *const u8) -> Ordering {
    let mut offset = 0;
    loop {
        // SAFETY: blocks before the stop precede both terminators; the stop
        // block lies within the caller's slack.
        if let Some(order) = unsafe { step(a.add(offset), b.add(offset)) } {
            return order;
        }
        offset += BLOCK_WIDTH;
    }
}

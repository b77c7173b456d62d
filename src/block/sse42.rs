//! SSE4.2 backend built on the implicit-length string compare instruction.
//!
//! `pcmpistri` in equal-each mode with negative polarity reports the lowest
//! lane where the operands differ or exactly one of them has ended. Lanes
//! past a terminator in both operands compare equal, so a pair of paths that
//! end together reports no lane at all; the zero/sign flags distinguish that
//! case from a plain shared prefix. Remapping keeps `0x00` as the only zero
//! rank, so the instruction's terminator detection on ranks agrees with
//! detection on the raw bytes.

use super::sse2::rank_lanes;
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

const MODE: i32 =
    _SIDD_UBYTE_OPS | _SIDD_CMP_EQUAL_EACH | _SIDD_NEGATIVE_POLARITY | _SIDD_LEAST_SIGNIFICANT;

/// Moves lane `index` to lane 0 with `pshufb` and reads it out.
///
/// The selector is `0x80` (zero fill) everywhere except lane 0, which holds
/// `index`.
#[inline]
#[target_feature(enable = "sse4.2")]
unsafe fn lane(v: __m128i, index: usize) -> u8 {
    unsafe {
        let fill = _mm_slli_si128::<1>(_mm_set1_epi8(i8::MIN));
        let selector = _mm_or_si128(fill, _mm_cvtsi32_si128(index as i32));
        (_mm_cvtsi128_si32(_mm_shuffle_epi8(v, selector)) & 0xFF) as u8
    }
}

#[inline]
#[target_feature(enable = "sse4.2")]
unsafe fn load_ranked(ptr: *const u8) -> __m128i {
    unsafe { rank_lanes(_mm_loadu_si128(ptr as *const __m128i)) }
}

#[target_feature(enable = "sse4.2")]
unsafe fn remap(raw: &Block) -> Block {
    let mut out = [0u8; BLOCK_WIDTH];
    unsafe { _mm_storeu_si128(out.as_mut_ptr() as *mut __m128i, load_ranked(raw.as_ptr())) };
    out
}

#[target_feature(enable = "sse4.2")]
unsafe fn locate(a: &Block, b: &Block) -> Located {
    unsafe {
        let rank_a = load_ranked(a.as_ptr());
        let rank_b = load_ranked(b.as_ptr());
        let mut index = _mm_cmpistri(rank_a, rank_b, MODE) as usize;
        if index == BLOCK_WIDTH {
            if _mm_cmpistrz(rank_a, rank_b, MODE) == 0 && _mm_cmpistrs(rank_a, rank_b, MODE) == 0 {
                return Located::CONTINUE;
            }
            // Both ended on the same lane; find it.
            let zero = _mm_setzero_si128();
            let ends = _mm_movemask_epi8(_mm_or_si128(
                _mm_cmpeq_epi8(rank_a, zero),
                _mm_cmpeq_epi8(rank_b, zero),
            ));
            index = (ends as u32).trailing_zeros() as usize;
        }
        Located::at(index, lane(rank_a, index), lane(rank_b, index))
    }
}

#[target_feature(enable = "sse4.2")]
unsafe fn extract(block: &Block, index: usize) -> u8 {
    unsafe { lane(_mm_loadu_si128(block.as_ptr() as *const __m128i), index) }
}

#[inline]
#[target_feature(enable = "sse4.2")]
unsafe fn step(a: *const u8, b: *const u8) -> Option<Ordering> {
    unsafe {
        let rank_a = load_ranked(a);
        let rank_b = load_ranked(b);
        let index = _mm_cmpistri(rank_a, rank_b, MODE) as usize;
        if index < BLOCK_WIDTH {
            return Some(lane(rank_a, index).cmp(&lane(rank_b, index)));
        }
        if _mm_cmpistrz(rank_a, rank_b, MODE) != 0 || _mm_cmpistrs(rank_a, rank_b, MODE) != 0 {
            return Some(Ordering::Equal);
        }
        None
    }
}

#[target_feature(enable = "sse4.2")]
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

//! NEON backend.
//!
//! NEON has no movemask; a compare result is narrowed to one nibble per lane
//! (`shrn #4`) and read out as a `u64`, so lane `i` owns bits `4i..4i+4`.

use super::{BLOCK_WIDTH, Backend, Block, Located};
use std::arch::aarch64::*;
use std::cmp::Ordering;

pub(super) static BACKEND: Backend = Backend {
    remap,
    locate,
    extract,
    step,
    compare,
};

#[inline]
#[target_feature(enable = "neon")]
unsafe fn rank_lanes(v: uint8x16_t) -> uint8x16_t {
    unsafe {
        let one = vdupq_n_u8(1);
        let is_slash = vceqq_u8(v, vdupq_n_u8(b'/'));
        let below = vcleq_u8(vsubq_u8(v, one), vdupq_n_u8(b'/' - 2));
        let shifted = vsubq_u8(v, below);
        vbslq_u8(is_slash, one, shifted)
    }
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn nibble_mask(lanes: uint8x16_t) -> u64 {
    unsafe {
        let narrowed = vshrn_n_u16::<4>(vreinterpretq_u16_u8(lanes));
        vget_lane_u64::<0>(vreinterpret_u64_u8(narrowed))
    }
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn stop_mask(
    raw_a: uint8x16_t,
    raw_b: uint8x16_t,
    rank_a: uint8x16_t,
    rank_b: uint8x16_t,
) -> u64 {
    unsafe {
        let zero = vdupq_n_u8(0);
        let differs = vmvnq_u8(vceqq_u8(rank_a, rank_b));
        let ends = vorrq_u8(vceqq_u8(raw_a, zero), vceqq_u8(raw_b, zero));
        nibble_mask(vorrq_u8(differs, ends))
    }
}

/// Moves lane `index` to lane 0 with `tbl` (out-of-range selectors read as
/// zero) and reads it out.
#[inline]
#[target_feature(enable = "neon")]
unsafe fn lane(v: uint8x16_t, index: usize) -> u8 {
    unsafe {
        let selector = vsetq_lane_u8::<0>(index as u8, vdupq_n_u8(0xFF));
        vgetq_lane_u8::<0>(vqtbl1q_u8(v, selector))
    }
}

#[target_feature(enable = "neon")]
unsafe fn remap(raw: &Block) -> Block {
    let mut out = [0u8; BLOCK_WIDTH];
    unsafe { vst1q_u8(out.as_mut_ptr(), rank_lanes(vld1q_u8(raw.as_ptr()))) };
    out
}

#[target_feature(enable = "neon")]
unsafe fn locate(a: &Block, b: &Block) -> Located {
    unsafe {
        let (raw_a, raw_b) = (vld1q_u8(a.as_ptr()), vld1q_u8(b.as_ptr()));
        let (rank_a, rank_b) = (rank_lanes(raw_a), rank_lanes(raw_b));
        let mask = stop_mask(raw_a, raw_b, rank_a, rank_b);
        if mask == 0 {
            return Located::CONTINUE;
        }
        let index = (mask.trailing_zeros() / 4) as usize;
        Located::at(index, lane(rank_a, index), lane(rank_b, index))
    }
}

#[target_feature(enable = "neon")]
unsafe fn extract(block: &Block, index: usize) -> u8 {
    unsafe { lane(vld1q_u8(block.as_ptr()), index) }
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn step(a: *const u8, b: *const u8) -> Option<Ordering> {
    unsafe {
        let (raw_a, raw_b) = (vld1q_u8(a), vld1q_u8(b));
        let (rank_a, rank_b) = (rank_lanes(raw_a), rank_lanes(raw_b));
        let mask = stop_mask(raw_a, raw_b, rank_a, rank_b);
        if mask == 0 {
            return None;
        }
        let index = (mask.trailing_zeros() / 4) as usize;
        Some(lane(rank_a, index).cmp(&lane(rank_b, index)))
    }
}

#[target_feature(enable = "neon")]
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

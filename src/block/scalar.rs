//! Portable backend: the mask sequence spelled out lane by lane.

use super::{BLOCK_WIDTH, Backend, Block, Located};
use crate::rank::rank;
use std::cmp::Ordering;

pub(super) static BACKEND: Backend = Backend {
    remap,
    locate,
    extract,
    step,
    compare,
};

#[inline(always)]
fn remap_lanes(raw: &Block) -> Block {
    let mut out = [0u8; BLOCK_WIDTH];
    out.iter_mut().zip(raw).for_each(|(o, &b)| *o = rank(b));
    out
}

/// One bit per lane that differs in rank or terminates in either operand,
/// plus a sentinel bit at `BLOCK_WIDTH` so the bit scan never sees zero.
#[inline(always)]
fn stop_mask(raw_a: &Block, raw_b: &Block, rank_a: &Block, rank_b: &Block) -> u32 {
    let mut mask = 1u32 << BLOCK_WIDTH;
    for lane in 0..BLOCK_WIDTH {
        let hit = (rank_a[lane] != rank_b[lane]) | (raw_a[lane] == 0) | (raw_b[lane] == 0);
        mask |= (hit as u32) << lane;
    }
    mask
}

#[inline(always)]
fn locate_lanes(raw_a: &Block, raw_b: &Block) -> (Located, u8, u8) {
    let rank_a = remap_lanes(raw_a);
    let rank_b = remap_lanes(raw_b);
    let index = stop_mask(raw_a, raw_b, &rank_a, &rank_b).trailing_zeros() as usize;
    if index == BLOCK_WIDTH {
        return (Located::CONTINUE, 0, 0);
    }
    let (ra, rb) = (rank_a[index], rank_b[index]);
    (Located::at(index, ra, rb), ra, rb)
}

unsafe fn remap(raw: &Block) -> Block {
    remap_lanes(raw)
}

unsafe fn locate(a: &Block, b: &Block) -> Located {
    locate_lanes(a, b).0
}

unsafe fn extract(block: &Block, index: usize) -> u8 {
    block[index]
}

#[inline(always)]
unsafe fn step(a: *const u8, b: *const u8) -> Option<Ordering> {
    // SAFETY: the caller guarantees BLOCK_WIDTH readable bytes at each pointer.
    let (raw_a, raw_b) = unsafe {
        (
            std::ptr::read_unaligned(a as *const Block),
            std::ptr::read_unaligned(b as *const Block),
        )
    };
    let (located, ra, rb) = locate_lanes(&raw_a, &raw_b);
    located.ordering(ra, rb)
}

unsafe fn compare(a: *const u8, b: *const u8) -> Ordering {
    let mut offset = 0;
    loop {
        // SAFETY: every block before the stop lies before both terminators,
        // and the stop block lies within the caller's slack.
        if let Some(order) = unsafe { step(a.add(offset), b.add(offset)) } {
            return order;
        }
        offset += BLOCK_WIDTH;
    }
}

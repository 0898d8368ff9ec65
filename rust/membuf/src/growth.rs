//! Capacity growth for writes that do not fit in the current mapping.
//!
//! A write that would reach the end of the allocation is split in two: the part
//! that still fits is copied first, the mapping is then extended (and possibly
//! relocated) to a new page-aligned capacity, and the remainder is copied into
//! the added space. Each growth over-allocates by [`GROWTH_HEADROOM_PAGES`] so a
//! stream of small appends remaps only once every few pages.

use membuf_page_alloc::align::align_up_u64;

/// Extra pages added on top of the rounded-up requirement on every growth.
pub const GROWTH_HEADROOM_PAGES: u64 = 8;

/// How a boundary-crossing write is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthPlan {
    /// Bytes copied into the free space of the current allocation before growing.
    pub writable: u64,
    /// Number of bytes that overflow the current allocation.
    pub overflow: u64,
    /// Capacity to request from the mapping, or `None` if it is not representable.
    pub new_capacity: Option<u64>,
}

impl GrowthPlan {
    /// Plans a `size`-byte write into a buffer holding `length` bytes in an
    /// allocation of `capacity` bytes.
    ///
    /// Requires `length <= capacity` and `length + size >= capacity`, i.e. the
    /// write does not fit in place.
    pub fn new(capacity: u64, length: u64, size: u64, page_size: u64) -> GrowthPlan {
        debug_assert!(length <= capacity);
        let writable = capacity - length;
        debug_assert!(writable <= size);
        let overflow = size - writable;
        GrowthPlan {
            writable,
            overflow,
            new_capacity: next_capacity(capacity, overflow, page_size),
        }
    }
}

/// Computes `round_up_to_page(capacity + overflow) + GROWTH_HEADROOM_PAGES` pages.
pub fn next_capacity(capacity: u64, overflow: u64, page_size: u64) -> Option<u64> {
    let required = align_up_u64(capacity.checked_add(overflow)?, page_size)?;
    required.checked_add(page_size.checked_mul(GROWTH_HEADROOM_PAGES)?)
}

/// Aligns a number up to the next multiple of the specified alignment.
///
/// Returns `None` if the aligned value does not fit in a `u64`.
///
/// # Examples
///
/// ```
/// use membuf_page_alloc::align::align_up_u64;
///
/// assert_eq!(align_up_u64(0, 8), Some(0));
/// assert_eq!(align_up_u64(1, 8), Some(8));
/// assert_eq!(align_up_u64(8, 8), Some(8));
/// assert_eq!(align_up_u64(9, 8), Some(16));
/// assert_eq!(align_up_u64(u64::MAX, 8), None);
/// ```
///
/// # Panics
///
/// This function will panic in debug builds if `alignment` is 0 or not a power of 2.
#[inline]
pub fn align_up_u64(n: u64, alignment: u64) -> Option<u64> {
    debug_assert_ne!(alignment, 0);
    debug_assert!(alignment.is_power_of_two());
    Some(n.checked_add(alignment - 1)? & !(alignment - 1))
}

/// Checks if a number is aligned to the specified alignment boundary.
///
/// # Examples
///
/// ```
/// use membuf_page_alloc::align::is_aligned_u64;
///
/// assert!(is_aligned_u64(0, 8));
/// assert!(!is_aligned_u64(7, 8));
/// assert!(is_aligned_u64(16, 8));
/// ```
#[inline]
pub fn is_aligned_u64(n: u64, alignment: u64) -> bool {
    debug_assert_ne!(alignment, 0);
    debug_assert!(alignment.is_power_of_two());
    (n & (alignment - 1)) == 0
}

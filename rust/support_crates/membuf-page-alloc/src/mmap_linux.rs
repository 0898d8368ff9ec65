use std::sync::OnceLock;

/// Allocates memory using standard pages via mmap.
///
/// This function allocates `size` bytes of anonymous, private, zero-initialized
/// memory using the standard system page size, which is typically 4KB.
///
/// # Arguments
///
/// * `size` - The number of bytes to allocate. The actual allocation will be rounded up
///   to the nearest page boundary. A zero size allocates a single page.
///
/// # Returns
///
/// Returns a `Result` containing:
/// - `Ok((ptr, capacity))` - A tuple with a pointer to the allocated memory and the actual
///   capacity in bytes (which may be larger than the requested size due to page alignment)
/// - `Err(io::Error)` - An I/O error if the allocation fails
///
/// # Safety
///
/// The returned pointer must be deallocated using [`free`] with the same capacity value
/// to avoid memory leaks. The allocated memory is readable and writable.
pub fn allocate(size: usize) -> std::io::Result<(*mut std::ffi::c_void, usize)> {
    let capacity = page_capacity(size)?;
    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            capacity,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
            -1,
            0,
        )
    };
    if ptr.is_null() || ptr == libc::MAP_FAILED {
        let err = std::io::Error::last_os_error();
        return Err(err);
    }
    Ok((ptr, capacity))
}

/// Extends a mapping obtained from [`allocate`] to `new_size` bytes.
///
/// Uses `mremap` with `MREMAP_MAYMOVE`, so the kernel may move the mapping to a
/// different address when it cannot be extended in place. The contents of the
/// first `old_size` bytes are preserved and the added tail reads as zeros.
///
/// # Returns
///
/// - `Ok((ptr, capacity))` - The (possibly relocated) pointer and the new page-rounded
///   capacity. The old pointer must not be used after a successful call.
/// - `Err(io::Error)` - The mapping could not be extended. The original mapping is
///   left untouched and remains valid.
///
/// # Safety
///
/// - `ptr` must have been returned by [`allocate`] or a previous [`reallocate`]
/// - `old_size` must be the capacity returned by that call
/// - No references into the old region may be held across this call
pub unsafe fn reallocate(
    ptr: *mut std::ffi::c_void,
    old_size: usize,
    new_size: usize,
) -> std::io::Result<(*mut std::ffi::c_void, usize)> {
    let capacity = page_capacity(new_size)?;
    assert!(capacity >= old_size);
    if capacity == old_size {
        return Ok((ptr, capacity));
    }
    let new_ptr = unsafe { libc::mremap(ptr, old_size, capacity, libc::MREMAP_MAYMOVE) };
    if new_ptr.is_null() || new_ptr == libc::MAP_FAILED {
        return Err(std::io::Error::last_os_error());
    }
    Ok((new_ptr, capacity))
}

/// Frees memory that was allocated using standard pages.
///
/// This function deallocates memory that was previously allocated with [`allocate`]
/// or extended with [`reallocate`]. It must be called with the exact capacity that was
/// **returned** by the most recent of those calls.
///
/// # Safety
///
/// This function is safe to call as long as:
/// - `ptr` was returned by a previous call to [`allocate`] or [`reallocate`]
/// - `size` matches the capacity returned by that call
/// - The memory has not already been freed
/// - No other references to the memory exist
pub unsafe fn free(ptr: *mut std::ffi::c_void, size: usize) -> std::io::Result<()> {
    let res = unsafe { libc::munmap(ptr, size) };
    if res < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

/// Gets the system's standard page size in bytes.
///
/// The value is read once via `sysconf(_SC_PAGESIZE)` and cached for the lifetime of
/// the process. If the page size cannot be determined, 4KB is assumed.
pub fn get_page_size() -> usize {
    static SIZE: OnceLock<usize> = OnceLock::new();
    *SIZE.get_or_init(|| read_page_size().unwrap_or(4 * 1024))
}

fn page_capacity(size: usize) -> std::io::Result<usize> {
    let page_size = get_page_size();
    assert!(page_size.is_power_of_two());
    size.max(1)
        .checked_next_multiple_of(page_size)
        .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::OutOfMemory))
}

fn read_page_size() -> std::io::Result<usize> {
    let res = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if res < 0 {
        return Err(std::io::Error::last_os_error());
    }
    let size = res as usize;
    if !size.is_power_of_two() {
        return Err(std::io::Error::other(format!("unexpected page size {size}")));
    }
    Ok(size)
}

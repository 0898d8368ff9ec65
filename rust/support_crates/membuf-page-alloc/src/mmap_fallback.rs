use std::alloc::{Layout, alloc_zeroed, dealloc, realloc};

/// Allocates memory using standard pages (emulated).
pub fn allocate(size: usize) -> std::io::Result<(*mut std::ffi::c_void, usize)> {
    let capacity = page_capacity(size)?;
    let layout = page_layout(capacity)?;

    let ptr = unsafe { alloc_zeroed(layout) };
    if ptr.is_null() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::OutOfMemory,
            "Failed to allocate memory",
        ));
    }

    Ok((ptr as *mut std::ffi::c_void, capacity))
}

/// Extends an allocation obtained from [`allocate`] (emulated with `realloc`).
///
/// The added tail is zeroed so that the region matches the behavior of an
/// anonymous mapping.
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
    // Validates that the new size still forms a legal layout at page alignment.
    page_layout(capacity)?;

    let old_layout = page_layout(old_size)?;
    let new_ptr = unsafe { realloc(ptr as *mut u8, old_layout, capacity) };
    if new_ptr.is_null() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::OutOfMemory,
            "Failed to reallocate memory",
        ));
    }
    unsafe {
        std::ptr::write_bytes(new_ptr.add(old_size), 0, capacity - old_size);
    }

    Ok((new_ptr as *mut std::ffi::c_void, capacity))
}

/// Frees memory that was allocated using standard pages.
pub unsafe fn free(ptr: *mut std::ffi::c_void, size: usize) -> std::io::Result<()> {
    assert!(size.is_multiple_of(get_page_size()));
    let layout = page_layout(size)?;

    unsafe {
        dealloc(ptr as *mut u8, layout);
    }
    Ok(())
}

/// Returns the "standard page" size in bytes.
pub fn get_page_size() -> usize {
    4 * 1024
}

fn page_capacity(size: usize) -> std::io::Result<usize> {
    size.max(1)
        .checked_next_multiple_of(get_page_size())
        .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::OutOfMemory))
}

fn page_layout(size: usize) -> std::io::Result<Layout> {
    Layout::from_size_align(size, get_page_size())
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "Invalid layout"))
}

use std::sync::OnceLock;
use windows_sys::Win32::{
    Foundation::GetLastError,
    System::{
        Memory::{MEM_COMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_READWRITE, VirtualAlloc, VirtualFree},
        SystemInformation::{GetSystemInfo, SYSTEM_INFO},
    },
};

/// Allocates memory using standard pages.
///
/// This function allocates memory using the standard system page size. The memory is
/// committed and reserved in a single operation and is zero-initialized.
///
/// # Arguments
///
/// * `size` - The number of bytes to allocate. Will be rounded up to the nearest
///   page boundary. A zero size allocates a single page.
///
/// # Returns
///
/// A tuple containing the pointer to the allocated memory and the actual allocated size.
///
/// # Errors
///
/// Returns an error if the memory allocation fails.
pub fn allocate(size: usize) -> std::io::Result<(*mut std::ffi::c_void, usize)> {
    let capacity = page_capacity(size)?;

    unsafe {
        let ptr = VirtualAlloc(
            std::ptr::null_mut(),
            capacity,
            MEM_COMMIT | MEM_RESERVE,
            PAGE_READWRITE,
        );

        if ptr.is_null() {
            let error = GetLastError();
            return Err(std::io::Error::from_raw_os_error(error as i32));
        }

        Ok((ptr, capacity))
    }
}

/// Extends an allocation obtained from [`allocate`] to `new_size` bytes.
///
/// Windows has no equivalent of `mremap`, so a new region is allocated, the first
/// `old_size` bytes are copied over and the old region is released. The returned
/// pointer always differs from `ptr` unless the capacity does not change.
///
/// # Errors
///
/// Returns an error if the new region cannot be allocated; the original allocation
/// is left untouched in that case.
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

    let (new_ptr, capacity) = allocate(capacity)?;
    unsafe {
        std::ptr::copy_nonoverlapping(ptr as *const u8, new_ptr as *mut u8, old_size);
        if let Err(e) = free(ptr, old_size) {
            log::warn!("failed to release relocated region of {old_size} bytes: {e}");
        }
    }
    Ok((new_ptr, capacity))
}

/// Frees memory that was allocated using standard pages.
///
/// # Arguments
///
/// * `ptr` - Pointer to the memory to free.
/// * `size` - Size of the memory region (must be a multiple of the page size).
///
/// # Errors
///
/// Returns an error if the memory deallocation fails.
///
/// # Safety
///
/// The caller must ensure that `ptr` was allocated by [`allocate`] or
/// [`reallocate`] and has not been freed already.
pub unsafe fn free(ptr: *mut std::ffi::c_void, size: usize) -> std::io::Result<()> {
    assert!(size.is_multiple_of(get_page_size()));
    unsafe {
        let result = VirtualFree(ptr, 0, MEM_RELEASE);
        if result == 0 {
            let error = GetLastError();
            return Err(std::io::Error::from_raw_os_error(error as i32));
        }
    }
    Ok(())
}

/// Returns the size of standard memory pages on the current system.
///
/// The value is retrieved via `GetSystemInfo` once and cached for subsequent calls.
pub fn get_page_size() -> usize {
    static PAGE_SIZE: OnceLock<usize> = OnceLock::new();

    *PAGE_SIZE.get_or_init(|| unsafe {
        let mut system_info: SYSTEM_INFO = std::mem::zeroed();
        GetSystemInfo(&mut system_info);
        system_info.dwPageSize as usize
    })
}

fn page_capacity(size: usize) -> std::io::Result<usize> {
    let page_size = get_page_size();
    assert!(page_size.is_power_of_two());
    size.max(1)
        .checked_next_multiple_of(page_size)
        .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::OutOfMemory))
}

//! Memory-mapped buffer implementation with support for in-place growth.
//!
//! This module provides `MmapBuffer`, a low-level memory buffer backed by anonymous
//! memory-mapped pages. Unlike a heap vector, the backing block is obtained directly
//! from the operating system's virtual memory facility and is grown by remapping,
//! which lets the kernel extend or relocate the region without a user-space copy
//! where the platform supports it.
//!
//! # Addressing
//!
//! [`MmapBuffer::grow`] may move the block to a different address. Callers must
//! address the contents through offsets into the slices returned by this type and
//! never hold a raw pointer across a call that takes `&mut self`.

use crate::mmap;

/// A memory-mapped buffer that provides raw page allocation.
///
/// `MmapBuffer` wraps platform-specific memory mapping functionality and provides
/// a safe interface for allocating, growing and releasing memory pages. The buffer
/// tracks a logical length that never exceeds the allocated capacity.
pub struct MmapBuffer {
    /// Raw pointer to the allocated memory region.
    ptr: *mut u8,
    /// The logical length of the buffer in bytes.
    len: usize,
    /// The actual allocated capacity, always a multiple of the page size.
    capacity: usize,
}

impl MmapBuffer {
    /// Returns the size of a regular memory page on the current system.
    ///
    /// The value is discovered from the operating system on first use and cached for
    /// the remainder of the process lifetime.
    pub fn page_size() -> usize {
        mmap::get_page_size()
    }

    /// Allocates a zero-initialized memory buffer using regular pages.
    ///
    /// # Arguments
    ///
    /// * `size` - The desired logical length of the buffer in bytes. The capacity is
    ///   rounded up to the nearest page boundary; a zero size still reserves one page.
    ///
    /// # Errors
    ///
    /// Returns an error if the system cannot allocate the requested memory.
    pub fn allocate(size: usize) -> std::io::Result<MmapBuffer> {
        let (ptr, capacity) = mmap::allocate(size)?;
        assert!((ptr as usize).is_multiple_of(Self::page_size()));
        Ok(MmapBuffer {
            ptr: ptr as _,
            len: size,
            capacity,
        })
    }

    /// Returns the logical length of the buffer in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the buffer has a length of 0.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the actual allocated capacity in bytes.
    ///
    /// The capacity is always at least as large as the logical length and is a
    /// positive multiple of the page size.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the alignment of the buffer in bytes (the regular page size).
    #[inline]
    pub fn alignment(&self) -> usize {
        Self::page_size()
    }

    /// Returns a raw pointer to the beginning of the allocated memory.
    ///
    /// The pointer is invalidated by [`grow`](Self::grow). It is exposed for
    /// diagnostics and alignment checks only.
    #[inline]
    pub fn ptr(&self) -> *const u8 {
        self.ptr
    }

    /// Sets the logical length of the buffer, clamped to the allocated capacity.
    ///
    /// This method does **not** allocate or deallocate memory. Bytes between the old
    /// and the new length keep whatever was last written there (zero if never written).
    pub fn resize(&mut self, new_len: usize) {
        self.len = std::cmp::min(new_len, self.capacity);
    }

    /// Grows the allocated capacity to at least `new_capacity` bytes.
    ///
    /// The request is rounded up to a page boundary. The logical length and the
    /// contents of the whole old capacity are preserved; the added space reads as
    /// zeros. The block may move to a different address. A request that does not
    /// exceed the current capacity is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the mapping cannot be extended. The buffer is left
    /// unchanged in that case and remains fully usable.
    pub fn grow(&mut self, new_capacity: usize) -> std::io::Result<()> {
        if new_capacity <= self.capacity {
            return Ok(());
        }
        let (ptr, capacity) =
            unsafe { mmap::reallocate(self.ptr as _, self.capacity, new_capacity)? };
        assert!((ptr as usize).is_multiple_of(Self::page_size()));
        self.ptr = ptr as _;
        self.capacity = capacity;
        Ok(())
    }

    /// Releases the allocated memory, reporting any failure from the operating system.
    ///
    /// Dropping the buffer releases the memory as well, but silently.
    pub fn release(mut self) -> std::io::Result<()> {
        let ptr = std::mem::replace(&mut self.ptr, std::ptr::null_mut());
        unsafe { mmap::free(ptr as _, self.capacity) }
    }

    /// Returns an immutable byte slice view of the buffer contents up to the logical
    /// length.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }

    /// Returns a mutable byte slice view of the buffer contents up to the logical
    /// length.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
    }

    /// Returns a mutable view of the entire allocation, including the space past the
    /// logical length.
    ///
    /// The whole capacity is always initialized (mapped pages are zero-filled), so
    /// exposing it as a byte slice is sound.
    #[inline]
    pub fn capacity_bytes_mut(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.capacity) }
    }
}

impl std::ops::Deref for MmapBuffer {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_bytes()
    }
}

impl std::ops::DerefMut for MmapBuffer {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_bytes_mut()
    }
}

impl AsRef<[u8]> for MmapBuffer {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsMut<[u8]> for MmapBuffer {
    #[inline]
    fn as_mut(&mut self) -> &mut [u8] {
        self.as_bytes_mut()
    }
}

impl Drop for MmapBuffer {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            if let Err(e) = unsafe { mmap::free(self.ptr as _, self.capacity) } {
                log::warn!("failed to release {} mapped bytes: {e}", self.capacity);
            }
        }
    }
}

// SAFETY: MmapBuffer exclusively owns its memory region and releases it on drop.
unsafe impl Send for MmapBuffer {}

// SAFETY: shared references only expose immutable views; every mutation, including
// growth, requires `&mut self`.
unsafe impl Sync for MmapBuffer {}

impl std::fmt::Debug for MmapBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MmapBuffer")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .finish()
    }
}

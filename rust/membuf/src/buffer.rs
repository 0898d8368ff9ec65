//! `MemBuf`: a growable, page-backed memory stream.

use membuf_common::{Error, ErrorCode, ErrorKind, Result, verify_arg};
use membuf_page_alloc::MmapBuffer;

use crate::{growth::GrowthPlan, whence::Whence};

/// A growable byte stream over anonymous mapped memory with file-like semantics.
///
/// The stream holds `len()` valid bytes inside an allocation of `capacity()` bytes
/// (a positive multiple of the page size) and a cursor in `0..=len()` used by
/// [`read`](Self::read) and [`write`](Self::write).
///
/// # Errors
///
/// Every operation returns a [`Result`]. In addition, each failure ORs its
/// [`ErrorCode`] into a sticky flag byte ([`error`](Self::error)) and records it as
/// the [`last_error`](Self::last_error). Neither is ever reset by a later success,
/// so they answer "has anything failed since the stream was opened", not "did the
/// previous call fail".
///
/// # Addressing
///
/// Writes past the capacity remap the backing block, which may move it. The
/// contents are therefore only reachable through offsets and borrowed slices;
/// [`as_bytes`](Self::as_bytes) borrows the stream, which prevents any write while
/// the view is alive.
#[derive(Debug)]
pub struct MemBuf {
    /// Backing pages. Its logical length is the stream length.
    mem: MmapBuffer,
    cursor: u64,
    flags: u8,
    last_error: Option<ErrorCode>,
    name: Option<String>,
}

impl MemBuf {
    /// Opens a new stream.
    ///
    /// With `initial_len == 0` the stream is empty and backed by a single zeroed
    /// page; `initial` is not consulted. Otherwise `initial` must hold at least
    /// `initial_len` bytes, which are copied into an allocation of
    /// `initial_len` rounded up to the page size.
    ///
    /// `name` is diagnostic only.
    pub fn open(name: Option<&str>, initial_len: u64, initial: Option<&[u8]>) -> Result<MemBuf> {
        if initial_len == 0 {
            return Self::allocate(name, 0);
        }
        let Some(initial) = initial else {
            return Err(Error::invalid_arg(
                "initial",
                "initial content is required when initial_len is not zero",
            ));
        };
        verify_arg!(initial, initial.len() as u64 >= initial_len);

        let mut buf = Self::allocate(name, initial_len)?;
        buf.mem.copy_from_slice(&initial[..initial_len as usize]);
        Ok(buf)
    }

    /// Opens an anonymous, empty stream.
    pub fn new() -> Result<MemBuf> {
        Self::open(None, 0, None)
    }

    /// Opens a stream pre-populated with `bytes`.
    pub fn from_bytes(name: Option<&str>, bytes: &[u8]) -> Result<MemBuf> {
        Self::open(name, bytes.len() as u64, Some(bytes))
    }

    /// Allocates a zero-filled stream of `len` bytes with the cursor at the start.
    pub(crate) fn allocate(name: Option<&str>, len: u64) -> Result<MemBuf> {
        let size = usize::try_from(len)
            .map_err(|_| Error::out_of_memory(len, std::io::ErrorKind::OutOfMemory.into()))?;
        let mem = MmapBuffer::allocate(size).map_err(|e| Error::out_of_memory(len, e))?;
        log::trace!(
            "opened stream {:?}: length {}, capacity {}",
            name.unwrap_or_default(),
            mem.len(),
            mem.capacity()
        );
        Ok(MemBuf {
            mem,
            cursor: 0,
            flags: 0,
            last_error: None,
            name: name.map(str::to_string),
        })
    }

    /// Closes the stream and releases its memory.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::UnmapFailed`] if the operating system refuses to release the
    /// mapping. The stream is consumed either way.
    pub fn close(self) -> Result<()> {
        log::trace!(
            "closing stream {:?}: length {}, capacity {}",
            self.name.as_deref().unwrap_or_default(),
            self.mem.len(),
            self.mem.capacity()
        );
        self.mem.release().map_err(Error::unmap_failed)
    }

    /// Size of a regular memory page, which every capacity is a multiple of.
    pub fn page_size() -> u64 {
        MmapBuffer::page_size() as u64
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Number of valid bytes in the stream.
    #[inline]
    pub fn len(&self) -> u64 {
        self.mem.len() as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mem.is_empty()
    }

    /// Size of the backing allocation in bytes.
    #[inline]
    pub fn capacity(&self) -> u64 {
        self.mem.capacity() as u64
    }

    /// Current cursor position.
    #[inline]
    pub fn tell(&self) -> u64 {
        self.cursor
    }

    /// Returns `true` when no read of even a single byte can succeed from the
    /// current cursor. Reads must stay strictly inside the stream, so this holds
    /// once the cursor reaches `len() - 1`.
    #[inline]
    pub fn eof(&self) -> bool {
        self.cursor.saturating_add(1) >= self.len()
    }

    /// The valid contents of the stream, `0..len()`.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.mem.as_bytes()
    }

    /// Sticky error flags: the OR of the codes of every failure recorded so far.
    #[inline]
    pub fn error(&self) -> u8 {
        self.flags
    }

    /// The most recent failure recorded on this stream.
    #[inline]
    pub fn last_error(&self) -> Option<ErrorCode> {
        self.last_error
    }

    /// Reads `size` bytes at the cursor into `dest[..size]` and advances the cursor.
    ///
    /// The read must end strictly before the end of the stream: a read whose last
    /// byte is the final byte of the stream is rejected.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::DestinationMissing`] if `dest` is shorter than `size`
    /// - [`ErrorKind::InvalidRead`] if `tell() + size >= len()`
    pub fn read(&mut self, size: u64, dest: &mut [u8]) -> Result<u64> {
        if size == 0 {
            return Ok(0);
        }
        if (dest.len() as u64) < size {
            return self.fail(ErrorKind::DestinationMissing {
                required: size,
                actual: dest.len() as u64,
            });
        }
        let length = self.len();
        if !matches!(self.cursor.checked_add(size), Some(end) if end < length) {
            return self.fail(ErrorKind::InvalidRead {
                offset: self.cursor,
                size,
                length,
            });
        }

        let start = self.cursor as usize;
        let count = size as usize;
        dest[..count].copy_from_slice(&self.mem[start..start + count]);
        self.cursor += size;
        Ok(size)
    }

    /// Reads a single byte at the cursor.
    pub fn getc(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.read(1, &mut byte)?;
        Ok(byte[0])
    }

    /// Writes `src[..size]` at the cursor and advances the cursor by `size`.
    ///
    /// The stream is append-oriented: every write extends the length by `size`,
    /// also when the cursor was moved back into existing content. When the write
    /// does not fit below the current capacity, the part that fits is copied, the
    /// mapping is grown (see [`crate::growth`]) and the rest is copied after it.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::SourceMissing`] if `src` is shorter than `size`
    /// - [`ErrorKind::OutOfMemory`] if the mapping cannot be grown. The prefix that
    ///   fitted stays written and accounted for in `len()` and `tell()`.
    pub fn write(&mut self, size: u64, src: &[u8]) -> Result<u64> {
        if size == 0 {
            return Ok(0);
        }
        if (src.len() as u64) < size {
            return self.fail(ErrorKind::SourceMissing {
                required: size,
                actual: src.len() as u64,
            });
        }
        let src = &src[..size as usize];

        let end = self.len() + size;
        if end < self.capacity() {
            self.copy_at_cursor(src);
            self.mem.resize(end as usize);
            self.check_invariants();
            Ok(size)
        } else {
            self.write_growing(src)
        }
    }

    /// Writes all of `bytes` at the cursor.
    pub fn write_all_bytes(&mut self, bytes: &[u8]) -> Result<u64> {
        self.write(bytes.len() as u64, bytes)
    }

    /// Writes a single byte at the cursor.
    pub fn putc(&mut self, byte: u8) -> Result<u64> {
        self.write(1, &[byte])
    }

    /// Writes `element[..element_size]` `count` times.
    ///
    /// Returns `count * element_size`, or the first failing write's error.
    pub fn fill(&mut self, count: u64, element_size: u64, element: &[u8]) -> Result<u64> {
        let total = count
            .checked_mul(element_size)
            .ok_or_else(|| Error::invalid_arg("count", "count * element_size overflows u64"))?;
        for _ in 0..count {
            self.write(element_size, element)?;
        }
        Ok(total)
    }

    /// Moves the cursor by `delta` relative to `whence`.
    ///
    /// - [`Whence::Start`]: `delta` must be in `0..=len()`.
    /// - [`Whence::Current`]: the new cursor must stay in `0..=len()`.
    /// - [`Whence::End`]: `delta` must be in `-len()..=0`; the cursor lands `|delta|`
    ///   bytes before the end.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::InvalidOffset`] for any target outside the stream. The cursor is
    /// left unchanged.
    pub fn seek(&mut self, whence: Whence, delta: i64) -> Result<()> {
        let length = self.len();
        let target = match whence {
            Whence::Start => u64::try_from(delta).ok().filter(|&pos| pos <= length),
            Whence::Current => self
                .cursor
                .checked_add_signed(delta)
                .filter(|&pos| pos <= length),
            Whence::End if delta > 0 => None,
            Whence::End => length.checked_sub(delta.unsigned_abs()),
        };
        match target {
            Some(pos) => {
                self.cursor = pos;
                Ok(())
            }
            None => self.fail(ErrorKind::InvalidOffset {
                origin: whence.name(),
                delta,
                length,
            }),
        }
    }

    /// Like [`seek`](Self::seek), with `whence` given as a stdio-style
    /// `SEEK_SET`/`SEEK_CUR`/`SEEK_END` value.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::InvalidWhence`] for any other `whence` value.
    pub fn seek_raw(&mut self, whence: i32, delta: i64) -> Result<()> {
        match Whence::try_from(whence) {
            Ok(whence) => self.seek(whence, delta),
            Err(e) => Err(self.record(e)),
        }
    }

    /// Moves the cursor back to the start of the stream.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// No-op: the contents live only in memory.
    pub fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    pub(crate) fn mem_mut(&mut self) -> &mut MmapBuffer {
        &mut self.mem
    }

    /// Records `err` in the sticky flags and returns it.
    pub(crate) fn record(&mut self, err: Error) -> Error {
        if let Some(code) = err.code() {
            self.flags |= code.as_u8();
            self.last_error = Some(code);
        }
        err
    }

    fn fail<T>(&mut self, kind: ErrorKind) -> Result<T> {
        Err(self.record(kind.into()))
    }

    /// Copies `src` to the cursor position and advances the cursor. The caller
    /// guarantees that the bytes fit in the current capacity.
    fn copy_at_cursor(&mut self, src: &[u8]) {
        let start = self.cursor as usize;
        self.mem.capacity_bytes_mut()[start..start + src.len()].copy_from_slice(src);
        self.cursor += src.len() as u64;
    }

    fn write_growing(&mut self, src: &[u8]) -> Result<u64> {
        let size = src.len() as u64;
        let length = self.len();
        let capacity = self.capacity();
        let plan = GrowthPlan::new(capacity, length, size, Self::page_size());

        let (head, tail) = src.split_at(plan.writable as usize);
        self.copy_at_cursor(head);

        let grown = plan
            .new_capacity
            .and_then(|cap| usize::try_from(cap).ok())
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::OutOfMemory))
            .and_then(|cap| self.mem.grow(cap));
        if let Err(e) = grown {
            // Keep the copied prefix inside the valid range.
            self.mem.resize((length + plan.writable) as usize);
            let requested = plan.new_capacity.unwrap_or(u64::MAX);
            return Err(self.record(Error::out_of_memory(requested, e)));
        }
        log::debug!(
            "stream {:?}: grew capacity {} -> {} for a {}-byte write",
            self.name().unwrap_or_default(),
            capacity,
            self.capacity(),
            size
        );

        self.copy_at_cursor(tail);
        self.mem.resize((length + size) as usize);
        self.check_invariants();
        Ok(size)
    }

    #[inline]
    fn check_invariants(&self) {
        debug_assert!(self.len() <= self.capacity());
        debug_assert!(self.cursor <= self.len());
        debug_assert!(self.capacity().is_multiple_of(Self::page_size()));
    }
}

impl std::io::Write for MemBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        MemBuf::write(self, buf.len() as u64, buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

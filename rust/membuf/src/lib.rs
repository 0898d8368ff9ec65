//! A growable memory stream with `stdio`-like semantics.
//!
//! [`MemBuf`] is an in-memory scratch stream for binary encoders: it supports
//! positioned reads and writes, seeking, bulk fills, and dumping to or loading
//! from a file. Its storage is obtained directly from the operating system's
//! virtual memory facility (see `membuf-page-alloc`) rather than from the heap
//! allocator, and grows by remapping.
//!
//! # Error model
//!
//! Operations return [`Result`]. Each failure is also recorded in the stream's
//! sticky error byte, queryable with [`MemBuf::error`] and convertible to text
//! with [`describe`]:
//!
//! ```
//! use membuf::{ErrorCode, MemBuf, Whence, describe};
//!
//! let mut buf = MemBuf::new().unwrap();
//! buf.write_all_bytes(b"\0asm").unwrap();
//! assert!(buf.seek(Whence::Start, -1).is_err());
//! assert_eq!(buf.last_error(), Some(ErrorCode::InvalidOffset));
//! assert_eq!(describe(buf.error()), ErrorCode::InvalidOffset.message());
//! buf.close().unwrap();
//! ```

mod buffer;
mod file;
pub mod growth;
mod whence;

pub use buffer::MemBuf;
pub use membuf_common::{ERROR_CODE_MAX, Error, ErrorCode, ErrorKind, Result, describe};
pub use whence::Whence;

#[cfg(test)]
mod tests;

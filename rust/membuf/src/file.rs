//! Loading a stream from a file and dumping it back.
//!
//! Both directions are raw byte mirrors of the stream contents, without any header.

use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

use membuf_common::{Error, Result};

use crate::MemBuf;

impl MemBuf {
    /// Opens a stream holding the entire contents of the file at `path`.
    ///
    /// The stream is named after the path. An empty file yields an empty stream.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::FileAccess`](membuf_common::ErrorKind::FileAccess) if the file
    /// cannot be inspected, opened or fully read.
    pub fn open_from_file(path: impl AsRef<Path>) -> Result<MemBuf> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let file_access = |e| Error::file_access(&name, e);

        let len = std::fs::metadata(path).map_err(file_access)?.len();
        let mut file = File::open(path).map_err(file_access)?;
        let mut buf = MemBuf::allocate(Some(name.as_str()), len)?;
        file.read_exact(buf.mem_mut().as_bytes_mut()).map_err(file_access)?;
        Ok(buf)
    }

    /// Writes the `len()` bytes of the stream to `path`, creating or truncating it.
    ///
    /// An empty stream still creates (or truncates) the file.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::FileAccess`](membuf_common::ErrorKind::FileAccess) if the file
    /// cannot be opened for writing or the contents cannot be written in full. The
    /// failure is recorded in the stream's error flags.
    pub fn dump(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let written = File::create(path).and_then(|mut file| {
            if !self.is_empty() {
                file.write_all(self.as_bytes())?;
            }
            file.flush()
        });
        written.map_err(|e| self.record(Error::file_access(path.display().to_string(), e)))
    }
}

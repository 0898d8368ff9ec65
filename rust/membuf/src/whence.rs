use membuf_common::{Error, ErrorKind};

/// Reference point for [`MemBuf::seek`](crate::MemBuf::seek).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Whence {
    /// Offset from the beginning of the stream; only non-negative deltas.
    Start,
    /// Offset from the current cursor; either sign.
    Current,
    /// Offset back from the end of the stream; only non-positive deltas.
    End,
}

impl Whence {
    pub const SEEK_SET: i32 = 0;
    pub const SEEK_CUR: i32 = 1;
    pub const SEEK_END: i32 = 2;

    pub fn name(self) -> &'static str {
        match self {
            Whence::Start => "start",
            Whence::Current => "current",
            Whence::End => "end",
        }
    }
}

impl TryFrom<i32> for Whence {
    type Error = Error;

    fn try_from(whence: i32) -> Result<Self, Self::Error> {
        match whence {
            Whence::SEEK_SET => Ok(Whence::Start),
            Whence::SEEK_CUR => Ok(Whence::Current),
            Whence::SEEK_END => Ok(Whence::End),
            _ => Err(ErrorKind::InvalidWhence { whence }.into()),
        }
    }
}

impl From<Whence> for i32 {
    fn from(whence: Whence) -> i32 {
        match whence {
            Whence::Start => Whence::SEEK_SET,
            Whence::Current => Whence::SEEK_CUR,
            Whence::End => Whence::SEEK_END,
        }
    }
}

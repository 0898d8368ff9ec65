//! Numeric error codes accumulated in a buffer's sticky error flags.
//!
//! Each failing buffer operation ORs its code into the buffer's flag byte. The
//! codes are small sequential integers rather than single bits, so a flag byte
//! holding more than one code may alias another code's value; the accumulated
//! byte answers "did anything fail since the buffer was opened", while
//! [`Error::code`](crate::error::Error::code) names the cause of one call.

/// One past the largest known code. [`describe`] maps anything at or above this
/// value to the "unknown error" message.
pub const ERROR_CODE_MAX: u8 = 10;

const SUCCESS_MESSAGE: &str = "Success";
const UNKNOWN_MESSAGE: &str = "Unknown error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    NullHandle = 1,
    UnmapFailed = 2,
    FileAccess = 3,
    DestinationMissing = 4,
    InvalidRead = 5,
    SourceMissing = 6,
    OutOfMemory = 7,
    InvalidWhence = 8,
    InvalidOffset = 9,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 9] = [
        ErrorCode::NullHandle,
        ErrorCode::UnmapFailed,
        ErrorCode::FileAccess,
        ErrorCode::DestinationMissing,
        ErrorCode::InvalidRead,
        ErrorCode::SourceMissing,
        ErrorCode::OutOfMemory,
        ErrorCode::InvalidWhence,
        ErrorCode::InvalidOffset,
    ];

    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(code: u8) -> Option<ErrorCode> {
        Self::ALL.get(usize::from(code).checked_sub(1)?).copied()
    }

    /// Fixed human-readable message for this code.
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::NullHandle => "Buffer handle is null",
            ErrorCode::UnmapFailed => "Could not unmap allocated memory",
            ErrorCode::FileAccess => "Could not access file as read or write failed",
            ErrorCode::DestinationMissing => "Destination of read is missing",
            ErrorCode::InvalidRead => "Cannot read more than the length of the stream",
            ErrorCode::SourceMissing => "Source of write is missing",
            ErrorCode::OutOfMemory => "System has run out of memory",
            ErrorCode::InvalidWhence => "Whence value given to seek is invalid",
            ErrorCode::InvalidOffset => "Cannot move stream cursor to an invalid offset",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Converts a raw error code (e.g. the value of a buffer's sticky flags) into a
/// message. Never fails.
pub fn describe(code: u8) -> &'static str {
    if code == 0 {
        return SUCCESS_MESSAGE;
    }
    if code >= ERROR_CODE_MAX {
        return UNKNOWN_MESSAGE;
    }
    ErrorCode::from_u8(code).map_or(UNKNOWN_MESSAGE, ErrorCode::message)
}

use thiserror::Error;

use crate::error_code::ErrorCode;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// The sticky flag code recorded for this error, if the error kind has one.
    pub fn code(&self) -> Option<ErrorCode> {
        self.kind().code()
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn out_of_memory(requested: u64, source: std::io::Error) -> Error {
        Error(ErrorKind::OutOfMemory { requested, source }.into())
    }

    pub fn unmap_failed(source: std::io::Error) -> Error {
        Error(ErrorKind::UnmapFailed { source }.into())
    }

    pub fn file_access(path: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::FileAccess {
                path: path.into(),
                source,
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("buffer handle is null")]
    NullHandle,

    #[error("could not unmap allocated memory: {source}")]
    UnmapFailed { source: std::io::Error },

    #[error("file access failed for '{path}': {source}")]
    FileAccess {
        path: String,
        source: std::io::Error,
    },

    #[error("destination buffer is too small: {required} bytes required, {actual} provided")]
    DestinationMissing { required: u64, actual: u64 },

    #[error("cannot read {size} bytes at offset {offset} from a stream of length {length}")]
    InvalidRead { offset: u64, size: u64, length: u64 },

    #[error("source buffer is too small: {required} bytes required, {actual} provided")]
    SourceMissing { required: u64, actual: u64 },

    #[error("failed to map {requested} bytes: {source}")]
    OutOfMemory {
        requested: u64,
        source: std::io::Error,
    },

    #[error("invalid whence value {whence}")]
    InvalidWhence { whence: i32 },

    #[error("cannot move cursor by {delta} from {origin} (length {length})")]
    InvalidOffset {
        origin: &'static str,
        delta: i64,
        length: u64,
    },
}

impl ErrorKind {
    pub fn code(&self) -> Option<ErrorCode> {
        let code = match self {
            ErrorKind::InvalidArgument { .. } => return None,
            ErrorKind::NullHandle => ErrorCode::NullHandle,
            ErrorKind::UnmapFailed { .. } => ErrorCode::UnmapFailed,
            ErrorKind::FileAccess { .. } => ErrorCode::FileAccess,
            ErrorKind::DestinationMissing { .. } => ErrorCode::DestinationMissing,
            ErrorKind::InvalidRead { .. } => ErrorCode::InvalidRead,
            ErrorKind::SourceMissing { .. } => ErrorCode::SourceMissing,
            ErrorKind::OutOfMemory { .. } => ErrorCode::OutOfMemory,
            ErrorKind::InvalidWhence { .. } => ErrorCode::InvalidWhence,
            ErrorKind::InvalidOffset { .. } => ErrorCode::InvalidOffset,
        };
        Some(code)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<Error> for std::io::Error {
    fn from(e: Error) -> Self {
        let kind = match e.kind() {
            ErrorKind::InvalidArgument { .. }
            | ErrorKind::DestinationMissing { .. }
            | ErrorKind::SourceMissing { .. }
            | ErrorKind::InvalidWhence { .. }
            | ErrorKind::InvalidOffset { .. } => std::io::ErrorKind::InvalidInput,
            ErrorKind::InvalidRead { .. } => std::io::ErrorKind::UnexpectedEof,
            ErrorKind::OutOfMemory { .. } => std::io::ErrorKind::OutOfMemory,
            ErrorKind::NullHandle
            | ErrorKind::UnmapFailed { .. }
            | ErrorKind::FileAccess { .. } => std::io::ErrorKind::Other,
        };
        std::io::Error::new(kind, e)
    }
}

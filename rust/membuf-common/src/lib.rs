//! Core definitions shared by the membuf crates: the error type, the `Result`
//! alias and the numeric error codes recorded in a buffer's sticky flags.

pub mod error;
pub mod error_code;
pub mod result;

pub use error::{Error, ErrorKind};
pub use error_code::{ERROR_CODE_MAX, ErrorCode, describe};
pub use result::Result;

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::io::Error as IoError;

use super::{Error, FileError};

/// An error occurring while opening a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenError {
    /// The index does not name one of the standard streams (0, 1 or 2).
    NotAStandardStream(i32),
    /// The path could not be opened.
    File(FileError),
}

impl Error for OpenError {
    fn raw_os_error(&self) -> i32 {
        match self {
            OpenError::NotAStandardStream(_) => libc::EBADF,
            OpenError::File(error) => error.raw_os_error(),
        }
    }
}

impl From<FileError> for OpenError {
    fn from(error: FileError) -> Self {
        OpenError::File(error)
    }
}

impl From<IoError> for OpenError {
    fn from(error: IoError) -> Self {
        OpenError::File(error.into())
    }
}

impl Display for OpenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("Error during file opening: ")?;
        match self {
            OpenError::NotAStandardStream(index) => {
                write!(f, "Descriptor {} is not a standard stream", index)
            }
            OpenError::File(error) => write!(f, "{}", error),
        }
    }
}

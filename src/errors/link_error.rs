use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::io::Error as IoError;

use super::{Error, FileError};

/// An error occurring while reading the target of a symbolic link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// The path exists but is not a symbolic link.
    NotALink,
    /// The target read from the link was not of the length the link reported.
    ShortRead {
        /// Length of the target as reported by the link's metadata.
        expected: usize,
        /// Number of bytes actually read.
        read: usize,
    },
    /// The link could not be queried.
    File(FileError),
}

impl Error for LinkError {
    fn raw_os_error(&self) -> i32 {
        match self {
            LinkError::NotALink => libc::ENOENT,
            LinkError::ShortRead { .. } => libc::EIO,
            LinkError::File(error) => error.raw_os_error(),
        }
    }
}

impl From<FileError> for LinkError {
    fn from(error: FileError) -> Self {
        LinkError::File(error)
    }
}

impl From<IoError> for LinkError {
    fn from(error: IoError) -> Self {
        LinkError::File(error.into())
    }
}

impl Display for LinkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("Error during reading of link target: ")?;
        match self {
            LinkError::NotALink => write!(f, "The path is not a symbolic link"),
            LinkError::ShortRead { expected, read } => write!(
                f,
                "Expected a target of {} bytes but read {} bytes",
                expected, read
            ),
            LinkError::File(error) => write!(f, "{}", error),
        }
    }
}

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};

use super::{Error, FileError};

/// An error occurring while copying a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyError {
    /// The source is not a regular file or could not be opened.
    Source(FileError),
    /// The destination could not be created.
    Destination(FileError),
    /// Moving the data failed. The partially written destination has been removed.
    Transfer(FileError),
}

impl CopyError {
    /// The underlying failure, regardless of the stage it occurred in.
    pub fn file_error(&self) -> FileError {
        match self {
            CopyError::Source(error) | CopyError::Destination(error) | CopyError::Transfer(error) => {
                *error
            }
        }
    }
}

impl Error for CopyError {
    fn raw_os_error(&self) -> i32 {
        self.file_error().raw_os_error()
    }
}

impl Display for CopyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("Error during file copy: ")?;
        match self {
            CopyError::Source(error) => write!(f, "The source failed ('{}')", error),
            CopyError::Destination(error) => {
                write!(f, "The destination failed ('{}')", error)
            }
            CopyError::Transfer(error) => write!(f, "The transfer failed ('{}')", error),
        }
    }
}

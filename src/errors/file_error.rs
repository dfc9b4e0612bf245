use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::io::{Error as IoError, ErrorKind};

use super::OsError;

/// An error occurring during an operation on a file, its descriptor or its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileError {
    /// The path does not exist or is not the kind of entry the operation works on.
    NotFound,
    /// The path refers to a directory where a file was required.
    IsADirectory,
    /// The entry has the wrong kind for the link variant of an operation, or an argument is malformed.
    InvalidArgument,
    /// The operating system denied access, with the exact reason it gave (`EACCES` or `EPERM`).
    PermissionDenied(OsError),
    /// Any other failure, as reported by the operating system.
    Os(OsError),
}

impl super::Error for FileError {
    fn raw_os_error(&self) -> i32 {
        match self {
            FileError::NotFound => libc::ENOENT,
            FileError::IsADirectory => libc::EISDIR,
            FileError::InvalidArgument => libc::EINVAL,
            FileError::PermissionDenied(error) => error.code(),
            FileError::Os(error) => error.code(),
        }
    }
}

impl FileError {
    /// Build an error from a raw OS error number.
    pub fn from_raw_os_error(code: i32) -> Self {
        match code {
            libc::ENOENT => FileError::NotFound,
            libc::EISDIR => FileError::IsADirectory,
            libc::EACCES | libc::EPERM => FileError::PermissionDenied(OsError::from_raw(code)),
            code => FileError::Os(OsError::from_raw(code)),
        }
    }

    /// Capture the error reported by the most recent failing OS call of this thread.
    pub fn last_os_error() -> Self {
        IoError::last_os_error().into()
    }
}

impl From<IoError> for FileError {
    fn from(error: IoError) -> Self {
        match error.raw_os_error() {
            Some(code) => FileError::from_raw_os_error(code),
            None => match error.kind() {
                ErrorKind::NotFound => FileError::NotFound,
                ErrorKind::PermissionDenied => {
                    FileError::PermissionDenied(OsError::from_raw(libc::EACCES))
                }
                ErrorKind::InvalidInput => FileError::InvalidArgument,
                _ => FileError::Os(OsError::from(&error)),
            },
        }
    }
}

impl From<FileError> for IoError {
    fn from(error: FileError) -> Self {
        IoError::from_raw_os_error(super::Error::raw_os_error(&error))
    }
}

impl Display for FileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FileError::NotFound => write!(f, "No such file"),
            FileError::IsADirectory => write!(f, "The path is a directory"),
            FileError::InvalidArgument => write!(f, "The entry has the wrong kind for this operation"),
            FileError::PermissionDenied(error) => write!(f, "Permission denied ('{}')", error),
            FileError::Os(error) => write!(f, "The operating system failed ('{}')", error),
        }
    }
}

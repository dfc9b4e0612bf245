use std::ffi::{CString, OsStr};
use std::os::raw::c_char;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::errors::FileError;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A path as handed to the kernel. Unlike `Path`, it is guaranteed to be NUL-terminated and free of interior NULs.
pub struct NativePath(CString);

impl NativePath {
    /// Convert any path; interior NUL bytes cannot be passed to the OS and are rejected.
    pub fn new<T: AsRef<Path>>(path: T) -> Result<Self, FileError> {
        CString::new(path.as_ref().as_os_str().as_bytes())
            .map(NativePath)
            .map_err(|_| FileError::InvalidArgument)
    }

    pub fn as_ptr(&self) -> *const c_char {
        self.0.as_ptr()
    }

    pub fn as_path(&self) -> &Path {
        Path::new(OsStr::from_bytes(self.0.as_bytes()))
    }
}

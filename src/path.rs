//! Path resolution and classification of the standard streams.
use std::ffi::{CStr, OsStr};
use std::io::Error as IoError;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::errors::FileError;
use crate::types::StdioHandleType;
use crate::util::retry;
use crate::util::stat::{file_type, stat_fd};
use crate::util::NativePath;

/// The separator between path components.
pub fn path_separator() -> &'static str {
    constants::PATH_SEPARATOR
}

/// The separator, escaped for use inside a string literal.
pub fn escaped_path_separator() -> &'static str {
    constants::ESCAPED_PATH_SEPARATOR
}

/// The separator as a NUL-terminated C string.
pub fn path_separator_c_str() -> &'static CStr {
    CStr::from_bytes_with_nul(constants::PATH_SEPARATOR_C.as_bytes())
        .expect("Separator constant is not NUL-terminated")
}

/// The escaped separator as a NUL-terminated C string.
pub fn escaped_path_separator_c_str() -> &'static CStr {
    CStr::from_bytes_with_nul(constants::ESCAPED_PATH_SEPARATOR_C.as_bytes())
        .expect("Separator constant is not NUL-terminated")
}

/// Checks whether the path is non-empty and starts with the separator.
pub fn is_absolute_path<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .as_os_str()
        .as_bytes()
        .starts_with(constants::PATH_SEPARATOR.as_bytes())
}

/// Resolve all links and relative components into an absolute path.
pub fn canonical_path<P: AsRef<Path>>(path: P) -> Result<PathBuf, FileError> {
    let path = NativePath::new(path)?;
    let resolved = retry(|| {
        let resolved = unsafe { libc::realpath(path.as_ptr(), std::ptr::null_mut()) };
        match resolved.is_null() {
            true => Err(IoError::last_os_error()),
            false => Ok(resolved),
        }
    })?;

    let canonical = unsafe {
        let canonical = PathBuf::from(OsStr::from_bytes(CStr::from_ptr(resolved).to_bytes()));
        libc::free(resolved as *mut libc::c_void);
        canonical
    };
    debug_assert!(is_absolute_path(&canonical));
    Ok(canonical)
}

/// Classify what a standard stream (0, 1 or 2) is connected to.
///
/// # Panics
///
/// Panics if `index` is not a standard stream or the stream cannot be queried.
pub fn stdio_handle_type(index: i32) -> StdioHandleType {
    assert!(
        (libc::STDIN_FILENO..=libc::STDERR_FILENO).contains(&index),
        "Descriptor {} is not a standard stream",
        index
    );
    let stat = stat_fd(index).unwrap_or_else(|error| {
        tracing::error!(fd = index, %error, "querying standard stream failed");
        panic!("Failed stat on file descriptor {}: {}", index, error)
    });

    match file_type(stat.st_mode) {
        libc::S_IFCHR => StdioHandleType::Terminal,
        libc::S_IFIFO => StdioHandleType::Pipe,
        libc::S_IFSOCK => StdioHandleType::Socket,
        libc::S_IFREG => StdioHandleType::RegularFile,
        _ => StdioHandleType::Other,
    }
}

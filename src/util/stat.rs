use std::io::Result as IoResult;
use std::mem::MaybeUninit;
use std::os::unix::io::RawFd;

use super::native_path::NativePath;
use super::retry::retry_check;
use crate::types::Type;

/// Query the metadata of a path, either of the final link itself or of what it points to.
pub fn stat_path(path: &NativePath, follow_links: bool) -> IoResult<libc::stat> {
    let mut buffer = MaybeUninit::<libc::stat>::uninit();
    retry_check(|| unsafe {
        match follow_links {
            true => libc::stat(path.as_ptr(), buffer.as_mut_ptr()),
            false => libc::lstat(path.as_ptr(), buffer.as_mut_ptr()),
        }
    })?;
    Ok(unsafe { buffer.assume_init() })
}

/// Query the metadata of an open descriptor.
pub fn stat_fd(fd: RawFd) -> IoResult<libc::stat> {
    let mut buffer = MaybeUninit::<libc::stat>::uninit();
    retry_check(|| unsafe { libc::fstat(fd, buffer.as_mut_ptr()) })?;
    Ok(unsafe { buffer.assume_init() })
}

pub fn file_type(mode: libc::mode_t) -> libc::mode_t {
    mode & libc::S_IFMT
}

/// Classify a mode; anything but files, directories and links counts as missing.
pub fn classify(mode: libc::mode_t) -> Type {
    match file_type(mode) {
        libc::S_IFREG => Type::File,
        libc::S_IFDIR => Type::Directory,
        libc::S_IFLNK => Type::Link,
        _ => Type::DoesNotExist,
    }
}

use std::io::Result as IoResult;
use std::os::unix::io::RawFd;

use super::retry::retry_check;

/// Who releases the descriptor held by a handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ownership {
    /// The handle closes the descriptor when dropped.
    Owned,
    /// The descriptor is a standard stream and outlives the handle.
    External,
}

/// A raw descriptor owned by exactly one file.
#[derive(Debug, PartialEq, Eq)]
pub struct Handle {
    fd: RawFd,
    ownership: Ownership,
}

impl Handle {
    /// Descriptor value of a closed handle.
    pub const CLOSED: RawFd = -1;

    /// Take ownership of a freshly opened descriptor.
    pub fn owned(fd: RawFd) -> Self {
        Handle {
            fd,
            ownership: Ownership::Owned,
        }
    }

    /// Wrap one of the standard streams without taking ownership.
    pub fn external(fd: RawFd) -> Self {
        Handle {
            fd,
            ownership: Ownership::External,
        }
    }

    pub fn fd(&self) -> RawFd {
        self.fd
    }

    pub fn is_closed(&self) -> bool {
        self.fd == Handle::CLOSED
    }

    /// Release the descriptor. The handle is closed afterwards even if the OS reported an error.
    pub fn close(&mut self) -> IoResult<()> {
        let fd = std::mem::replace(&mut self.fd, Handle::CLOSED);
        retry_check(|| unsafe { libc::close(fd) }).map(|_| ())
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if self.ownership == Ownership::Owned && !self.is_closed() {
            let fd = self.fd;
            if let Err(error) = self.close() {
                tracing::error!(fd, %error, "closing descriptor failed");
            }
        }
    }
}

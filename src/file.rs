use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;

use tracing::{debug, error};

use crate::constants;
use crate::errors::{FileError, OpenError};
use crate::types::OpenMode;
use crate::util::stat::{file_type, stat_fd, stat_path};
use crate::util::{check, retry_check, Handle, NativePath};

/// A file opened directly on an OS descriptor. Every operation is an unbuffered system call.
///
/// Operations other than [`close`](File::close) and [`is_closed`](File::is_closed)
/// require the file to be open and panic otherwise.
#[derive(Debug)]
pub struct File {
    handle: Handle,
}

impl File {
    /// Open a file by path.
    ///
    /// Existing entries other than regular files and character devices are rejected with
    /// [`FileError::IsADirectory`] or [`FileError::NotFound`]. With [`OpenMode::WRITE`] the file is
    /// created if absent and, unless [`OpenMode::TRUNCATE`] is set too, positioned at its end.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<File, OpenError> {
        let path = NativePath::new(path)?;

        if let Ok(stat) = stat_path(&path, true) {
            match file_type(stat.st_mode) {
                libc::S_IFREG | libc::S_IFCHR => {}
                libc::S_IFDIR => return Err(FileError::IsADirectory.into()),
                _ => return Err(FileError::NotFound.into()),
            }
        }

        let mut flags = libc::O_RDONLY;
        if mode.contains(OpenMode::WRITE) {
            flags = libc::O_RDWR | libc::O_CREAT;
        }
        if mode.contains(OpenMode::TRUNCATE) {
            flags |= libc::O_TRUNC;
        }
        flags |= libc::O_CLOEXEC;

        let fd = retry_check(|| unsafe {
            libc::open(path.as_ptr(), flags, constants::CREATION_MODE as libc::c_uint)
        })?;
        let file = File {
            handle: Handle::owned(fd),
        };

        if mode.contains(OpenMode::WRITE) && !mode.contains(OpenMode::TRUNCATE) {
            // Dropping the file on failure releases the descriptor.
            check(unsafe { libc::lseek(fd, 0, libc::SEEK_END) })?;
        }

        debug!(path = %path.as_path().display(), fd, ?mode, "opened file");
        Ok(file)
    }

    /// Wrap one of the standard streams (0, 1 or 2). The stream stays open when the file is dropped.
    pub fn open_standard_stream(index: i32) -> Result<File, OpenError> {
        match index {
            libc::STDIN_FILENO | libc::STDOUT_FILENO | libc::STDERR_FILENO => Ok(File {
                handle: Handle::external(index),
            }),
            _ => Err(OpenError::NotAStandardStream(index)),
        }
    }

    /// Release the descriptor.
    ///
    /// Closing is best effort: an error is logged, and the file counts as closed either way.
    pub fn close(&mut self) {
        let fd = self.fd();
        if let Err(error) = self.handle.close() {
            error!(fd, %error, "closing file failed");
        }
    }

    /// Checks whether the descriptor has been released.
    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    fn fd(&self) -> RawFd {
        assert!(!self.handle.is_closed(), "Operation on a closed file");
        self.handle.fd()
    }

    /// Read up to `buffer.len()` bytes at the current position. Returns 0 at end-of-stream.
    pub fn read(&mut self, buffer: &mut [u8]) -> Result<usize, FileError> {
        let fd = self.fd();
        let size = retry_check(|| unsafe {
            libc::read(fd, buffer.as_mut_ptr() as *mut libc::c_void, buffer.len())
        })?;
        Ok(size as usize)
    }

    /// Write up to `buffer.len()` bytes at the current position.
    ///
    /// A partial write is returned as is; writing the remainder is up to the caller.
    pub fn write(&mut self, buffer: &[u8]) -> Result<usize, FileError> {
        let fd = self.fd();
        let size = retry_check(|| unsafe {
            libc::write(fd, buffer.as_ptr() as *const libc::c_void, buffer.len())
        })?;
        Ok(size as usize)
    }

    /// The current position, queried without moving it.
    pub fn position(&self) -> Result<u64, FileError> {
        let offset = check(unsafe { libc::lseek(self.fd(), 0, libc::SEEK_CUR) })?;
        Ok(offset as u64)
    }

    /// Move to an absolute position.
    pub fn set_position(&mut self, position: u64) -> Result<(), FileError> {
        let offset = to_offset(position)?;
        check(unsafe { libc::lseek(self.fd(), offset, libc::SEEK_SET) })?;
        Ok(())
    }

    /// Set the length of the file, cutting or zero-extending it.
    pub fn truncate(&mut self, length: u64) -> Result<(), FileError> {
        let fd = self.fd();
        let length = to_offset(length)?;
        retry_check(|| unsafe { libc::ftruncate(fd, length) })?;
        Ok(())
    }

    /// Force the data written through this file to durable storage.
    pub fn flush(&mut self) -> Result<(), FileError> {
        let fd = self.fd();
        retry_check(|| unsafe { libc::fsync(fd) })?;
        Ok(())
    }

    /// Size of the open file, including writes not yet flushed.
    pub fn length(&self) -> Result<u64, FileError> {
        Ok(stat_fd(self.fd())?.st_size as u64)
    }
}

fn to_offset(value: u64) -> Result<libc::off_t, FileError> {
    libc::off_t::try_from(value).map_err(|_| FileError::InvalidArgument)
}

impl AsRawFd for File {
    fn as_raw_fd(&self) -> RawFd {
        self.fd()
    }
}

impl Read for File {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        File::read(self, buf).map_err(io::Error::from)
    }
}

impl Write for File {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        File::write(self, buf).map_err(io::Error::from)
    }

    /// Nothing is buffered, so there is nothing to hand over. Use [`File::flush`] for durability.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for File {
    fn seek(&mut self, position: SeekFrom) -> io::Result<u64> {
        let (offset, whence) = match position {
            SeekFrom::Start(offset) => (to_offset(offset)?, libc::SEEK_SET),
            SeekFrom::End(offset) => (offset as libc::off_t, libc::SEEK_END),
            SeekFrom::Current(offset) => (offset as libc::off_t, libc::SEEK_CUR),
        };
        let position = check(unsafe { libc::lseek(self.fd(), offset, whence) })?;
        Ok(position as u64)
    }
}

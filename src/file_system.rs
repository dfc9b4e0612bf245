//! Operations creating, removing, moving and copying entries by path.
use std::ffi::OsString;
use std::io::Result as IoResult;
use std::os::unix::ffi::OsStringExt;
use std::path::{Path, PathBuf};

use tracing::{debug, error, trace, warn};

use crate::constants;
use crate::errors::{CopyError, FileError, LinkError};
use crate::metadata::type_of;
use crate::types::Type;
use crate::util::stat::stat_path;
use crate::util::{retry, retry_check, Handle, NativePath};

/// What a path must classify as before it is mutated, and what to report otherwise.
struct Requirement {
    follow_links: bool,
    expected: Type,
    on_directory: FileError,
    otherwise: FileError,
}

impl Requirement {
    const FILE: Requirement = Requirement {
        follow_links: true,
        expected: Type::File,
        on_directory: FileError::IsADirectory,
        otherwise: FileError::NotFound,
    };

    /// Deletion does not look through a final link.
    const FILE_ITSELF: Requirement = Requirement {
        follow_links: false,
        ..Requirement::FILE
    };

    const LINK: Requirement = Requirement {
        follow_links: false,
        expected: Type::Link,
        on_directory: FileError::IsADirectory,
        otherwise: FileError::InvalidArgument,
    };

    const LINK_FOR_REMOVAL: Requirement = Requirement {
        on_directory: FileError::InvalidArgument,
        ..Requirement::LINK
    };

    fn check(&self, path: &NativePath) -> Result<(), FileError> {
        match type_of(path, self.follow_links) {
            kind if kind == self.expected => Ok(()),
            kind => {
                debug!(path = %path.as_path().display(), ?kind, expected = ?self.expected, "rejected entry");
                match kind {
                    Type::Directory => Err(self.on_directory),
                    _ => Err(self.otherwise),
                }
            }
        }
    }
}

/// Create an empty regular file if absent. An existing file is left untouched.
pub fn create<P: AsRef<Path>>(path: P) -> Result<(), FileError> {
    let path = NativePath::new(path)?;
    let fd = retry_check(|| unsafe {
        libc::open(
            path.as_ptr(),
            libc::O_RDONLY | libc::O_CREAT | libc::O_CLOEXEC,
            constants::CREATION_MODE as libc::c_uint,
        )
    })?;
    Handle::owned(fd).close()?;
    Ok(())
}

/// Create a symbolic link at `path` pointing to `target`. The target need not exist.
pub fn create_link<P: AsRef<Path>, T: AsRef<Path>>(path: P, target: T) -> Result<(), FileError> {
    let path = NativePath::new(path)?;
    let target = NativePath::new(target)?;
    retry_check(|| unsafe { libc::symlink(target.as_ptr(), path.as_ptr()) })?;
    Ok(())
}

/// Remove a regular file. Directories, links and other entries are refused.
pub fn delete<P: AsRef<Path>>(path: P) -> Result<(), FileError> {
    let path = NativePath::new(path)?;
    Requirement::FILE_ITSELF.check(&path)?;
    unlink(&path)?;
    Ok(())
}

/// Remove a symbolic link, never what it points to.
pub fn delete_link<P: AsRef<Path>>(path: P) -> Result<(), FileError> {
    let path = NativePath::new(path)?;
    Requirement::LINK_FOR_REMOVAL.check(&path)?;
    unlink(&path)?;
    Ok(())
}

/// Move a regular file.
pub fn rename<P: AsRef<Path>, Q: AsRef<Path>>(old_path: P, new_path: Q) -> Result<(), FileError> {
    let old_path = NativePath::new(old_path)?;
    let new_path = NativePath::new(new_path)?;
    Requirement::FILE.check(&old_path)?;
    rename_raw(&old_path, &new_path)?;
    Ok(())
}

/// Move a symbolic link.
pub fn rename_link<P: AsRef<Path>, Q: AsRef<Path>>(
    old_path: P,
    new_path: Q,
) -> Result<(), FileError> {
    let old_path = NativePath::new(old_path)?;
    let new_path = NativePath::new(new_path)?;
    Requirement::LINK.check(&old_path)?;
    rename_raw(&old_path, &new_path)?;
    Ok(())
}

/// Read the target a symbolic link points to.
pub fn link_target<P: AsRef<Path>>(path: P) -> Result<PathBuf, LinkError> {
    let path = NativePath::new(path)?;
    let stat = stat_path(&path, false)?;
    if stat.st_mode & libc::S_IFMT != libc::S_IFLNK {
        return Err(LinkError::NotALink);
    }

    // One spare byte detects a target that grew since the query.
    let expected = stat.st_size as usize;
    let mut buffer = vec![0u8; expected + 1];
    let read = retry_check(|| unsafe {
        libc::readlink(
            path.as_ptr(),
            buffer.as_mut_ptr() as *mut libc::c_char,
            buffer.len(),
        )
    })? as usize;
    if read != expected {
        return Err(LinkError::ShortRead { expected, read });
    }

    buffer.truncate(read);
    Ok(PathBuf::from(OsString::from_vec(buffer)))
}

/// Copy a regular file, creating or replacing `new_path` with the permissions of `old_path`.
///
/// If the transfer fails, the partially written destination is removed again.
pub fn copy<P: AsRef<Path>, Q: AsRef<Path>>(old_path: P, new_path: Q) -> Result<(), CopyError> {
    copy_with_chunk_size(old_path, new_path, constants::COPY_CHUNK_SIZE)
}

/// Like [`copy`], moving at most `chunk_size` bytes per transfer call. Zero selects the default.
pub fn copy_with_chunk_size<P: AsRef<Path>, Q: AsRef<Path>>(
    old_path: P,
    new_path: Q,
    chunk_size: usize,
) -> Result<(), CopyError> {
    let chunk_size = match chunk_size {
        0 => constants::COPY_CHUNK_SIZE,
        value => value,
    };
    copy_with_transfer(old_path.as_ref(), new_path.as_ref(), chunk_size, send_file)
}

/// Move up to `count` bytes from `offset` of the source to the destination, advancing `offset`.
fn send_file(
    source: &Handle,
    destination: &Handle,
    offset: &mut libc::off_t,
    count: usize,
) -> IoResult<usize> {
    let sent = crate::util::check(unsafe {
        libc::sendfile(destination.fd(), source.fd(), offset, count)
    })?;
    Ok(sent as usize)
}

fn copy_with_transfer<F>(
    old_path: &Path,
    new_path: &Path,
    chunk_size: usize,
    mut transfer: F,
) -> Result<(), CopyError>
where
    F: FnMut(&Handle, &Handle, &mut libc::off_t, usize) -> IoResult<usize>,
{
    let old_path = NativePath::new(old_path).map_err(CopyError::Source)?;
    let new_path = NativePath::new(new_path).map_err(CopyError::Destination)?;
    Requirement::FILE.check(&old_path).map_err(CopyError::Source)?;

    let stat = stat_path(&old_path, true).map_err(|error| CopyError::Source(error.into()))?;
    // Truncating the destination would empty the source too.
    if let Ok(target) = stat_path(&new_path, true) {
        if (target.st_dev, target.st_ino) == (stat.st_dev, stat.st_ino) {
            debug!(from = %old_path.as_path().display(), to = %new_path.as_path().display(), "refusing to copy a file onto itself");
            return Err(CopyError::Destination(FileError::InvalidArgument));
        }
    }
    let mut source = retry_check(|| unsafe {
        libc::open(old_path.as_ptr(), libc::O_RDONLY | libc::O_CLOEXEC)
    })
    .map(Handle::owned)
    .map_err(|error| CopyError::Source(error.into()))?;
    let mut destination = retry_check(|| unsafe {
        libc::open(
            new_path.as_ptr(),
            libc::O_WRONLY | libc::O_TRUNC | libc::O_CREAT | libc::O_CLOEXEC,
            stat.st_mode as libc::c_uint,
        )
    })
    .map(Handle::owned)
    .map_err(|error| CopyError::Destination(error.into()))?;

    let mut offset: libc::off_t = 0;
    let outcome = loop {
        match retry(|| transfer(&source, &destination, &mut offset, chunk_size)) {
            Ok(0) => break Ok(()),
            Ok(bytes) => trace!(bytes, offset, "transferred chunk"),
            Err(error) => break Err(error),
        }
    };

    if let Err(error) = source.close() {
        warn!(path = %old_path.as_path().display(), %error, "closing copy source failed");
    }
    let outcome = outcome.and_then(|_| destination.close());

    match outcome {
        Ok(()) => {
            debug!(from = %old_path.as_path().display(), to = %new_path.as_path().display(), bytes = offset, "copied file");
            Ok(())
        }
        Err(error) => {
            error!(to = %new_path.as_path().display(), %error, "copy failed, removing destination");
            // Keep the transfer error; cleanup failures are only logged.
            if !destination.is_closed() {
                let _ = destination.close();
            }
            if let Err(cleanup) = unlink(&new_path) {
                warn!(path = %new_path.as_path().display(), error = %cleanup, "removing partial copy failed");
            }
            Err(CopyError::Transfer(error.into()))
        }
    }
}

fn unlink(path: &NativePath) -> IoResult<()> {
    retry_check(|| unsafe { libc::unlink(path.as_ptr()) }).map(|_| ())
}

fn rename_raw(old_path: &NativePath, new_path: &NativePath) -> IoResult<()> {
    retry_check(|| unsafe { libc::rename(old_path.as_ptr(), new_path.as_ptr()) }).map(|_| ())
}

#[cfg(test)]
mod tests {
    use std::io::{Error as IoError, Result as IoResult};
    use std::os::unix::fs::{symlink, PermissionsExt};
    use std::path::Path;

    use tempfile::TempDir;
    use test_case::test_case;

    use super::{
        copy, copy_with_chunk_size, copy_with_transfer, create, create_link, delete, delete_link,
        link_target, rename, rename_link, send_file,
    };
    use crate::errors::{CopyError, FileError, LinkError, OsError};
    use crate::metadata::get_type;
    use crate::types::Type;
    use crate::util::{init_tracing, Handle};

    fn directory() -> TempDir {
        TempDir::new().expect("Unable to create temporary directory")
    }

    fn pattern(size: usize) -> Vec<u8> {
        (0..size).map(|index| (index % 251) as u8).collect()
    }

    #[test]
    fn test_create_is_idempotent() {
        let directory = directory();
        let path = directory.path().join("file");
        create(&path).expect("Creating failed");
        assert_eq!(get_type(&path, false), Type::File);

        std::fs::write(&path, b"keep").expect("Writing failed");
        create(&path).expect("Creating an existing file failed");
        assert_eq!(std::fs::read(&path).expect("Reading failed"), b"keep");

        assert_eq!(create(directory.path()), Err(FileError::IsADirectory));
        assert_eq!(
            create(directory.path().join("missing").join("file")),
            Err(FileError::NotFound)
        );
    }

    #[test]
    fn test_dangling_link() {
        let directory = directory();
        let link = directory.path().join("l");
        create_link(&link, "target-missing").expect("Creating link failed");

        assert_eq!(get_type(&link, false), Type::Link);
        assert_eq!(get_type(&link, true), Type::DoesNotExist);
        assert_eq!(link_target(&link), Ok(Path::new("target-missing").to_path_buf()));

        assert!(create_link(&link, "other").is_err());
    }

    #[test]
    fn test_link_target_of_non_link() {
        let directory = directory();
        let file = directory.path().join("file");
        create(&file).expect("Creating failed");
        assert_eq!(link_target(&file), Err(LinkError::NotALink));
        assert_eq!(link_target(directory.path()), Err(LinkError::NotALink));
        assert_eq!(
            link_target(directory.path().join("missing")),
            Err(LinkError::File(FileError::NotFound))
        );
    }

    #[test]
    fn test_delete() {
        let directory = directory();
        let file = directory.path().join("file");
        let link = directory.path().join("link");
        create(&file).expect("Creating failed");
        symlink(&file, &link).expect("Creating link failed");

        assert_eq!(delete(directory.path()), Err(FileError::IsADirectory));
        assert!(directory.path().is_dir());
        assert_eq!(delete(&link), Err(FileError::NotFound));
        assert_eq!(get_type(&link, false), Type::Link);

        delete(&file).expect("Deleting failed");
        assert_eq!(get_type(&file, false), Type::DoesNotExist);
        assert_eq!(delete(&file), Err(FileError::NotFound));
    }

    #[test]
    fn test_delete_link() {
        let directory = directory();
        let file = directory.path().join("file");
        let link = directory.path().join("link");
        create(&file).expect("Creating failed");
        symlink(&file, &link).expect("Creating link failed");

        assert_eq!(delete_link(&file), Err(FileError::InvalidArgument));
        assert_eq!(delete_link(directory.path()), Err(FileError::InvalidArgument));
        assert_eq!(delete_link(directory.path().join("missing")), Err(FileError::InvalidArgument));

        delete_link(&link).expect("Deleting link failed");
        assert_eq!(get_type(&link, false), Type::DoesNotExist);
        assert_eq!(get_type(&file, false), Type::File);
    }

    #[test]
    fn test_rename() {
        let directory = directory();
        let old = directory.path().join("old");
        let new = directory.path().join("new");
        std::fs::write(&old, b"content").expect("Writing failed");

        rename(&old, &new).expect("Renaming failed");
        assert_eq!(get_type(&old, false), Type::DoesNotExist);
        assert_eq!(std::fs::read(&new).expect("Reading failed"), b"content");

        assert_eq!(rename(&old, &new), Err(FileError::NotFound));
        let sub = directory.path().join("sub");
        std::fs::create_dir(&sub).expect("Creating directory failed");
        assert_eq!(rename(&sub, directory.path().join("moved")), Err(FileError::IsADirectory));
        assert!(sub.is_dir());
    }

    #[test]
    fn test_rename_link() {
        let directory = directory();
        let file = directory.path().join("file");
        let link = directory.path().join("link");
        let moved = directory.path().join("moved");
        create(&file).expect("Creating failed");
        create_link(&link, "file").expect("Creating link failed");

        assert_eq!(rename_link(&file, &moved), Err(FileError::InvalidArgument));
        assert_eq!(rename_link(directory.path(), &moved), Err(FileError::IsADirectory));

        rename_link(&link, &moved).expect("Renaming link failed");
        assert_eq!(get_type(&link, false), Type::DoesNotExist);
        assert_eq!(get_type(&moved, false), Type::Link);
        assert_eq!(link_target(&moved), Ok(Path::new("file").to_path_buf()));
    }

    #[test_case(0, 0; "empty, default chunk")]
    #[test_case(1, 0; "single byte, default chunk")]
    #[test_case(4096, 0; "one page, default chunk")]
    #[test_case(100_000, 0; "larger, default chunk")]
    #[test_case(100_000, 4096; "larger than several chunks")]
    #[test_case(100_001, 7; "uneven chunks")]
    fn test_copy(size: usize, chunk_size: usize) {
        init_tracing();
        let directory = directory();
        let old = directory.path().join("old");
        let new = directory.path().join("new");
        let data = pattern(size);
        std::fs::write(&old, &data).expect("Writing failed");

        copy_with_chunk_size(&old, &new, chunk_size).expect("Copying failed");
        assert_eq!(std::fs::read(&new).expect("Reading failed"), data);
    }

    #[test]
    fn test_copy_replaces_and_keeps_mode() {
        let directory = directory();
        let old = directory.path().join("old");
        let new = directory.path().join("new");
        std::fs::write(&old, b"short").expect("Writing failed");
        std::fs::set_permissions(&old, std::fs::Permissions::from_mode(0o640))
            .expect("Setting permissions failed");
        std::fs::write(&new, b"much longer previous content").expect("Writing failed");

        copy(&old, &new).expect("Copying failed");
        assert_eq!(std::fs::read(&new).expect("Reading failed"), b"short");

        let created = directory.path().join("created");
        copy(&old, &created).expect("Copying failed");
        let mode = std::fs::metadata(&created)
            .expect("Querying failed")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o640 & !umask());
    }

    fn umask() -> u32 {
        let mask = unsafe { libc::umask(0o022) };
        unsafe { libc::umask(mask) };
        mask as u32
    }

    #[test]
    fn test_copy_type_checks() {
        let directory = directory();
        let new = directory.path().join("new");
        assert_eq!(
            copy(directory.path(), &new),
            Err(CopyError::Source(FileError::IsADirectory))
        );
        assert_eq!(
            copy(directory.path().join("missing"), &new),
            Err(CopyError::Source(FileError::NotFound))
        );
        assert_eq!(get_type(&new, false), Type::DoesNotExist);

        let old = directory.path().join("old");
        create(&old).expect("Creating failed");
        assert_eq!(
            copy(&old, directory.path().join("missing").join("new")),
            Err(CopyError::Destination(FileError::NotFound))
        );
    }

    #[test]
    fn test_copy_onto_itself() {
        let directory = directory();
        let old = directory.path().join("old");
        let hard_link = directory.path().join("hard");
        let link = directory.path().join("link");
        std::fs::write(&old, b"precious").expect("Writing failed");
        std::fs::hard_link(&old, &hard_link).expect("Creating hard link failed");
        symlink(&old, &link).expect("Creating link failed");

        for destination in [&old, &hard_link, &link] {
            assert_eq!(
                copy(&old, destination),
                Err(CopyError::Destination(FileError::InvalidArgument))
            );
        }
        assert_eq!(
            copy(&link, &old),
            Err(CopyError::Destination(FileError::InvalidArgument))
        );
        assert_eq!(std::fs::read(&old).expect("Reading failed"), b"precious");
        assert_eq!(get_type(&link, false), Type::Link);
    }

    #[test]
    fn test_link_target_short_read() {
        // Links below /proc report a size of zero.
        assert_eq!(
            link_target("/proc/self/cwd"),
            Err(LinkError::ShortRead { expected: 0, read: 1 })
        );
    }

    #[test]
    fn test_copy_failure_removes_destination() {
        init_tracing();
        let directory = directory();
        let old = directory.path().join("old");
        let new = directory.path().join("new");
        std::fs::write(&old, pattern(10_000)).expect("Writing failed");

        let mut calls = 0;
        let result = copy_with_transfer(
            &old,
            &new,
            1024,
            |source: &Handle, destination: &Handle, offset: &mut libc::off_t, count: usize| -> IoResult<usize> {
                calls += 1;
                match calls {
                    1 | 2 => send_file(source, destination, offset, count),
                    _ => Err(IoError::from_raw_os_error(libc::ENOSPC)),
                }
            },
        );

        assert_eq!(
            result,
            Err(CopyError::Transfer(FileError::Os(OsError::from_raw(libc::ENOSPC))))
        );
        assert_eq!(get_type(&new, false), Type::DoesNotExist);
        assert_eq!(get_type(&old, false), Type::File);
    }

    #[test]
    fn test_copy_retries_interrupted_transfers() {
        let directory = directory();
        let old = directory.path().join("old");
        let new = directory.path().join("new");
        std::fs::write(&old, b"abc").expect("Writing failed");

        let mut interrupted = false;
        copy_with_transfer(&old, &new, 1, |source: &Handle, destination: &Handle, offset: &mut libc::off_t, count: usize| {
            if !interrupted {
                interrupted = true;
                return Err(IoError::from_raw_os_error(libc::EINTR));
            }
            send_file(source, destination, offset, count)
        })
        .expect("Copying failed");
        assert_eq!(std::fs::read(&new).expect("Reading failed"), b"abc");
    }
}

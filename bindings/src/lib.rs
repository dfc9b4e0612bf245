#![allow(clippy::missing_safety_doc)] // Well, using C-pointers *is* unsafe...

use std::cell::RefCell;
use std::ffi::{CStr, CString, OsStr};
use std::os::raw::{c_char, c_int};
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::Path;
use std::ptr::{null, null_mut};

use rawfile::errors::{CopyError, Error, FileError, LinkError, OpenError, OsError};
use rawfile::{File, IdentityResult, OpenMode, StatSnapshot, Type};

/// Slot of the entry type in the array filled by `RawFileStat`.
pub const RAWFILE_STAT_TYPE: usize = 0;
/// Slot of the status change time in the array filled by `RawFileStat`.
pub const RAWFILE_STAT_CREATED_TIME: usize = 1;
/// Slot of the modification time in the array filled by `RawFileStat`.
pub const RAWFILE_STAT_MODIFIED_TIME: usize = 2;
/// Slot of the access time in the array filled by `RawFileStat`.
pub const RAWFILE_STAT_ACCESSED_TIME: usize = 3;
/// Slot of the mode bits in the array filled by `RawFileStat`.
pub const RAWFILE_STAT_MODE: usize = 4;
/// Slot of the size in the array filled by `RawFileStat`.
pub const RAWFILE_STAT_SIZE: usize = 5;
/// Number of slots of the array filled by `RawFileStat`.
pub const RAWFILE_STAT_LENGTH: usize = 6;

struct LastError {
    code: c_int,
    message: CString,
}

thread_local! {
    static LAST_ERROR: RefCell<Option<LastError>> = RefCell::new(None);
}

struct Environment;

impl Environment {
    pub fn fail<E: Error>(error: &E) {
        let code = error.raw_os_error();
        let message = CString::new(error.error_message()).unwrap_or_default();
        tracing::debug!(code, message = %error, "call failed");
        LAST_ERROR.with(|last| *last.borrow_mut() = Some(LastError { code, message }));
    }

    pub fn execute<T, E: Error, C: FnOnce() -> Result<T, E>>(body: C) -> *mut T {
        match body() {
            Ok(value) => Box::into_raw(Box::new(value)),
            Err(error) => {
                Environment::fail(&error);
                null_mut()
            }
        }
    }

    pub fn execute_flag<E: Error, C: FnOnce() -> Result<(), E>>(body: C) -> c_int {
        match body() {
            Ok(()) => 1,
            Err(error) => {
                Environment::fail(&error);
                0
            }
        }
    }

    pub fn execute_count<E: Error, C: FnOnce() -> Result<i64, E>>(body: C) -> i64 {
        match body() {
            Ok(value) => value,
            Err(error) => {
                Environment::fail(&error);
                -1
            }
        }
    }

    pub fn execute_string<E: Error, C: FnOnce() -> Result<Vec<u8>, E>>(body: C) -> *mut c_char {
        match body().map(CString::new) {
            Ok(Ok(value)) => value.into_raw(),
            Ok(Err(_)) => {
                Environment::fail(&FileError::InvalidArgument);
                null_mut()
            }
            Err(error) => {
                Environment::fail(&error);
                null_mut()
            }
        }
    }

    pub fn parse_path<'a>(c_string: *const c_char) -> Result<&'a Path, FileError> {
        (!c_string.is_null())
            .then(|| unsafe { CStr::from_ptr(c_string) })
            .map(|raw_str| Path::new(OsStr::from_bytes(raw_str.to_bytes())))
            .ok_or(FileError::InvalidArgument)
    }

    pub fn open_file<'a>(file: *mut RawFile) -> Result<&'a mut File, FileError> {
        match unsafe { file.as_mut() } {
            Some(RawFile(file)) if !file.is_closed() => Ok(file),
            Some(_) => Err(FileError::Os(OsError::from_raw(libc::EBADF))),
            None => Err(FileError::InvalidArgument),
        }
    }

    pub fn destroy<T>(pointer: *mut T) {
        if pointer.is_null() {
            return;
        }
        unsafe {
            drop(Box::from_raw(pointer));
        }
    }
}

fn flag(value: bool) -> c_int {
    match value {
        true => 1,
        false => 0,
    }
}

/// A file opened on an OS descriptor.
pub struct RawFile(File);

/// Open a file.
///
/// @param path The path of the file.
///
/// @param mode 0 to read, or a combination of 1 (write, creating the file and appending) and 2 (truncate).
///
/// @return A pointer to the file or nullptr on failure (see RawFileLastError).
#[no_mangle]
pub unsafe extern "C" fn RawFileOpen(path: *const c_char, mode: c_int) -> *mut RawFile {
    Environment::execute(|| -> Result<RawFile, OpenError> {
        let path = Environment::parse_path(path)?;
        let mode = u32::try_from(mode)
            .ok()
            .and_then(OpenMode::from_bits)
            .ok_or(FileError::InvalidArgument)?;
        File::open(path, mode).map(RawFile)
    })
}

/// Wrap a standard stream. Destroying the file leaves the stream open.
///
/// @param index 0, 1 or 2.
///
/// @return A pointer to the file or nullptr on failure.
#[no_mangle]
pub unsafe extern "C" fn RawFileOpenStdio(index: c_int) -> *mut RawFile {
    Environment::execute(|| File::open_standard_stream(index).map(RawFile))
}

/// Close the descriptor of a file. The file still needs to be destroyed.
///
/// @param file The file. Passing nullptr or a closed file records an error.
#[no_mangle]
pub unsafe extern "C" fn RawFileClose(file: *mut RawFile) {
    match Environment::open_file(file) {
        Ok(file) => file.close(),
        Err(error) => Environment::fail(&error),
    }
}

/// Checks whether a file has been closed.
///
/// @return 1 if closed (or nullptr), 0 otherwise.
#[no_mangle]
pub unsafe extern "C" fn RawFileIsClosed(file: *const RawFile) -> c_int {
    flag(file.as_ref().map(|file| file.0.is_closed()).unwrap_or(true))
}

/// Destroy a file, closing it unless it wraps a standard stream.
///
/// @param file The file. Passing nullptr is a safe no-op.
#[no_mangle]
pub unsafe extern "C" fn RawFileDestroy(file: *mut RawFile) {
    Environment::destroy(file)
}

/// Read at the current position.
///
/// @return The number of bytes read (0 at end of file) or -1 on failure.
#[no_mangle]
pub unsafe extern "C" fn RawFileRead(file: *mut RawFile, buffer: *mut u8, length: i64) -> i64 {
    Environment::execute_count(|| {
        let file = Environment::open_file(file)?;
        let length = usize::try_from(length).map_err(|_| FileError::InvalidArgument)?;
        if buffer.is_null() {
            return Err(FileError::InvalidArgument);
        }
        let buffer = std::slice::from_raw_parts_mut(buffer, length);
        file.read(buffer).map(|size| size as i64)
    })
}

/// Write at the current position. Partial writes are possible.
///
/// @return The number of bytes written or -1 on failure.
#[no_mangle]
pub unsafe extern "C" fn RawFileWrite(file: *mut RawFile, buffer: *const u8, length: i64) -> i64 {
    Environment::execute_count(|| {
        let file = Environment::open_file(file)?;
        let length = usize::try_from(length).map_err(|_| FileError::InvalidArgument)?;
        if buffer.is_null() {
            return Err(FileError::InvalidArgument);
        }
        let buffer = std::slice::from_raw_parts(buffer, length);
        file.write(buffer).map(|size| size as i64)
    })
}

/// @return The current position or -1 on failure.
#[no_mangle]
pub unsafe extern "C" fn RawFilePosition(file: *mut RawFile) -> i64 {
    Environment::execute_count(|| {
        let file = Environment::open_file(file)?;
        file.position().map(|position| position as i64)
    })
}

/// Move to an absolute position.
///
/// @return 1 on success, 0 otherwise.
#[no_mangle]
pub unsafe extern "C" fn RawFileSetPosition(file: *mut RawFile, position: i64) -> c_int {
    Environment::execute_flag(|| {
        let file = Environment::open_file(file)?;
        let position = u64::try_from(position).map_err(|_| FileError::InvalidArgument)?;
        file.set_position(position)
    })
}

/// Set the length of a file.
///
/// @return 1 on success, 0 otherwise.
#[no_mangle]
pub unsafe extern "C" fn RawFileTruncate(file: *mut RawFile, length: i64) -> c_int {
    Environment::execute_flag(|| {
        let file = Environment::open_file(file)?;
        let length = u64::try_from(length).map_err(|_| FileError::InvalidArgument)?;
        file.truncate(length)
    })
}

/// Force written data to durable storage.
///
/// @return 1 on success, 0 otherwise.
#[no_mangle]
pub unsafe extern "C" fn RawFileFlush(file: *mut RawFile) -> c_int {
    Environment::execute_flag(|| Environment::open_file(file)?.flush())
}

/// @return The size of an open file or -1 on failure.
#[no_mangle]
pub unsafe extern "C" fn RawFileLength(file: *mut RawFile) -> i64 {
    Environment::execute_count(|| {
        let file = Environment::open_file(file)?;
        file.length().map(|length| length as i64)
    })
}

/// @return 1 if the path resolves to a regular file, 0 otherwise.
#[no_mangle]
pub unsafe extern "C" fn RawFileExists(path: *const c_char) -> c_int {
    flag(Environment::parse_path(path).map(rawfile::exists).unwrap_or(false))
}

/// Create an empty file if absent.
///
/// @return 1 on success, 0 otherwise.
#[no_mangle]
pub unsafe extern "C" fn RawFileCreate(path: *const c_char) -> c_int {
    Environment::execute_flag(|| rawfile::create(Environment::parse_path(path)?))
}

/// Create a symbolic link at path pointing to target.
///
/// @return 1 on success, 0 otherwise.
#[no_mangle]
pub unsafe extern "C" fn RawFileCreateLink(path: *const c_char, target: *const c_char) -> c_int {
    Environment::execute_flag(|| {
        rawfile::create_link(
            Environment::parse_path(path)?,
            Environment::parse_path(target)?,
        )
    })
}

/// Delete a regular file.
///
/// @return 1 on success, 0 otherwise (EISDIR for directories, ENOENT for anything else).
#[no_mangle]
pub unsafe extern "C" fn RawFileDelete(path: *const c_char) -> c_int {
    Environment::execute_flag(|| rawfile::delete(Environment::parse_path(path)?))
}

/// Delete a symbolic link.
///
/// @return 1 on success, 0 otherwise (EINVAL if the path is no link).
#[no_mangle]
pub unsafe extern "C" fn RawFileDeleteLink(path: *const c_char) -> c_int {
    Environment::execute_flag(|| rawfile::delete_link(Environment::parse_path(path)?))
}

/// Rename a regular file.
///
/// @return 1 on success, 0 otherwise.
#[no_mangle]
pub unsafe extern "C" fn RawFileRename(old_path: *const c_char, new_path: *const c_char) -> c_int {
    Environment::execute_flag(|| {
        rawfile::rename(
            Environment::parse_path(old_path)?,
            Environment::parse_path(new_path)?,
        )
    })
}

/// Rename a symbolic link.
///
/// @return 1 on success, 0 otherwise.
#[no_mangle]
pub unsafe extern "C" fn RawFileRenameLink(
    old_path: *const c_char,
    new_path: *const c_char,
) -> c_int {
    Environment::execute_flag(|| {
        rawfile::rename_link(
            Environment::parse_path(old_path)?,
            Environment::parse_path(new_path)?,
        )
    })
}

/// Copy a regular file. On failure no partial destination remains.
///
/// @return 1 on success, 0 otherwise.
#[no_mangle]
pub unsafe extern "C" fn RawFileCopy(old_path: *const c_char, new_path: *const c_char) -> c_int {
    Environment::execute_flag(|| {
        let old_path = Environment::parse_path(old_path).map_err(CopyError::Source)?;
        let new_path =
            Environment::parse_path(new_path).map_err(CopyError::Destination)?;
        rawfile::copy(old_path, new_path)
    })
}

/// @return The size of the entry at path or -1 on failure.
#[no_mangle]
pub unsafe extern "C" fn RawFileLengthFromPath(path: *const c_char) -> i64 {
    Environment::execute_count(|| {
        rawfile::length_from_path(Environment::parse_path(path)?).map(|length| length as i64)
    })
}

/// @return The modification time in seconds since the Unix epoch or -1 on failure.
#[no_mangle]
pub unsafe extern "C" fn RawFileLastModified(path: *const c_char) -> i64 {
    Environment::execute_count(|| rawfile::last_modified(Environment::parse_path(path)?))
}

/// Query the metadata of a path.
///
/// @param data An array of RAWFILE_STAT_LENGTH elements. If the path cannot be queried, only the type slot is set.
#[no_mangle]
pub unsafe extern "C" fn RawFileStat(path: *const c_char, data: *mut i64) {
    let data = match data.is_null() {
        true => return,
        false => std::slice::from_raw_parts_mut(data, RAWFILE_STAT_LENGTH),
    };
    let snapshot = match Environment::parse_path(path) {
        Ok(path) => rawfile::stat(path),
        Err(_) => StatSnapshot::does_not_exist(),
    };

    data[RAWFILE_STAT_TYPE] = snapshot.kind as i64;
    if snapshot.exists() {
        data[RAWFILE_STAT_CREATED_TIME] = snapshot.created;
        data[RAWFILE_STAT_MODIFIED_TIME] = snapshot.modified;
        data[RAWFILE_STAT_ACCESSED_TIME] = snapshot.accessed;
        data[RAWFILE_STAT_MODE] = snapshot.mode as i64;
        data[RAWFILE_STAT_SIZE] = snapshot.size;
    }
}

/// Read the target of a symbolic link.
///
/// @return The target, to be freed with RawFileDestroyString, or nullptr on failure.
#[no_mangle]
pub unsafe extern "C" fn RawFileLinkTarget(path: *const c_char) -> *mut c_char {
    Environment::execute_string(|| -> Result<Vec<u8>, LinkError> {
        let path = Environment::parse_path(path)?;
        rawfile::link_target(path).map(|target| target.into_os_string().into_vec())
    })
}

/// Classify a path.
///
/// @return 0 file, 1 directory, 2 link, 3 does not exist.
#[no_mangle]
pub unsafe extern "C" fn RawFileGetType(path: *const c_char, follow_links: c_int) -> c_int {
    let kind = match Environment::parse_path(path) {
        Ok(path) => rawfile::get_type(path, follow_links != 0),
        Err(_) => Type::DoesNotExist,
    };
    kind as c_int
}

/// Compare the storage identity of two paths without following final links.
///
/// @return 0 different, 1 identical, 2 error.
#[no_mangle]
pub unsafe extern "C" fn RawFileAreIdentical(first: *const c_char, second: *const c_char) -> c_int {
    match (Environment::parse_path(first), Environment::parse_path(second)) {
        (Ok(first), Ok(second)) => rawfile::are_identical(first, second) as c_int,
        _ => IdentityResult::Error as c_int,
    }
}

/// @return 1 if the path is absolute, 0 otherwise (including nullptr).
#[no_mangle]
pub unsafe extern "C" fn RawFileIsAbsolutePath(path: *const c_char) -> c_int {
    flag(
        Environment::parse_path(path)
            .map(rawfile::is_absolute_path)
            .unwrap_or(false),
    )
}

/// Resolve all links and relative components.
///
/// @return The absolute path, to be freed with RawFileDestroyString, or nullptr on failure.
#[no_mangle]
pub unsafe extern "C" fn RawFileGetCanonicalPath(path: *const c_char) -> *mut c_char {
    Environment::execute_string(|| {
        let path = Environment::parse_path(path)?;
        rawfile::canonical_path(path).map(|path| path.into_os_string().into_vec())
    })
}

/// @return The path separator. Owned by the library.
#[no_mangle]
pub extern "C" fn RawFilePathSeparator() -> *const c_char {
    rawfile::path_separator_c_str().as_ptr()
}

/// @return The path separator escaped for string literals. Owned by the library.
#[no_mangle]
pub extern "C" fn RawFileEscapedPathSeparator() -> *const c_char {
    rawfile::escaped_path_separator_c_str().as_ptr()
}

/// Classify a standard stream.
///
/// @return 0 terminal, 1 pipe, 2 file, 3 socket, 4 other, or -1 if index is no standard stream.
#[no_mangle]
pub extern "C" fn RawFileGetStdioHandleType(index: c_int) -> c_int {
    match index {
        0..=2 => rawfile::stdio_handle_type(index) as c_int,
        _ => {
            Environment::fail(&OpenError::NotAStandardStream(index));
            -1
        }
    }
}

/// Free a string returned by this library.
///
/// @param string The string. Passing nullptr is a safe no-op.
#[no_mangle]
pub unsafe extern "C" fn RawFileDestroyString(string: *mut c_char) {
    if !string.is_null() {
        drop(CString::from_raw(string));
    }
}

/// The OS error number recorded by the most recent failing call on this thread.
///
/// @return The error number or 0 if no call failed yet.
#[no_mangle]
pub extern "C" fn RawFileLastError() -> c_int {
    LAST_ERROR.with(|last| last.borrow().as_ref().map(|error| error.code).unwrap_or(0))
}

/// A description of the most recent failure on this thread.
///
/// @return The message, valid until the next failing call on this thread, or nullptr if no call failed yet.
#[no_mangle]
pub extern "C" fn RawFileLastErrorMessage() -> *const c_char {
    LAST_ERROR.with(|last| {
        last.borrow()
            .as_ref()
            .map(|error| error.message.as_ptr())
            .unwrap_or(null())
    })
}

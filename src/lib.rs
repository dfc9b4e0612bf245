//! This crate provides unbuffered file and path operations directly on Linux descriptors.
//!
//! Every operation is a synchronous system call. Calls interrupted by a signal are
//! reissued transparently; all other failures are reported as typed errors.
#![deny(missing_docs)]

pub mod errors;
mod file;
pub mod file_system;
pub mod metadata;
pub mod path;
pub mod types;
mod util;

pub use self::file::File;
pub use self::file_system::{
    copy, copy_with_chunk_size, create, create_link, delete, delete_link, link_target, rename,
    rename_link,
};
pub use self::metadata::{
    are_identical, exists, get_type, last_modified, length_from_path, stat,
};
pub use self::path::{
    canonical_path, escaped_path_separator, escaped_path_separator_c_str, is_absolute_path,
    path_separator, path_separator_c_str, stdio_handle_type,
};
pub use self::types::{IdentityResult, OpenMode, StatSnapshot, StdioHandleType, Type};

mod constants {
    use const_format::concatcp;

    pub const PATH_SEPARATOR: &str = "/";
    // A slash needs no escaping inside a string literal.
    pub const ESCAPED_PATH_SEPARATOR: &str = PATH_SEPARATOR;
    /// NUL-terminated forms for handing out to C.
    pub const PATH_SEPARATOR_C: &str = concatcp!(PATH_SEPARATOR, "\0");
    pub const ESCAPED_PATH_SEPARATOR_C: &str = concatcp!(ESCAPED_PATH_SEPARATOR, "\0");

    /// Permissions of newly created files before the umask applies.
    pub const CREATION_MODE: u32 = 0o666;

    /// Upper bound of bytes moved by one transfer call while copying.
    pub const COPY_CHUNK_SIZE: usize = u32::MAX as usize;
}

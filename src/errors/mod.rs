//! Various errors occurring while operating on files and paths.

use std::fmt::{Debug, Display};

mod os_error;

mod copy_error;
mod file_error;
mod link_error;
mod open_error;

pub use self::copy_error::CopyError;
pub use self::file_error::FileError;
pub use self::link_error::LinkError;
pub use self::open_error::OpenError;
pub use self::os_error::OsError;

/// An error occurring while accessing the file system.
pub trait Error: PartialEq + Debug + Display {
    /// Generate a human-readable version of the error.
    fn error_message(&self) -> String {
        format!("{}", &self)
    }

    /// The raw OS error number equivalent to this error, as it would have been reported by the platform.
    fn raw_os_error(&self) -> i32;
}

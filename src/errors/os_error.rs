use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::io::Error as IoError;

/// An error raised and described by the operating system.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct OsError {
    code: i32,
}

impl OsError {
    /// Message returned if the platform does not describe an error.
    pub const MISSING_MESSAGE: &'static str = "<Unknown OS error>";

    /// Wrap a raw OS error number.
    pub const fn from_raw(code: i32) -> Self {
        OsError { code }
    }

    /// The raw OS error number.
    pub fn code(&self) -> i32 {
        self.code
    }

    fn message(&self) -> String {
        let message = IoError::from_raw_os_error(self.code).to_string();
        match message.is_empty() {
            true => String::from(OsError::MISSING_MESSAGE),
            false => message,
        }
    }
}

impl Debug for OsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "'{}' (errno {})", self.message(), self.code)
    }
}

impl Display for OsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.message())
    }
}

impl From<&IoError> for OsError {
    fn from(error: &IoError) -> Self {
        OsError::from_raw(error.raw_os_error().unwrap_or(libc::EIO))
    }
}

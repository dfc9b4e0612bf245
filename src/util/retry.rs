use std::io::{Error as IoError, ErrorKind, Result as IoResult};

/// Return values of raw libc calls which signal failure with `-1`.
pub trait Signed: Copy + PartialEq {
    const FAILURE: Self;
}

macro_rules! impl_signed {
    ($($t:ident)*) => ($(impl Signed for $t { const FAILURE: Self = -1; })*)
}

impl_signed! { i32 i64 isize }

/// Convert the `-1` convention of libc into a `Result` carrying `errno`.
pub fn check<T: Signed>(value: T) -> IoResult<T> {
    match value == T::FAILURE {
        true => Err(IoError::last_os_error()),
        false => Ok(value),
    }
}

/// Repeat a call as long as it was interrupted by a signal and return the first other outcome unchanged.
pub fn retry<T, F>(mut call: F) -> IoResult<T>
where
    F: FnMut() -> IoResult<T>,
{
    loop {
        match call() {
            Err(error) if error.kind() == ErrorKind::Interrupted => {
                // Just try again...
            }
            result => return result,
        }
    }
}

/// Shorthand for the common "call libc, retry on EINTR, convert -1" sequence.
pub fn retry_check<T: Signed, F>(mut call: F) -> IoResult<T>
where
    F: FnMut() -> T,
{
    retry(|| check(call()))
}

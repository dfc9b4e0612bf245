mod handle;
mod native_path;
mod retry;
pub mod stat;

pub use self::handle::Handle;
pub use self::native_path::NativePath;
pub use self::retry::{check, retry, retry_check};

#[cfg(test)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

//! Queries on paths: existence, classification, timestamps, sizes and storage identity.
//!
//! None of these need an open [`File`](crate::File); each one issues a fresh
//! metadata query, so results are never cached between calls.
use std::path::Path;

use crate::errors::FileError;
use crate::types::{IdentityResult, StatSnapshot, Type};
use crate::util::stat::{classify, stat_path};
use crate::util::NativePath;

/// Checks whether the path resolves, following links, to a regular file.
///
/// Directories and other entries yield `false` even though they exist.
pub fn exists<P: AsRef<Path>>(path: P) -> bool {
    NativePath::new(path)
        .ok()
        .and_then(|path| stat_path(&path, true).ok())
        .map(|stat| classify(stat.st_mode) == Type::File)
        .unwrap_or(false)
}

/// Classify a path, either following or not following a final symbolic link.
///
/// Any failure of the query is reported as [`Type::DoesNotExist`].
pub fn get_type<P: AsRef<Path>>(path: P, follow_links: bool) -> Type {
    match NativePath::new(path) {
        Ok(path) => type_of(&path, follow_links),
        Err(_) => Type::DoesNotExist,
    }
}

pub(crate) fn type_of(path: &NativePath, follow_links: bool) -> Type {
    match stat_path(path, follow_links) {
        Ok(stat) => classify(stat.st_mode),
        Err(_) => Type::DoesNotExist,
    }
}

pub(crate) fn snapshot(stat: &libc::stat) -> StatSnapshot {
    StatSnapshot {
        kind: classify(stat.st_mode),
        created: stat.st_ctime as i64,
        modified: stat.st_mtime as i64,
        accessed: stat.st_atime as i64,
        mode: stat.st_mode as u32,
        size: stat.st_size as i64,
    }
}

/// Take a snapshot of the metadata of a path, following links.
///
/// If the path cannot be queried, only `kind` is meaningful and is [`Type::DoesNotExist`].
pub fn stat<P: AsRef<Path>>(path: P) -> StatSnapshot {
    NativePath::new(path)
        .ok()
        .and_then(|path| stat_path(&path, true).ok())
        .map(|stat| snapshot(&stat))
        .unwrap_or_else(StatSnapshot::does_not_exist)
}

/// Modification time of the path in seconds since the Unix epoch.
pub fn last_modified<P: AsRef<Path>>(path: P) -> Result<i64, FileError> {
    let path = NativePath::new(path)?;
    Ok(stat_path(&path, true)?.st_mtime as i64)
}

/// Size of the entry the path resolves to, without opening it.
pub fn length_from_path<P: AsRef<Path>>(path: P) -> Result<u64, FileError> {
    let path = NativePath::new(path)?;
    Ok(stat_path(&path, true)?.st_size as u64)
}

/// Compare the storage identity (device and inode) of two paths without following final links.
pub fn are_identical<P: AsRef<Path>, Q: AsRef<Path>>(first: P, second: Q) -> IdentityResult {
    let query = |path: &Path| {
        NativePath::new(path)
            .ok()
            .and_then(|path| stat_path(&path, false).ok())
            .map(|stat| (stat.st_dev, stat.st_ino))
    };

    match (query(first.as_ref()), query(second.as_ref())) {
        (Some(first), Some(second)) if first == second => IdentityResult::Identical,
        (Some(_), Some(_)) => IdentityResult::Different,
        _ => IdentityResult::Error,
    }
}

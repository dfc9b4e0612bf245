//! Plain values exchanged with the file and path operations.
use bitflags::bitflags;

/// The kind of entry a path refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Type {
    /// A regular file.
    File = 0,
    /// A directory.
    Directory = 1,
    /// A symbolic link.
    Link = 2,
    /// Nothing, or an entry of a kind not handled here (device, pipe, socket).
    DoesNotExist = 3,
}

bitflags! {
    /// How a file is opened. The empty set opens for reading only.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct OpenMode: u32 {
        /// Read and write, creating the file if absent. Without `TRUNCATE`, writes append.
        const WRITE = 1 << 0;
        /// Discard the existing content on open.
        const TRUNCATE = 1 << 1;
    }
}

impl OpenMode {
    /// Read-only access.
    pub const READ: OpenMode = OpenMode::empty();
}

impl Default for OpenMode {
    fn default() -> Self {
        OpenMode::READ
    }
}

/// The metadata of a path, taken by a single query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatSnapshot {
    /// Kind of the entry. Check it before reading the remaining fields.
    pub kind: Type,
    /// Status change time in seconds since the Unix epoch.
    pub created: i64,
    /// Modification time in seconds since the Unix epoch.
    pub modified: i64,
    /// Access time in seconds since the Unix epoch.
    pub accessed: i64,
    /// Raw mode bits including the file type.
    pub mode: u32,
    /// Size in bytes.
    pub size: i64,
}

impl StatSnapshot {
    /// The snapshot of a path that could not be queried.
    pub const fn does_not_exist() -> Self {
        StatSnapshot {
            kind: Type::DoesNotExist,
            created: 0,
            modified: 0,
            accessed: 0,
            mode: 0,
            size: 0,
        }
    }

    /// Whether the query succeeded.
    pub fn exists(&self) -> bool {
        self.kind != Type::DoesNotExist
    }
}

/// Whether two paths share the same underlying storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum IdentityResult {
    /// Different device or inode.
    Different = 0,
    /// Same device and inode.
    Identical = 1,
    /// At least one of the paths could not be queried.
    Error = 2,
}

/// What a standard stream is connected to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum StdioHandleType {
    /// A character device such as a terminal.
    Terminal = 0,
    /// A pipe or FIFO.
    Pipe = 1,
    /// A regular file.
    RegularFile = 2,
    /// A socket.
    Socket = 3,
    /// Anything else.
    Other = 4,
}

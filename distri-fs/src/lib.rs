//! # Distri virtual filesystem
//!
//! A hierarchical key-value filesystem simulating POSIX-like files,
//! directories, and a reserved artifact namespace over a pluggable record
//! store. One store exists per project id; the SQLite-backed store persists
//! across runs, and the in-memory store offers identical semantics where no
//! database is wanted (tests, ephemeral sessions).
//!
//! The engine exposes the operations the in-page editor's file tools call:
//! reads with optional remote refresh, writes with ancestor auto-creation,
//! SEARCH/REPLACE diff patching, directory listing and tree reconstruction,
//! regex search, and artifact management.

pub mod diff;
pub mod error;
pub mod filesystem;
pub mod paths;
pub mod record;
pub mod store;

pub use error::{FsError, FsResult};
pub use filesystem::{FilesystemRegistry, ProjectFilesystem, RemoteFetcher, RemoteFile};
pub use record::{
    ArtifactSlice, DirectoryTreeNode, EntryKind, FileInfo, FileMatches, FileRecord,
    ReadFileResult, SearchMatch,
};
pub use store::{MemoryStore, RecordStore, SqliteStore};

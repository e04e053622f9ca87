//! Content-addressed object storage for twig.
//!
//! This crate implements a hash-keyed object store analogous to git's
//! `.git/objects/` directory. Blobs and commits are stored as immutable
//! objects identified by their BLAKE3 hash (domain-separated by object kind).
//!
//! # Object Types
//!
//! - [`Blob`] -- one file's content at stage time
//! - [`Commit`] -- a snapshot of the whole tracked tree plus parent links
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsObjectStore`] -- one file per object under `.twig/objects/`
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written. The store never updates or deletes.
//! 2. Ids are recomputed on read; a mismatch is reported as corruption.
//! 3. Reading an id that was never written is an error, not an empty value.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod memory;
pub mod object;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use fs::{write_atomic, CommitIndex, FsObjectStore};
pub use memory::InMemoryObjectStore;
pub use object::{Blob, Commit, FileMap, ObjectKind, StoredObject};
pub use traits::ObjectStore;

//! Reference management for twig.
//!
//! This crate provides the named pointers that make history navigable:
//! branches, which map a name to a commit id, and HEAD, which names the
//! current branch. HEAD always names a branch; there is no detached state.
//!
//! # Modules
//!
//! - [`error`] Error types for ref operations
//! - [`traits`] The [`RefStore`] trait defining the storage interface
//! - [`names`] Branch name validation
//! - [`memory`] In-memory [`InMemoryRefStore`] for tests
//! - [`fs`] [`FsRefStore`], one file per branch under `.twig/refs/heads/`

pub mod error;
pub mod fs;
pub mod memory;
pub mod names;
pub mod traits;

pub use error::{RefError, Result};
pub use fs::FsRefStore;
pub use memory::InMemoryRefStore;
pub use names::validate_branch_name;
pub use traits::RefStore;

//! Foundation types for twig.
//!
//! Every other twig crate depends on `twig-types`. It defines how objects are
//! named: an [`ObjectId`] is the BLAKE3 hash of an object's logical fields,
//! computed by a domain-separated [`ContentHasher`].
//!
//! # Key Types
//!
//! - [`ObjectId`]: Content-addressed identifier (BLAKE3 hash)
//! - [`ContentHasher`]: Field-framed, domain-separated hasher

pub mod error;
pub mod hasher;
pub mod object;

pub use error::TypeError;
pub use hasher::ContentHasher;
pub use object::ObjectId;

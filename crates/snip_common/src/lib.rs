//! Shared foundational types for the snippet cache workspace.
//!
//! Currently this is the content hash used to derive snippet keys and to
//! checksum persisted artifacts.

#![warn(missing_docs)]

pub mod hash;

pub use hash::{ContentHash, ContentHasher};

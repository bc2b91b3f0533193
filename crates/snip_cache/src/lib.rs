//! Persistent snippet cache.
//!
//! Snippets extracted from documentation builds are stored in a
//! content-addressed, write-back key-value store indexed by project and
//! document. Values are loaded lazily from per-key artifacts; every dump
//! rewrites a plain-text summary table and one preview file per snippet.
//!
//! A cache directory belongs to one process at a time. Nothing here locks it;
//! callers that share a directory must serialize access themselves.

#![warn(missing_docs)]

pub mod artifact;
pub mod cache;
pub mod error;
pub mod item;
pub mod session;
pub mod snippet;
pub mod store;
pub mod summary;
pub mod titlepath;
pub mod tree;

pub use cache::SnippetCache;
pub use error::CacheError;
pub use item::{Item, KEY_LEN};
pub use session::BuildSession;
pub use snippet::{Code, Headline, Origin, Snippet, SnippetKind};
pub use store::{MappingStore, Slot, StoreEntry, StoreStat, WriteBackHooks};
pub use summary::IndexLayout;
pub use tree::TreeIndex;

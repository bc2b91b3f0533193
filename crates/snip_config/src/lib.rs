//! Parsing and validation of `snip.toml` configuration files.
//!
//! This crate reads the configuration file and produces a strongly-typed
//! [`SnipConfig`] describing where the cache lives, which documents a build
//! keeps snippets for, and how the summary index is laid out.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use types::*;

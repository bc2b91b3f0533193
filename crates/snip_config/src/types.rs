//! Configuration types deserialized from `snip.toml`.

use std::path::PathBuf;

use regex::Regex;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use snip_cache::IndexLayout;

use crate::error::ConfigError;

/// Cache directory used when the configuration does not name one.
pub const DEFAULT_CACHE_DIR: &str = ".snip-cache";

/// The top-level configuration parsed from `snip.toml`.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SnipConfig {
    /// Where the cache lives.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Settings used when feeding the cache from a build.
    #[serde(default)]
    pub build: BuildConfig,
    /// Layout of the `index.txt` summary table.
    #[serde(default)]
    pub index: IndexConfig,
}

/// Location of the cache directory.
#[derive(Debug, Deserialize, Serialize)]
pub struct CacheConfig {
    /// The cache directory.
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIR)
}

/// Build-side settings.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BuildConfig {
    /// Project name recorded on every snippet. Empty means unnamed.
    #[serde(default)]
    pub project: String,
    /// Regular expressions selecting the documents to keep snippets for.
    ///
    /// Accepts either a single string or a list of strings. An empty list
    /// keeps every document.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub patterns: Vec<String>,
}

/// Deserializes a field that can be either a single string or a list of strings.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// Summary table layout.
#[derive(Debug, Deserialize, Serialize)]
pub struct IndexConfig {
    /// Maximum characters of the title path column.
    #[serde(default = "default_title_width")]
    pub title_width: usize,
    /// Trailing characters of a title path kept when it is truncated.
    #[serde(default = "default_title_tail")]
    pub title_tail: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            title_width: default_title_width(),
            title_tail: default_title_tail(),
        }
    }
}

fn default_title_width() -> usize {
    IndexLayout::default().title_width
}

fn default_title_tail() -> usize {
    IndexLayout::default().title_tail
}

impl SnipConfig {
    /// Compiles the build patterns.
    pub fn compiled_patterns(&self) -> Result<Vec<Regex>, ConfigError> {
        self.build
            .patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    ConfigError::ValidationError(format!("invalid pattern '{p}': {e}"))
                })
            })
            .collect()
    }

    /// Renders the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::RenderError(e.to_string()))
    }

    /// The summary table layout.
    pub fn layout(&self) -> IndexLayout {
        IndexLayout {
            title_width: self.index.title_width,
            title_tail: self.index.title_tail,
        }
    }
}

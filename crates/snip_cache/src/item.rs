//! Records stored in the snippet cache.

use serde::{Deserialize, Serialize};
use snip_common::{ContentHash, ContentHasher};

use crate::snippet::Snippet;
use crate::store::StoreEntry;

/// Number of hex characters kept from the content hash to form a key.
pub const KEY_LEN: usize = 7;

/// A snippet plus the metadata needed to find it again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Name of the documentation project (may be empty).
    pub project: String,
    /// Name of the document the snippet was extracted from.
    pub docname: String,
    /// Titles of the enclosing sections, root first.
    pub titlepath: Vec<String>,
    /// The snippet itself.
    pub snippet: Snippet,
    /// Keywords with their scores.
    pub keywords: Vec<(String, f64)>,
}

impl Item {
    /// Creates an item.
    pub fn new(
        project: impl Into<String>,
        docname: impl Into<String>,
        titlepath: Vec<String>,
        snippet: impl Into<Snippet>,
        keywords: Vec<(String, f64)>,
    ) -> Self {
        Self {
            project: project.into(),
            docname: docname.into(),
            titlepath,
            snippet: snippet.into(),
            keywords,
        }
    }

    /// Hash over the identifying content of the item.
    ///
    /// Covers, in order: the project (only when non-empty), the docname, each
    /// title, each rendered snippet line and each keyword. Keyword scores are
    /// not part of the identity.
    pub fn content_hash(&self) -> ContentHash {
        let mut hasher = ContentHasher::new();
        if !self.project.is_empty() {
            hasher.update(self.project.as_bytes());
        }
        hasher.update(self.docname.as_bytes());
        for title in &self.titlepath {
            hasher.update(title.as_bytes());
        }
        for line in self.snippet.lines() {
            hasher.update(line.as_bytes());
        }
        for (keyword, _) in &self.keywords {
            hasher.update(keyword.as_bytes());
        }
        hasher.finish()
    }

    /// The cache key: the first [`KEY_LEN`] hex characters of [`Item::content_hash`].
    pub fn key(&self) -> String {
        self.content_hash().short_hex(KEY_LEN)
    }

    /// Keyword terms without their scores.
    pub fn keyword_terms(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(|(keyword, _)| keyword.as_str())
    }
}

impl StoreEntry for Item {
    fn project(&self) -> &str {
        &self.project
    }

    fn docname(&self) -> &str {
        &self.docname
    }
}

//! Build-time driver for the snippet cache.
//!
//! A `BuildSession` is created when a documentation build starts, is told
//! about removed and freshly resolved documents while the build runs, and
//! dumps the cache when the build finishes.

use std::path::Path;

use regex::Regex;
use tracing::{info, warn};

use crate::cache::SnippetCache;
use crate::error::CacheError;
use crate::item::Item;
use crate::summary::IndexLayout;

/// One build's exclusive handle on a snippet cache.
#[derive(Debug)]
pub struct BuildSession {
    cache: SnippetCache,
    project: String,
    patterns: Vec<Regex>,
}

impl BuildSession {
    /// Opens the cache at `root` for a build of `project`.
    ///
    /// A cache that cannot be loaded is logged and replaced by an empty one,
    /// so a damaged cache directory never fails the build. Documents are
    /// only kept if they match one of `patterns` (all documents when empty).
    pub fn start(root: &Path, project: &str, patterns: Vec<Regex>) -> Self {
        let cache = match SnippetCache::open(root) {
            Ok(cache) => cache,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "failed to load snippet cache, starting empty");
                SnippetCache::new(root)
            }
        };
        Self {
            cache,
            project: project.to_string(),
            patterns,
        }
    }

    /// Sets the bounds used for the title path column of `index.txt`.
    pub fn with_layout(mut self, layout: IndexLayout) -> Self {
        self.cache = self.cache.with_layout(layout);
        self
    }

    /// The project being built.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// The cache owned by this session.
    pub fn cache(&self) -> &SnippetCache {
        &self.cache
    }

    /// Mutable access to the cache owned by this session.
    pub fn cache_mut(&mut self) -> &mut SnippetCache {
        &mut self.cache
    }

    /// Returns `true` if snippets of `docname` should be kept.
    ///
    /// Patterns must match at the start of the docname.
    pub fn matches(&self, docname: &str) -> bool {
        self.patterns.is_empty()
            || self
                .patterns
                .iter()
                .any(|p| p.find(docname).is_some_and(|m| m.start() == 0))
    }

    /// Purges the snippets of documents removed from the source tree.
    pub fn documents_removed<I, S>(&mut self, docnames: I) -> Result<usize, CacheError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut purged = 0;
        for docname in docnames {
            purged += self.cache.purge_doc(&self.project, docname.as_ref())?;
        }
        Ok(purged)
    }

    /// Replaces the snippets of `docname` with `items`.
    ///
    /// Documents excluded by the patterns lose all their snippets. Returns the
    /// keys of the added items.
    pub fn document_resolved<I>(&mut self, docname: &str, items: I) -> Result<Vec<String>, CacheError>
    where
        I: IntoIterator<Item = Item>,
    {
        self.cache.purge_doc(&self.project, docname)?;
        if !self.matches(docname) {
            return Ok(Vec::new());
        }
        let keys = items.into_iter().map(|item| self.cache.add(item)).collect();
        Ok(keys)
    }

    /// Dumps the cache; ends the session.
    pub fn finish(mut self) -> Result<SnippetCache, CacheError> {
        self.cache.dump()?;
        info!(
            project = self.project.as_str(),
            snippets = self.cache.len(),
            "snippet cache updated"
        );
        Ok(self.cache)
    }
}

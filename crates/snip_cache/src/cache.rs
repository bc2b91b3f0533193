//! Snippet cache built on the mapping store.
//!
//! `SnippetCache` derives content-addressed keys for items, keeps one
//! `<key>.preview` text file per item in step with its `<key>.item` artifact,
//! and rewrites the `index.txt` summary table on every dump.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::artifact::remove_if_present;
use crate::error::CacheError;
use crate::item::Item;
use crate::store::{MappingStore, Slot, StoreStat, WriteBackHooks};
use crate::summary::{self, IndexLayout, SummaryRow};

/// Name of the summary table within the cache directory.
pub const INDEX_FILE: &str = "index.txt";

/// File extension of per-item preview files.
pub const PREVIEW_EXT: &str = "preview";

fn preview_path(root: &Path, key: &str) -> PathBuf {
    root.join(format!("{key}.{PREVIEW_EXT}"))
}

/// Keeps preview files in step with item artifacts.
struct PreviewHooks {
    root: PathBuf,
}

impl WriteBackHooks<Item> for PreviewHooks {
    fn post_write(&mut self, key: &str, item: &Item) -> Result<(), CacheError> {
        let path = preview_path(&self.root, key);
        std::fs::write(&path, item.snippet.lines().join("\n")).map_err(|e| CacheError::io(&path, e))
    }

    fn post_purge(&mut self, key: &str, _item: Option<&Item>) -> Result<(), CacheError> {
        remove_if_present(&preview_path(&self.root, key)).map(|_| ())
    }
}

/// Persistent, content-addressed cache of snippet items.
///
/// Like the underlying [`MappingStore`], a cache directory must only be used
/// by one process at a time.
#[derive(Debug)]
pub struct SnippetCache {
    store: MappingStore<Item>,
    layout: IndexLayout,
}

impl SnippetCache {
    /// Creates an empty cache rooted at `root`.
    pub fn new(root: &Path) -> Self {
        Self {
            store: MappingStore::new(root),
            layout: IndexLayout::default(),
        }
    }

    /// Opens the cache at `root`, starting empty if it was never dumped.
    pub fn open(root: &Path) -> Result<Self, CacheError> {
        Ok(Self {
            store: MappingStore::open(root)?,
            layout: IndexLayout::default(),
        })
    }

    /// Sets the bounds used for the title path column of `index.txt`.
    pub fn with_layout(mut self, layout: IndexLayout) -> Self {
        self.layout = layout;
        self
    }

    /// The cache directory.
    pub fn root(&self) -> &Path {
        self.store.root()
    }

    /// Path of the summary table.
    pub fn index_file(&self) -> PathBuf {
        self.root().join(INDEX_FILE)
    }

    /// Path of the preview file for `key`.
    pub fn preview_file(&self, key: &str) -> PathBuf {
        preview_path(self.root(), key)
    }

    /// The underlying store.
    pub fn store(&self) -> &MappingStore<Item> {
        &self.store
    }

    /// Adds `item` and returns its key.
    ///
    /// Keys are truncated hashes, so two different items can map to the same
    /// key. When that is detectable without touching the disk a warning is
    /// logged; either way the newer item replaces the older one.
    pub fn add(&mut self, item: Item) -> String {
        let key = item.key();
        if self.collides(&key, &item) {
            warn!(
                key = key.as_str(),
                project = item.project.as_str(),
                docname = item.docname.as_str(),
                "snippet key collision, replacing existing item"
            );
        }
        debug!(key = key.as_str(), docname = item.docname.as_str(), "adding snippet");
        self.store.set(&key, item);
        key
    }

    fn collides(&self, key: &str, item: &Item) -> bool {
        match self.store.peek(key) {
            None => false,
            Some(Slot::Loaded(existing)) => existing.content_hash() != item.content_hash(),
            Some(Slot::NotLoaded) => self
                .store
                .tree()
                .locate(key)
                .is_some_and(|(project, docname)| {
                    project != item.project || docname != item.docname
                }),
        }
    }

    /// Removes every item of `(project, docname)`; returns how many were removed.
    ///
    /// A document with no items is not an error.
    pub fn purge_doc(&mut self, project: &str, docname: &str) -> Result<usize, CacheError> {
        let keys = match self.store.keys_by_document(project, docname) {
            Ok(keys) => keys,
            Err(e) if e.is_not_found() => return Ok(0),
            Err(e) => return Err(e),
        };
        for key in &keys {
            self.store.delete(key)?;
        }
        debug!(project, docname, purged = keys.len(), "purged document");
        Ok(keys.len())
    }

    /// Removes every item.
    pub fn clear(&mut self) -> Result<(), CacheError> {
        let keys: Vec<String> = self.store.keys().map(str::to_string).collect();
        for key in &keys {
            self.store.delete(key)?;
        }
        Ok(())
    }

    /// Returns the item stored under `key`.
    pub fn get(&mut self, key: &str) -> Result<Option<&Item>, CacheError> {
        self.store.get(key)
    }

    /// Returns every item with its key, in key order.
    pub fn list(&mut self) -> Result<Vec<(String, Item)>, CacheError> {
        let keys: Vec<String> = self.store.keys().map(str::to_string).collect();
        let mut items = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(item) = self.store.get(&key)? {
                let item = item.clone();
                items.push((key, item));
            }
        }
        Ok(items)
    }

    /// Returns `true` if `key` is stored.
    pub fn contains(&self, key: &str) -> bool {
        self.store.contains(key)
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if the cache holds no items.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Item counts per project and document.
    pub fn stat(&self) -> StoreStat {
        self.store.stat()
    }

    /// Keys of every document in `project`.
    pub fn keys_by_project(&self, project: &str) -> Result<BTreeSet<String>, CacheError> {
        self.store.keys_by_project(project)
    }

    /// Keys of `(project, docname)`.
    pub fn keys_by_document(
        &self,
        project: &str,
        docname: &str,
    ) -> Result<BTreeSet<String>, CacheError> {
        self.store.keys_by_document(project, docname)
    }

    /// Replaces the in-memory state with what was last dumped.
    pub fn load(&mut self) -> Result<(), CacheError> {
        self.store.load()
    }

    /// Renders the summary table for every stored item.
    ///
    /// Reads every item that is not loaded yet.
    pub fn render_index(&mut self) -> Result<String, CacheError> {
        let keys: Vec<String> = self.store.keys().map(str::to_string).collect();
        let mut rows = Vec::with_capacity(keys.len());
        for key in &keys {
            if let Some(item) = self.store.get(key)? {
                rows.push(SummaryRow::new(key, item, self.layout));
            }
        }
        Ok(summary::render(&rows))
    }

    /// Rewrites `index.txt`, then flushes items and previews to disk.
    pub fn dump(&mut self) -> Result<(), CacheError> {
        let root = self.root().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|e| CacheError::io(&root, e))?;

        let table = self.render_index()?;
        let index = self.index_file();
        std::fs::write(&index, table).map_err(|e| CacheError::io(&index, e))?;

        let mut hooks = PreviewHooks { root };
        self.store.dump_with(&mut hooks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snippet::{Code, Origin};

    fn item(docname: &str, body: &str) -> Item {
        let code = Code::extract(
            &[format!("Run {body}.")],
            "sh",
            Origin::new(format!("{docname}.rst"), 1, None),
            body,
        );
        Item::new(
            "notes",
            docname,
            vec![docname.to_string()],
            code,
            vec![(body.to_string(), 1.0)],
        )
    }

    fn make_cache() -> (tempfile::TempDir, SnippetCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnippetCache::new(dir.path());
        (dir, cache)
    }

    #[test]
    fn add_returns_short_key() {
        let (_dir, mut cache) = make_cache();
        let key = cache.add(item("shell", "ls"));
        assert_eq!(key.len(), crate::item::KEY_LEN);
        assert!(cache.contains(&key));
        assert_eq!(cache.get(&key).unwrap().unwrap().docname, "shell");
    }

    #[test]
    fn paths_are_derived_from_root() {
        let (dir, cache) = make_cache();
        assert_eq!(cache.preview_file("abc1234"), dir.path().join("abc1234.preview"));
        assert_eq!(cache.index_file(), dir.path().join("index.txt"));
    }

    #[test]
    fn dump_writes_previews_and_index() {
        let (dir, mut cache) = make_cache();
        let key = cache.add(item("shell", "ls -la"));
        cache.dump().unwrap();

        let preview = std::fs::read_to_string(dir.path().join(format!("{key}.preview"))).unwrap();
        assert_eq!(preview, "ls -la");
        let index = std::fs::read_to_string(dir.path().join(INDEX_FILE)).unwrap();
        assert!(index.starts_with("ID"));
        assert!(index.contains(&key));
        assert!(index.contains("/sh/ Run ls -la."));
    }

    #[test]
    fn purge_doc_removes_previews() {
        let (dir, mut cache) = make_cache();
        let a = cache.add(item("shell", "ls"));
        let b = cache.add(item("shell", "pwd"));
        let c = cache.add(item("git", "git status"));
        cache.dump().unwrap();

        assert_eq!(cache.purge_doc("notes", "shell").unwrap(), 2);
        cache.dump().unwrap();

        assert!(!dir.path().join(format!("{a}.preview")).exists());
        assert!(!dir.path().join(format!("{b}.item")).exists());
        assert!(dir.path().join(format!("{c}.preview")).exists());
        let index = std::fs::read_to_string(cache.index_file()).unwrap();
        assert!(!index.contains(&a));
        assert!(index.contains(&c));
    }

    #[test]
    fn purge_unknown_doc_is_noop() {
        let (_dir, mut cache) = make_cache();
        assert_eq!(cache.purge_doc("notes", "missing").unwrap(), 0);
        cache.add(item("shell", "ls"));
        assert_eq!(cache.purge_doc("other", "shell").unwrap(), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn re_adding_same_item_is_idempotent() {
        let (_dir, mut cache) = make_cache();
        let first = cache.add(item("shell", "ls"));
        let second = cache.add(item("shell", "ls"));
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn list_loads_everything() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut cache = SnippetCache::new(dir.path());
            cache.add(item("shell", "ls"));
            cache.add(item("git", "git log"));
            cache.dump().unwrap();
        }
        let mut cache = SnippetCache::open(dir.path()).unwrap();
        let items = cache.list().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn clear_then_dump_empties_directory() {
        let (dir, mut cache) = make_cache();
        let key = cache.add(item("shell", "ls"));
        cache.dump().unwrap();
        cache.clear().unwrap();
        cache.dump().unwrap();

        assert!(cache.is_empty());
        assert!(!dir.path().join(format!("{key}.item")).exists());
        assert!(!dir.path().join(format!("{key}.preview")).exists());
        let index = std::fs::read_to_string(cache.index_file()).unwrap();
        assert_eq!(index.lines().count(), 1);
    }

    #[test]
    fn layout_bounds_title_column() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = SnippetCache::new(dir.path()).with_layout(IndexLayout {
            title_width: 12,
            title_tail: 4,
        });
        let mut it = item("shell", "ls");
        it.titlepath = vec!["A rather long chapter".to_string(), "Leaf".to_string()];
        cache.add(it);
        let table = cache.render_index().unwrap();
        assert!(table.contains("A rat...Leaf"));
    }
}

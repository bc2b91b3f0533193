//! Disk-backed key-value store with write-back buffering and lazy loading.
//!
//! The store keeps every known key in memory, but values are only read from
//! their `<key>.item` artifact on first access after a [`MappingStore::load`].
//! Changes are buffered in a dirty set (writes) and an orphan set (deletes)
//! until [`MappingStore::dump`] flushes them and rewrites `cache.meta`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::artifact::{write_atomic, ArtifactStore};
use crate::error::CacheError;
use crate::tree::TreeIndex;

/// Name of the metadata file within the store root.
pub const META_FILE: &str = "cache.meta";

/// File extension of per-key item artifacts.
pub const ITEM_EXT: &str = "item";

/// Current metadata format version.
const META_FORMAT_VERSION: u32 = 1;

/// A value that can live in a [`MappingStore`].
pub trait StoreEntry: Serialize + DeserializeOwned {
    /// The project the value belongs to (may be empty).
    fn project(&self) -> &str;

    /// The document the value was extracted from.
    fn docname(&self) -> &str;
}

/// In-memory state of a known key.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<V> {
    /// The value is in memory.
    Loaded(V),
    /// The value exists on disk but has not been read this session.
    NotLoaded,
}

impl<V> Slot<V> {
    /// Returns the value if it is in memory.
    pub fn loaded(&self) -> Option<&V> {
        match self {
            Slot::Loaded(value) => Some(value),
            Slot::NotLoaded => None,
        }
    }
}

/// Side effects run by [`MappingStore::dump_with`] as artifacts change on disk.
pub trait WriteBackHooks<V> {
    /// Called after the item artifact for `key` has been written.
    fn post_write(&mut self, _key: &str, _value: &V) -> Result<(), CacheError> {
        Ok(())
    }

    /// Called after the item artifact for `key` has been removed.
    ///
    /// `value` is `None` when the key was deleted without ever being loaded.
    fn post_purge(&mut self, _key: &str, _value: Option<&V>) -> Result<(), CacheError> {
        Ok(())
    }
}

/// Hooks that do nothing.
pub struct NoHooks;

impl<V> WriteBackHooks<V> for NoHooks {}

/// Contents of `cache.meta`.
#[derive(Debug, Serialize, Deserialize)]
struct StoreMeta {
    format_version: u32,
    keys: BTreeSet<String>,
    tree: TreeIndex,
}

/// Snippet counts per project and document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStat {
    /// project → docname → number of keys.
    pub projects: BTreeMap<String, BTreeMap<String, usize>>,
}

impl StoreStat {
    /// Number of projects with at least one key.
    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    /// Number of documents across all projects.
    pub fn document_count(&self) -> usize {
        self.projects.values().map(BTreeMap::len).sum()
    }

    /// Number of keys across all projects.
    pub fn snippet_count(&self) -> usize {
        self.projects.values().flat_map(BTreeMap::values).sum()
    }
}

/// Persistent mapping from key to `V`, indexed by project and document.
///
/// The store is owned by a single session. It does no locking of its own and
/// two processes must never open the same root directory at the same time;
/// callers that need shared access have to serialize it externally.
#[derive(Debug)]
pub struct MappingStore<V> {
    artifacts: ArtifactStore,
    slots: BTreeMap<String, Slot<V>>,
    tree: TreeIndex,
    dirty: BTreeSet<String>,
    orphans: BTreeMap<String, Slot<V>>,
}

impl<V: StoreEntry> MappingStore<V> {
    /// Creates an empty store rooted at `root`. Nothing is read or written.
    pub fn new(root: &Path) -> Self {
        Self {
            artifacts: ArtifactStore::new(root),
            slots: BTreeMap::new(),
            tree: TreeIndex::new(),
            dirty: BTreeSet::new(),
            orphans: BTreeMap::new(),
        }
    }

    /// Loads the store at `root`, or starts empty if it was never dumped.
    ///
    /// Unreadable or corrupt metadata is still an error.
    pub fn open(root: &Path) -> Result<Self, CacheError> {
        let mut store = Self::new(root);
        if store.meta_file().exists() {
            store.load()?;
        } else {
            debug!(root = %root.display(), "no store metadata, starting empty");
        }
        Ok(store)
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        self.artifacts.root()
    }

    /// Path of the metadata artifact.
    pub fn meta_file(&self) -> PathBuf {
        self.root().join(META_FILE)
    }

    /// Path of the item artifact for `key`.
    pub fn item_file(&self, key: &str) -> PathBuf {
        self.artifacts.artifact_path(key, ITEM_EXT)
    }

    /// Returns the value for `key`, reading it from disk if not yet loaded.
    pub fn get(&mut self, key: &str) -> Result<Option<&V>, CacheError> {
        let unloaded = match self.slots.get(key) {
            None => return Ok(None),
            Some(slot) => slot.loaded().is_none(),
        };
        if unloaded {
            let value: V = self.artifacts.read_value(key, ITEM_EXT)?;
            debug!(key, "loaded item from disk");
            self.slots.insert(key.to_string(), Slot::Loaded(value));
        }
        Ok(self.slots.get(key).and_then(Slot::loaded))
    }

    /// Returns the in-memory slot for `key` without touching the disk.
    pub fn peek(&self, key: &str) -> Option<&Slot<V>> {
        self.slots.get(key)
    }

    /// Inserts or replaces the value for `key` and marks it dirty.
    pub fn set(&mut self, key: &str, value: V) {
        self.tree.insert(value.project(), value.docname(), key);
        self.orphans.remove(key);
        self.dirty.insert(key.to_string());
        self.slots.insert(key.to_string(), Slot::Loaded(value));
    }

    /// Removes `key` and schedules its artifact for deletion.
    pub fn delete(&mut self, key: &str) -> Result<(), CacheError> {
        let slot = self
            .slots
            .remove(key)
            .ok_or_else(|| CacheError::KeyNotFound(key.to_string()))?;
        self.dirty.remove(key);
        self.tree.remove(key);
        self.orphans.insert(key.to_string(), slot);
        Ok(())
    }

    /// Returns `true` if `key` is present (loaded or not).
    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    /// Number of keys in the store.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterates over all keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Returns `true` if `key` has changes waiting to be written.
    pub fn is_dirty(&self, key: &str) -> bool {
        self.dirty.contains(key)
    }

    /// Returns `true` if `key` is waiting to be removed from disk.
    pub fn is_orphan(&self, key: &str) -> bool {
        self.orphans.contains_key(key)
    }

    /// The project/document index.
    pub fn tree(&self) -> &TreeIndex {
        &self.tree
    }

    /// Names of every project with at least one key, sorted.
    pub fn projects(&self) -> impl Iterator<Item = &str> {
        self.tree.buckets().keys().map(String::as_str)
    }

    /// Keys of every document in `project`.
    pub fn keys_by_project(&self, project: &str) -> Result<BTreeSet<String>, CacheError> {
        self.tree.keys_by_project(project)
    }

    /// Keys filed under `(project, docname)`.
    pub fn keys_by_document(
        &self,
        project: &str,
        docname: &str,
    ) -> Result<BTreeSet<String>, CacheError> {
        self.tree.keys_by_document(project, docname)
    }

    /// Per-project, per-document key counts.
    pub fn stat(&self) -> StoreStat {
        let projects = self
            .tree
            .buckets()
            .iter()
            .map(|(project, documents)| {
                let counts = documents
                    .iter()
                    .map(|(docname, keys)| (docname.clone(), keys.len()))
                    .collect();
                (project.clone(), counts)
            })
            .collect();
        StoreStat { projects }
    }

    /// Replaces all in-memory state with the contents of `cache.meta`.
    ///
    /// Every value starts out unloaded.
    pub fn load(&mut self) -> Result<(), CacheError> {
        let path = self.meta_file();
        let content = std::fs::read_to_string(&path).map_err(|e| CacheError::io(&path, e))?;
        let meta: StoreMeta =
            serde_json::from_str(&content).map_err(|e| CacheError::Deserialization {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        if meta.format_version != META_FORMAT_VERSION {
            return Err(CacheError::VersionMismatch {
                path,
                expected: META_FORMAT_VERSION,
                actual: meta.format_version,
            });
        }
        if !meta.keys.iter().map(String::as_str).eq(meta.tree.keys()) {
            return Err(CacheError::Deserialization {
                path,
                reason: "key set and tree index disagree".to_string(),
            });
        }

        self.slots = meta
            .keys
            .into_iter()
            .map(|key| (key, Slot::NotLoaded))
            .collect();
        self.tree = meta.tree;
        self.dirty.clear();
        self.orphans.clear();
        debug!(root = %self.root().display(), keys = self.slots.len(), "loaded store metadata");
        Ok(())
    }

    /// Flushes pending changes without side-effect hooks.
    pub fn dump(&mut self) -> Result<(), CacheError> {
        self.dump_with(&mut NoHooks)
    }

    /// Flushes pending changes to disk.
    ///
    /// Order matters: orphaned artifacts are removed and dirty ones written
    /// before the metadata snapshot is taken, so `cache.meta` only ever
    /// references keys whose artifacts exist. A key leaves the pending sets
    /// only once its file work and hook have succeeded.
    pub fn dump_with<H: WriteBackHooks<V>>(&mut self, hooks: &mut H) -> Result<(), CacheError> {
        self.artifacts.ensure_root()?;

        let orphans: Vec<String> = self.orphans.keys().cloned().collect();
        for key in &orphans {
            self.artifacts.remove_artifact(key, ITEM_EXT)?;
            let value = self.orphans.get(key).and_then(Slot::loaded);
            hooks.post_purge(key, value)?;
            self.orphans.remove(key);
            debug!(key = key.as_str(), "purged item");
        }

        let dirty: Vec<String> = self.dirty.iter().cloned().collect();
        for key in &dirty {
            if let Some(Slot::Loaded(value)) = self.slots.get(key) {
                self.artifacts.write_value(key, ITEM_EXT, value)?;
                hooks.post_write(key, value)?;
                debug!(key = key.as_str(), "wrote item");
            }
            self.dirty.remove(key);
        }

        for slot in self.slots.values_mut() {
            *slot = Slot::NotLoaded;
        }

        let meta = StoreMeta {
            format_version: META_FORMAT_VERSION,
            keys: self.slots.keys().cloned().collect(),
            tree: self.tree.clone(),
        };
        let json = serde_json::to_vec_pretty(&meta).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        write_atomic(&self.meta_file(), &json)?;

        info!(
            root = %self.root().display(),
            keys = self.slots.len(),
            written = dirty.len(),
            purged = orphans.len(),
            "dumped store"
        );
        Ok(())
    }
}

//! Project → document → keys secondary index.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Keys grouped by document, grouped by project.
pub type Buckets = BTreeMap<String, BTreeMap<String, BTreeSet<String>>>;

/// Secondary index grouping store keys by `(project, docname)`.
///
/// Buckets are never empty: a document bucket disappears with its last key
/// and a project disappears with its last document. A reverse lookup from key
/// to bucket is kept alongside so removals never need the stored value.
/// Only the buckets are serialized; the reverse lookup is rebuilt on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Buckets", into = "Buckets")]
pub struct TreeIndex {
    buckets: Buckets,
    locations: BTreeMap<String, (String, String)>,
}

impl TreeIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Files `key` under `(project, docname)`, moving it out of any other bucket.
    pub fn insert(&mut self, project: &str, docname: &str, key: &str) {
        if let Some((old_project, old_docname)) = self.locations.get(key) {
            if old_project == project && old_docname == docname {
                return;
            }
            self.remove(key);
        }
        self.buckets
            .entry(project.to_string())
            .or_default()
            .entry(docname.to_string())
            .or_default()
            .insert(key.to_string());
        self.locations
            .insert(key.to_string(), (project.to_string(), docname.to_string()));
    }

    /// Removes `key`, pruning emptied buckets upward.
    ///
    /// Returns the bucket the key was filed under, or `None` if unknown.
    pub fn remove(&mut self, key: &str) -> Option<(String, String)> {
        let (project, docname) = self.locations.remove(key)?;
        if let Some(documents) = self.buckets.get_mut(&project) {
            if let Some(keys) = documents.get_mut(&docname) {
                keys.remove(key);
                if keys.is_empty() {
                    documents.remove(&docname);
                }
            }
            if documents.is_empty() {
                self.buckets.remove(&project);
            }
        }
        Some((project, docname))
    }

    /// Returns the bucket `key` is filed under.
    pub fn locate(&self, key: &str) -> Option<(&str, &str)> {
        self.locations
            .get(key)
            .map(|(project, docname)| (project.as_str(), docname.as_str()))
    }

    /// Returns every key of every document in `project`.
    pub fn keys_by_project(&self, project: &str) -> Result<BTreeSet<String>, CacheError> {
        let documents = self
            .buckets
            .get(project)
            .ok_or_else(|| CacheError::ProjectNotFound(project.to_string()))?;
        Ok(documents.values().flatten().cloned().collect())
    }

    /// Returns a copy of the keys filed under `(project, docname)`.
    pub fn keys_by_document(
        &self,
        project: &str,
        docname: &str,
    ) -> Result<BTreeSet<String>, CacheError> {
        self.buckets
            .get(project)
            .and_then(|documents| documents.get(docname))
            .cloned()
            .ok_or_else(|| CacheError::DocumentNotFound {
                project: project.to_string(),
                docname: docname.to_string(),
            })
    }

    /// Returns the raw bucket structure.
    pub fn buckets(&self) -> &Buckets {
        &self.buckets
    }

    /// Number of keys in the index.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Returns `true` if no key is indexed.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Iterates over all indexed keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.locations.keys().map(String::as_str)
    }
}

/// Rejects bucket structures that file one key under two documents.
impl TryFrom<Buckets> for TreeIndex {
    type Error = String;

    fn try_from(mut buckets: Buckets) -> Result<Self, Self::Error> {
        buckets.retain(|_, documents| {
            documents.retain(|_, keys| !keys.is_empty());
            !documents.is_empty()
        });
        let mut locations = BTreeMap::new();
        for (project, documents) in &buckets {
            for (docname, keys) in documents {
                for key in keys {
                    let location = (project.clone(), docname.clone());
                    if let Some((first_project, first_docname)) =
                        locations.insert(key.clone(), location)
                    {
                        return Err(format!(
                            "key '{key}' is filed under both '{first_project}/{first_docname}' and '{project}/{docname}'"
                        ));
                    }
                }
            }
        }
        Ok(Self { buckets, locations })
    }
}

impl From<TreeIndex> for Buckets {
    fn from(index: TreeIndex) -> Self {
        index.buckets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TreeIndex {
        let mut tree = TreeIndex::new();
        tree.insert("notes", "index", "a");
        tree.insert("notes", "index", "b");
        tree.insert("notes", "rust", "c");
        tree.insert("", "scratch", "d");
        tree
    }

    #[test]
    fn insert_creates_buckets() {
        let tree = sample();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.keys_by_document("notes", "index").unwrap().len(), 2);
        assert_eq!(tree.keys_by_project("notes").unwrap().len(), 3);
        assert_eq!(tree.locate("d"), Some(("", "scratch")));
    }

    #[test]
    fn remove_prunes_document_then_project() {
        let mut tree = sample();
        tree.remove("c");
        assert!(matches!(
            tree.keys_by_document("notes", "rust"),
            Err(CacheError::DocumentNotFound { .. })
        ));
        assert!(tree.keys_by_project("notes").is_ok());

        tree.remove("a");
        tree.remove("b");
        assert!(matches!(
            tree.keys_by_project("notes"),
            Err(CacheError::ProjectNotFound(_))
        ));
        assert_eq!(tree.buckets().len(), 1);
    }

    #[test]
    fn remove_unknown_key_is_none() {
        let mut tree = sample();
        assert!(tree.remove("zzz").is_none());
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn reinsert_moves_between_buckets() {
        let mut tree = sample();
        tree.insert("other", "page", "c");
        assert_eq!(tree.locate("c"), Some(("other", "page")));
        assert!(tree.keys_by_document("notes", "rust").is_err());
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn unknown_lookups_error() {
        let tree = sample();
        assert!(tree.keys_by_project("missing").unwrap_err().is_not_found());
        assert!(tree
            .keys_by_document("notes", "missing")
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn serde_roundtrip_rebuilds_locations() {
        let tree = sample();
        let json = serde_json::to_string(&tree).unwrap();
        let back: TreeIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
        assert_eq!(back.locate("a"), Some(("notes", "index")));
    }

    #[test]
    fn from_buckets_drops_empty_entries() {
        let mut buckets = Buckets::new();
        buckets
            .entry("p".to_string())
            .or_default()
            .insert("empty".to_string(), BTreeSet::new());
        let tree = TreeIndex::try_from(buckets).unwrap();
        assert!(tree.is_empty());
        assert!(tree.buckets().is_empty());
    }

    #[test]
    fn key_in_two_documents_is_rejected() {
        let mut buckets = Buckets::new();
        let documents = buckets.entry("p".to_string()).or_default();
        documents.insert("d1".to_string(), BTreeSet::from(["k".to_string()]));
        documents.insert("d2".to_string(), BTreeSet::from(["k".to_string(), "j".to_string()]));
        let err = TreeIndex::try_from(buckets).unwrap_err();
        assert!(err.contains("'k'"));

        let json = r#"{"p":{"d1":["k"]},"q":{"d1":["k"]}}"#;
        assert!(serde_json::from_str::<TreeIndex>(json).is_err());
    }
}

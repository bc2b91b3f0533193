//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur during cache operations.
///
/// Lookups and deletes on unknown keys or buckets are hard errors. Every
/// I/O or decoding failure is propagated to the caller unchanged; the store
/// never retries or swallows them.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The key is not present in the store.
    #[error("no snippet with key '{0}'")]
    KeyNotFound(String),

    /// The project has no documents in the tree index.
    #[error("unknown project '{0}'")]
    ProjectNotFound(String),

    /// The project has no bucket for the given document.
    #[error("unknown document '{docname}' in project '{project}'")]
    DocumentNotFound {
        /// The project that was searched.
        project: String,
        /// The missing document name.
        docname: String,
    },

    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Metadata or an item payload could not be decoded.
    #[error("failed to decode {path}: {reason}")]
    Deserialization {
        /// The file that failed to decode.
        path: PathBuf,
        /// Description of the decode failure.
        reason: String,
    },

    /// An artifact file has an invalid or missing header.
    #[error("invalid artifact header in {path}: {reason}")]
    InvalidHeader {
        /// The artifact file path.
        path: PathBuf,
        /// Description of the header problem.
        reason: String,
    },

    /// The stored checksum does not match the computed checksum of the payload.
    #[error("checksum mismatch in {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The artifact file path.
        path: PathBuf,
        /// The expected checksum from the header.
        expected: String,
        /// The actual checksum computed from the payload.
        actual: String,
    },

    /// The artifact format version does not match the current version.
    #[error("version mismatch in {path}: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The artifact file path.
        path: PathBuf,
        /// The expected format version.
        expected: u32,
        /// The actual format version found in the file.
        actual: u32,
    },

    /// A value could not be encoded for writing.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}

impl CacheError {
    /// Builds an [`CacheError::Io`] for `path`.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for the key/project/document lookup failures.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::KeyNotFound(_) | Self::ProjectNotFound(_) | Self::DocumentNotFound { .. }
        )
    }

    /// Returns `true` if a file on disk was present but unreadable as an artifact.
    pub fn is_deserialization(&self) -> bool {
        matches!(
            self,
            Self::Deserialization { .. }
                | Self::InvalidHeader { .. }
                | Self::ChecksumMismatch { .. }
                | Self::VersionMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let err = CacheError::Io {
            path: PathBuf::from("/tmp/cache/cache.meta"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        };
        let msg = err.to_string();
        assert!(msg.contains("cache I/O error"));
        assert!(msg.contains("cache.meta"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn document_not_found_display() {
        let err = CacheError::DocumentNotFound {
            project: "notes".to_string(),
            docname: "index".to_string(),
        };
        assert_eq!(err.to_string(), "unknown document 'index' in project 'notes'");
        assert!(err.is_not_found());
    }

    #[test]
    fn key_not_found_display() {
        let err = CacheError::KeyNotFound("abc1234".to_string());
        assert!(err.to_string().contains("abc1234"));
        assert!(err.is_not_found());
        assert!(!err.is_deserialization());
    }

    #[test]
    fn checksum_mismatch_is_deserialization() {
        let err = CacheError::ChecksumMismatch {
            path: PathBuf::from("abc1234.item"),
            expected: "aabb".to_string(),
            actual: "ccdd".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("checksum mismatch"));
        assert!(msg.contains("aabb"));
        assert!(err.is_deserialization());
    }

    #[test]
    fn version_mismatch_display() {
        let err = CacheError::VersionMismatch {
            path: PathBuf::from("old.item"),
            expected: 2,
            actual: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("expected 2"));
        assert!(msg.contains("got 1"));
        assert!(err.is_deserialization());
    }

    #[test]
    fn serialization_error_display() {
        let err = CacheError::Serialization {
            reason: "invalid bincode data".to_string(),
        };
        assert!(err.to_string().contains("invalid bincode data"));
        assert!(!err.is_deserialization());
    }
}

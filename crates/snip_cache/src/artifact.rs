//! Per-key binary artifact files.
//!
//! Every stored record is written to `<root>/<key>.<ext>` with a header
//! containing magic bytes, format version, and a checksum of the payload.
//! Unlike a build cache, a damaged artifact here is an error: the key is
//! still referenced by the store metadata, so a silent miss would lose data.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use snip_common::ContentHash;

use crate::error::CacheError;

/// Magic bytes identifying a snippet cache artifact.
const ARTIFACT_MAGIC: [u8; 4] = *b"SNIP";

/// Current artifact format version. Increment on breaking changes to
/// the header or payload format.
const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Header prepended to every artifact for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactHeader {
    /// Magic bytes: must be `b"SNIP"`.
    pub magic: [u8; 4],

    /// Artifact format version.
    pub format_version: u32,

    /// Content hash of the payload data.
    pub checksum: ContentHash,
}

/// Flat directory of per-key artifact files.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Creates a new artifact store rooted at the given directory.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root directory if it does not exist yet.
    pub fn ensure_root(&self) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.root).map_err(|e| CacheError::io(&self.root, e))
    }

    /// Returns the file path for an artifact with the given key.
    pub fn artifact_path(&self, key: &str, ext: &str) -> PathBuf {
        self.root.join(format!("{key}.{ext}"))
    }

    /// Encodes `value` with bincode and writes it as the artifact for `key`.
    pub fn write_value<T: Serialize>(
        &self,
        key: &str,
        ext: &str,
        value: &T,
    ) -> Result<PathBuf, CacheError> {
        let data = bincode::serde::encode_to_vec(value, bincode::config::standard()).map_err(
            |e| CacheError::Serialization {
                reason: e.to_string(),
            },
        )?;
        self.write_artifact(key, ext, &data)
    }

    /// Reads and decodes the artifact for `key`.
    pub fn read_value<T: DeserializeOwned>(&self, key: &str, ext: &str) -> Result<T, CacheError> {
        let path = self.artifact_path(key, ext);
        let payload = self.read_artifact(key, ext)?;
        let (value, _) = bincode::serde::decode_from_slice(&payload, bincode::config::standard())
            .map_err(|e| CacheError::Deserialization {
                path,
                reason: e.to_string(),
            })?;
        Ok(value)
    }

    /// Writes raw payload bytes behind a validated header.
    pub fn write_artifact(&self, key: &str, ext: &str, data: &[u8]) -> Result<PathBuf, CacheError> {
        let path = self.artifact_path(key, ext);

        let header = ArtifactHeader {
            magic: ARTIFACT_MAGIC,
            format_version: ARTIFACT_FORMAT_VERSION,
            checksum: ContentHash::from_bytes(data),
        };

        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        // Write: 4-byte header length (little-endian) + header + payload
        let header_len = header_bytes.len() as u32;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + data.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(data);

        std::fs::write(&path, &output).map_err(|e| CacheError::io(&path, e))?;
        Ok(path)
    }

    /// Reads an artifact, validating its header, and returns the payload.
    pub fn read_artifact(&self, key: &str, ext: &str) -> Result<Vec<u8>, CacheError> {
        let path = self.artifact_path(key, ext);
        let raw = std::fs::read(&path).map_err(|e| CacheError::io(&path, e))?;

        if raw.len() < 4 {
            return Err(CacheError::InvalidHeader {
                path,
                reason: "file too short for header length".to_string(),
            });
        }

        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&raw[..4]);
        let header_len = u32::from_le_bytes(len_bytes) as usize;
        if raw.len() < 4 + header_len {
            return Err(CacheError::InvalidHeader {
                path,
                reason: format!("truncated header ({header_len} bytes declared)"),
            });
        }

        let header: ArtifactHeader = match bincode::serde::decode_from_slice(
            &raw[4..4 + header_len],
            bincode::config::standard(),
        ) {
            Ok((header, _)) => header,
            Err(e) => {
                return Err(CacheError::InvalidHeader {
                    path,
                    reason: e.to_string(),
                })
            }
        };

        if header.magic != ARTIFACT_MAGIC {
            return Err(CacheError::InvalidHeader {
                path,
                reason: "missing magic bytes".to_string(),
            });
        }

        if header.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(CacheError::VersionMismatch {
                path,
                expected: ARTIFACT_FORMAT_VERSION,
                actual: header.format_version,
            });
        }

        let payload = &raw[4 + header_len..];

        let actual_checksum = ContentHash::from_bytes(payload);
        if actual_checksum != header.checksum {
            return Err(CacheError::ChecksumMismatch {
                path,
                expected: header.checksum.to_string(),
                actual: actual_checksum.to_string(),
            });
        }

        Ok(payload.to_vec())
    }

    /// Removes the artifact for `key` if it exists.
    ///
    /// Returns whether a file was removed.
    pub fn remove_artifact(&self, key: &str, ext: &str) -> Result<bool, CacheError> {
        remove_if_present(&self.artifact_path(key, ext))
    }
}

/// Removes `path`, treating an already-missing file as success.
pub(crate) fn remove_if_present(path: &Path) -> Result<bool, CacheError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CacheError::io(path, e)),
    }
}

/// Replaces `dest` with `data` through a temporary file in the same directory.
///
/// A crash leaves either the old file or the new one, never a truncated mix.
pub(crate) fn write_atomic(dest: &Path, data: &[u8]) -> Result<(), CacheError> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| CacheError::io(dir, e))?;
    tmp.write_all(data)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| CacheError::io(tmp.path(), e))?;
    tmp.persist(dest).map_err(|e| CacheError::io(dest, e.error))?;
    Ok(())
}

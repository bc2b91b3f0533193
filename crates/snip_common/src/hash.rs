//! Content hashing for snippet identity and artifact integrity checks.

use serde::{Deserialize, Serialize};
use std::fmt;

use xxhash_rust::xxh3::Xxh3;

/// A 128-bit content hash computed using XXH3.
///
/// Two records with the same `ContentHash` are assumed to have identical
/// identifying content. The lowercase hex rendering (see [`fmt::Display`]) is
/// the source of the short keys handed out by the snippet cache.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes a content hash from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }

    /// Returns the first `len` lowercase hex characters of the hash.
    ///
    /// `len` is clamped to the full 32-character rendering.
    pub fn short_hex(&self, len: usize) -> String {
        let mut hex = self.to_string();
        hex.truncate(len);
        hex
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Incremental XXH3-128 hasher.
///
/// Feeding several segments produces the same hash as [`ContentHash::from_bytes`]
/// over their concatenation.
pub struct ContentHasher(Xxh3);

impl ContentHasher {
    /// Creates an empty hasher.
    pub fn new() -> Self {
        Self(Xxh3::new())
    }

    /// Appends `data` to the hashed stream.
    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    /// Returns the hash of everything fed so far.
    pub fn finish(&self) -> ContentHash {
        ContentHash(self.0.digest128().to_le_bytes())
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_prefix_is_lowercase_hex() {
        let h = ContentHash::from_bytes(b"notesindexIntrohello");
        let key = h.short_hex(7);
        assert_eq!(key.len(), 7);
        assert!(key.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        assert!(h.to_string().starts_with(&key));
        assert_eq!(h.short_hex(100), h.to_string());
        assert_eq!(h.to_string().len(), 32);
    }

    #[test]
    fn checksum_catches_one_flipped_byte() {
        let payload = b"cargo build --release".to_vec();
        let mut damaged = payload.clone();
        damaged[3] ^= 0x01;
        assert_ne!(ContentHash::from_bytes(&payload), ContentHash::from_bytes(&damaged));
        assert_eq!(ContentHash::from_bytes(&payload), ContentHash::from_bytes(b"cargo build --release"));
    }

    #[test]
    fn streaming_matches_one_shot() {
        let mut hasher = ContentHasher::new();
        hasher.update(b"notes");
        hasher.update(b"index");
        hasher.update(b"Intro");
        assert_eq!(hasher.finish(), ContentHash::from_bytes(b"notesindexIntro"));
    }

    #[test]
    fn segment_boundaries_are_not_hashed() {
        let mut split_early = ContentHasher::default();
        split_early.update(b"guide");
        split_early.update(b"install");
        let mut split_late = ContentHasher::default();
        split_late.update(b"guidein");
        split_late.update(b"stall");
        assert_eq!(split_early.finish(), split_late.finish());
    }

    #[test]
    fn finish_can_be_called_mid_stream() {
        let mut hasher = ContentHasher::new();
        hasher.update(b"Intro");
        let partial = hasher.finish();
        assert_eq!(hasher.finish(), partial);
        hasher.update(b"hello");
        assert_ne!(hasher.finish(), partial);
    }

    #[test]
    fn debug_shows_leading_bytes() {
        let h = ContentHash::from_bytes(b"snippet");
        assert_eq!(format!("{h:?}"), format!("ContentHash({}..)", h.short_hex(4)));
    }

    #[test]
    fn checksum_survives_header_encoding() {
        #[derive(Serialize, Deserialize)]
        struct Header {
            checksum: ContentHash,
        }
        let header = Header {
            checksum: ContentHash::from_bytes(b"payload"),
        };
        let json = serde_json::to_string(&header).unwrap();
        let back: Header = serde_json::from_str(&json).unwrap();
        assert_eq!(back.checksum, header.checksum);
    }
}
